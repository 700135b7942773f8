//! Translation orchestrator — debounce, issue, validate, apply.
//!
//! [`TranslationOrchestrator`] turns the stream of [`EditState`]s coming
//! from the UI into as few translation calls as possible and publishes the
//! latest settled result through a `tokio::sync::watch` channel.
//!
//! # Request flow
//!
//! ```text
//! submit(edit)
//!   ├─ blank  → cancel timer, invalidate in-flight, clear view     [Idle]
//!   └─ text   → store edit, (re)arm timer                          [Pending]
//!
//! timer fires (quiet period elapsed)
//!   └─▶ take latest edit, tracker.issue()                          [InFlight]
//!         └─▶ translator.translate → validate
//!               └─ tracker.settle(id)
//!                    ├─ Apply   ├─ Ok  → show result, append history [Settled]
//!                    │          └─ Err → notice, keep prior result   [Settled]
//!                    └─ Discard → nothing                            [Discarded]
//! ```
//!
//! Timers are cancelled outright.  Calls already handed to the translator
//! are never aborted; the tracker makes their replies harmless.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::history::{HistoryStore, NewHistoryEntry};
use crate::translate::{
    validate, EditState, TranslateError, TranslationRequest, TranslationResult, Translator,
};

use super::state::{RequestPhase, RequestTracker, Settlement, TranslationView};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Mutable orchestrator state.  Guarded by a std mutex that is never held
/// across an `.await`.  View updates are published while it is held, so a
/// tracker decision and the display change it causes are one step.
struct Core {
    tracker: RequestTracker,
    /// Latest edit waiting for the timer.
    pending: Option<EditState>,
    /// Token of the armed timer; a firing timer with any other token is stale.
    armed: Option<u64>,
    next_token: u64,
    timer: Option<JoinHandle<()>>,
    quiet_period: Duration,
    history: Arc<dyn HistoryStore>,
}

impl Core {
    fn cancel_timer(&mut self) {
        self.pending = None;
        self.armed = None;
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

struct Inner {
    translator: Arc<dyn Translator>,
    core: Mutex<Core>,
    view: watch::Sender<TranslationView>,
}

impl Inner {
    fn core(&self) -> MutexGuard<'_, Core> {
        // Core holds no invariant a panicking writer could break halfway.
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// TranslationOrchestrator
// ---------------------------------------------------------------------------

/// Debounced, race-safe translation requests for one edit session.
///
/// Cheap to clone; clones share the same session.  Must be used from within
/// a tokio runtime.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use live_translate::config::AppConfig;
/// use live_translate::history::LocalHistoryStore;
/// use live_translate::orchestrator::TranslationOrchestrator;
/// use live_translate::storage::MemoryKeyValueStore;
/// use live_translate::translate::{ApiTranslator, EditState};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = AppConfig::default();
/// let orchestrator = TranslationOrchestrator::new(
///     Arc::new(ApiTranslator::from_config(&config.translation)),
///     Arc::new(LocalHistoryStore::new(Arc::new(MemoryKeyValueStore::new()), 50)),
///     Duration::from_millis(config.orchestrator.local_quiet_ms),
/// );
///
/// let mut views = orchestrator.subscribe();
/// orchestrator.submit(EditState {
///     source_text: "see you tomorrow".into(),
///     source_language: "auto".into(),
///     target_language: "es".into(),
///     ..EditState::default()
/// });
/// while views.changed().await.is_ok() {
///     if let Some(result) = &views.borrow().result {
///         println!("{}", result.translation);
///         break;
///     }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct TranslationOrchestrator {
    inner: Arc<Inner>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `translator`   — remote translation capability.
    /// * `history`      — where applied results are appended.
    /// * `quiet_period` — debounce window (200 ms local, 500 ms cloud by default).
    pub fn new(
        translator: Arc<dyn Translator>,
        history: Arc<dyn HistoryStore>,
        quiet_period: Duration,
    ) -> Self {
        let (view, _) = watch::channel(TranslationView::default());
        let core = Core {
            tracker: RequestTracker::new(),
            pending: None,
            armed: None,
            next_token: 0,
            timer: None,
            quiet_period,
            history,
        };

        Self {
            inner: Arc::new(Inner {
                translator,
                core: Mutex::new(core),
                view,
            }),
        }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> TranslationView {
        self.inner.view.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<TranslationView> {
        self.inner.view.subscribe()
    }

    /// The history store results are currently appended to.
    pub fn history_store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.inner.core().history)
    }

    /// Handle one edit.  Fire-and-forget; call on every keystroke or
    /// settings change.
    pub fn submit(&self, edit: EditState) {
        let mut core = self.inner.core();

        if edit.is_blank() {
            core.cancel_timer();
            core.tracker.invalidate();
            self.inner.view.send_modify(TranslationView::clear);
            log::debug!("orchestrator: blank input, display cleared");
            return;
        }

        core.cancel_timer();
        core.next_token += 1;
        let token = core.next_token;
        core.armed = Some(token);
        core.pending = Some(edit);

        let quiet = core.quiet_period;
        let inner = Arc::clone(&self.inner);
        core.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            fire(inner, token).await;
        }));

        self.inner.view.send_if_modified(|view| {
            let changed = view.phase != RequestPhase::Pending;
            view.phase = RequestPhase::Pending;
            changed
        });
    }

    /// Cancel the timer, invalidate in-flight requests and clear the display.
    pub fn reset(&self) {
        let mut core = self.inner.core();
        core.cancel_timer();
        core.tracker.invalidate();
        self.inner.view.send_modify(TranslationView::clear);
        log::debug!("orchestrator: reset");
    }

    /// [`reset`](Self::reset) and move to another history backend and
    /// debounce window in one step.
    ///
    /// Called on identity transitions: nothing issued before the switch can
    /// settle into `history`.
    pub fn switch_backend(&self, history: Arc<dyn HistoryStore>, quiet_period: Duration) {
        let mut core = self.inner.core();
        core.cancel_timer();
        core.tracker.invalidate();
        core.history = history;
        core.quiet_period = quiet_period;
        self.inner.view.send_modify(TranslationView::clear);
        log::debug!("orchestrator: switched backend, state reset");
    }
}

// ---------------------------------------------------------------------------
// Timer body
// ---------------------------------------------------------------------------

/// Runs when the quiet period of timer `token` has elapsed.
async fn fire(inner: Arc<Inner>, token: u64) {
    let request = {
        let mut core = inner.core();
        if core.armed != Some(token) {
            return;
        }
        core.armed = None;
        // Detach ourselves: later submits must not abort this call.
        core.timer = None;
        let Some(edit) = core.pending.take() else {
            return;
        };
        let id = core.tracker.issue();
        inner.view.send_modify(|view| {
            view.phase = RequestPhase::InFlight;
            view.loading = true;
        });
        edit.into_request(id)
    };

    log::debug!("orchestrator: issuing request #{}", request.issued_at);

    let outcome = match inner.translator.translate(&request).await {
        Ok(raw) => validate(&raw),
        Err(e) => Err(e),
    };

    if let Some((history, entry)) = settle(&inner, &request, outcome) {
        if let Err(e) = history.append(entry).await {
            log::warn!("orchestrator: history append failed ({e})");
        }
    }
}

/// Decide the fate of `request` and update the view under the core lock.
///
/// Returns the store and entry to append when a result was applied.
fn settle(
    inner: &Inner,
    request: &TranslationRequest,
    outcome: Result<TranslationResult, TranslateError>,
) -> Option<(Arc<dyn HistoryStore>, NewHistoryEntry)> {
    let id = request.issued_at;
    let mut core = inner.core();

    if core.tracker.settle(id) == Settlement::Discard {
        log::debug!("orchestrator: request #{id} is stale, discarded");
        if !core.tracker.is_loading() && core.armed.is_none() {
            inner.view.send_modify(|view| {
                view.phase = RequestPhase::Discarded;
                view.loading = false;
            });
        }
        return None;
    }

    let next_phase = if core.armed.is_some() {
        RequestPhase::Pending
    } else {
        RequestPhase::Settled
    };

    match outcome {
        Ok(result) => {
            log::debug!("orchestrator: request #{id} applied");
            let entry = history_entry(request, &result);
            inner.view.send_modify(|view| {
                view.phase = next_phase;
                view.loading = false;
                view.result = Some(result);
                view.notice = None;
                view.applied = Some(id);
            });
            Some((Arc::clone(&core.history), entry))
        }
        Err(e) => {
            log::error!("orchestrator: request #{id} failed: {e}");
            inner.view.send_modify(|view| {
                view.phase = next_phase;
                view.loading = false;
                view.notice = Some(e.to_string());
                view.applied = Some(id);
            });
            None
        }
    }
}

fn history_entry(request: &TranslationRequest, result: &TranslationResult) -> NewHistoryEntry {
    let source_language = if request.detect_source() {
        result.detected_language.clone()
    } else {
        request.source_language.clone()
    };

    NewHistoryEntry {
        source_text: request.source_text.clone(),
        translation: result.translation.clone(),
        source_language,
        target_language: request.target_language.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
