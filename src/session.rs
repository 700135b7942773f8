//! One user-facing translator session.
//!
//! [`TranslatorSession`] owns the current [`EditState`] and wires the
//! orchestrator, the playback controller and the history backend selection
//! together.  It watches the identity provider: every transition swaps the
//! history backend and debounce window and resets the orchestrator in one
//! step, so a request issued for the previous identity is never recorded.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::config::{DeploymentMode, LanguageDefaults, OrchestratorConfig};
use crate::history::{HistoryBackends, HistoryEntry, HistoryError};
use crate::identity::{Identity, IdentityProvider};
use crate::orchestrator::{TranslationOrchestrator, TranslationView};
use crate::translate::{EditState, Translator};
use crate::tts::{PlaybackController, SpeakRejected};

pub struct TranslatorSession {
    orchestrator: TranslationOrchestrator,
    playback: PlaybackController,
    identity: Arc<dyn IdentityProvider>,
    edit: Mutex<EditState>,
    watcher: JoinHandle<()>,
}

impl TranslatorSession {
    /// Build a session for whoever `identity` currently reports.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        translator: Arc<dyn Translator>,
        playback: PlaybackController,
        identity: Arc<dyn IdentityProvider>,
        backends: HistoryBackends,
        timing: OrchestratorConfig,
        languages: &LanguageDefaults,
    ) -> Self {
        let mut changes = identity.subscribe();
        let current = changes.borrow_and_update().clone();

        let store = backends.for_identity(current.as_ref());
        let quiet = timing.quiet_period(store.mode());
        log::info!("session: starting in {:?} mode", store.mode());
        let orchestrator = TranslationOrchestrator::new(translator, store, quiet);

        let watched = orchestrator.clone();
        let watcher = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let identity = changes.borrow_and_update().clone();
                switch_identity(&watched, &backends, &timing, identity.as_ref());
            }
        });

        let edit = EditState {
            source_language: languages.source_language.clone(),
            source_country: languages.source_country.clone(),
            target_language: languages.target_language.clone(),
            target_country: languages.target_country.clone(),
            ..EditState::default()
        };

        Self {
            orchestrator,
            playback,
            identity,
            edit: Mutex::new(edit),
            watcher,
        }
    }

    pub fn orchestrator(&self) -> &TranslationOrchestrator {
        &self.orchestrator
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn view(&self) -> TranslationView {
        self.orchestrator.view()
    }

    /// Who the session is currently running for.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.current()
    }

    pub fn mode(&self) -> DeploymentMode {
        self.orchestrator.history_store().mode()
    }

    /// Snapshot of the current edit state.
    pub fn edit_state(&self) -> EditState {
        self.edit().clone()
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Replace the source text.
    pub fn set_text(&self, text: &str) {
        self.update(|edit| edit.source_text = text.to_string());
    }

    /// Source language (`"auto"` to detect) and optional country.
    pub fn set_source(&self, language: &str, country: &str) {
        self.update(|edit| {
            edit.source_language = language.to_string();
            edit.source_country = country.to_string();
        });
    }

    pub fn set_target(&self, language: &str, country: &str) {
        self.update(|edit| {
            edit.target_language = language.to_string();
            edit.target_country = country.to_string();
        });
    }

    /// Apply `change` and hand the resulting snapshot to the orchestrator.
    fn update(&self, change: impl FnOnce(&mut EditState)) {
        let snapshot = {
            let mut edit = self.edit();
            change(&mut *edit);
            edit.clone()
        };
        self.orchestrator.submit(snapshot);
    }

    fn edit(&self) -> MutexGuard<'_, EditState> {
        self.edit.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -----------------------------------------------------------------------
    // Speech
    // -----------------------------------------------------------------------

    /// Read the displayed translation aloud.
    pub fn speak_translation(&self) -> Result<(), SpeakRejected> {
        let text = self
            .orchestrator
            .view()
            .result
            .map(|result| {
                if result.tts.speak_text.trim().is_empty() {
                    result.translation
                } else {
                    result.tts.speak_text
                }
            })
            .unwrap_or_default();
        self.playback.speak(&text)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.orchestrator.history_store().list().await
    }

    pub async fn set_favorite(&self, id: &str, value: bool) -> Result<(), HistoryError> {
        self.orchestrator.history_store().set_favorite(id, value).await
    }

    pub async fn clear_history(&self) -> Result<(), HistoryError> {
        self.orchestrator.history_store().clear_all().await
    }
}

impl Drop for TranslatorSession {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn switch_identity(
    orchestrator: &TranslationOrchestrator,
    backends: &HistoryBackends,
    timing: &OrchestratorConfig,
    identity: Option<&Identity>,
) {
    let store = backends.for_identity(identity);
    let mode = store.mode();
    match identity {
        Some(who) => log::info!("session: switched to {mode:?} history for {}", who.user_id),
        None => log::info!("session: switched to {mode:?} history"),
    }

    orchestrator.switch_backend(store, timing.quiet_period(mode));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    use super::*;
    use crate::audio::{AudioOutput, OutputError, PlayableBuffer};
    use crate::history::remote::memory::MemoryHistoryCollection;
    use crate::identity::StaticIdentityProvider;
    use crate::storage::MemoryKeyValueStore;
    use crate::translate::{TranslateError, TranslationRequest};
    use crate::tts::{PlaybackState, SpeechSynthesizer, TtsError};

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
            Ok(serde_json::json!({
                "detected_language": "en",
                "source_language": "en",
                "translation": format!("{}->{}", request.source_text, request.target_language),
                "tts": { "enabled": true, "voice_language_code": "", "speak_text": "" }
            })
            .to_string())
        }
    }

    /// Echoes like [`EchoTranslator`] but holds every call until released.
    #[derive(Default)]
    struct HeldTranslator {
        release: Notify,
    }

    #[async_trait]
    impl Translator for HeldTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
            self.release.notified().await;
            EchoTranslator.translate(request).await
        }
    }

    struct ToneSynth;

    #[async_trait]
    impl SpeechSynthesizer for ToneSynth {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, TtsError> {
            Ok(vec![0x00, 0x40, 0x00, 0xC0])
        }
    }

    struct InstantOutput;

    #[async_trait]
    impl AudioOutput for InstantOutput {
        async fn play(&self, _buffer: PlayableBuffer) -> Result<(), OutputError> {
            Ok(())
        }
    }

    struct Fixture {
        session: TranslatorSession,
        provider: Arc<StaticIdentityProvider>,
        remote: Arc<MemoryHistoryCollection>,
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(EchoTranslator))
    }

    fn fixture_with(translator: Arc<dyn Translator>) -> Fixture {
        let provider = Arc::new(StaticIdentityProvider::new(None));
        let remote = Arc::new(MemoryHistoryCollection::default());
        let backends =
            HistoryBackends::new(Arc::new(MemoryKeyValueStore::new()), remote.clone(), 50);
        let playback = PlaybackController::new(
            Arc::new(ToneSynth),
            Box::new(|| Ok::<_, OutputError>(Arc::new(InstantOutput) as Arc<dyn AudioOutput>)),
            24_000,
            1,
        );

        let session = TranslatorSession::new(
            translator,
            playback,
            provider.clone(),
            backends,
            OrchestratorConfig::default(),
            &LanguageDefaults::default(),
        );
        Fixture {
            session,
            provider,
            remote,
        }
    }

    fn shown(session: &TranslatorSession) -> Option<String> {
        session.view().result.map(|r| r.translation)
    }

    #[tokio::test(start_paused = true)]
    async fn starts_local_with_default_languages() {
        let f = fixture();
        assert_eq!(f.session.mode(), DeploymentMode::Local);
        assert!(f.session.identity().is_none());

        let edit = f.session.edit_state();
        assert_eq!(edit.source_language, "auto");
        assert_eq!(edit.target_language, "en");

        f.session.set_text("hola");
        sleep(Duration::from_millis(250)).await;
        assert_eq!(shown(&f.session).as_deref(), Some("hola->en"));
        assert_eq!(f.session.history().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn target_change_retranslates() {
        let f = fixture();
        f.session.set_text("hello");
        sleep(Duration::from_millis(250)).await;

        f.session.set_target("de", "DE");
        sleep(Duration::from_millis(250)).await;
        assert_eq!(shown(&f.session).as_deref(), Some("hello->de"));
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_switches_backend_and_clears() {
        let f = fixture();
        f.session.set_text("local one");
        sleep(Duration::from_millis(250)).await;
        assert!(shown(&f.session).is_some());

        f.provider.sign_in(Identity::new("ada"));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(f.session.mode(), DeploymentMode::Cloud);
        assert_eq!(shown(&f.session), None);
        assert!(f.session.history().await.unwrap().is_empty());

        // Cloud mode debounces for 500 ms.
        f.session.set_text("cloud one");
        sleep(Duration::from_millis(300)).await;
        assert_eq!(shown(&f.session), None);
        sleep(Duration::from_millis(300)).await;
        assert_eq!(shown(&f.session).as_deref(), Some("cloud one->en"));
        assert_eq!(f.remote.stored("ada"), 1);

        f.provider.sign_out();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(f.session.mode(), DeploymentMode::Local);
        let local = f.session.history().await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].source_text, "local one");
    }

    #[tokio::test(start_paused = true)]
    async fn request_in_flight_at_sign_in_is_recorded_nowhere() {
        let translator = Arc::new(HeldTranslator::default());
        let f = fixture_with(translator.clone());

        f.session.set_text("guest text");
        sleep(Duration::from_millis(250)).await;
        assert!(f.session.view().loading);

        f.provider.sign_in(Identity::new("ada"));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(f.session.mode(), DeploymentMode::Cloud);

        translator.release.notify_one();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(shown(&f.session), None);
        assert!(!f.session.view().loading);
        assert_eq!(f.remote.stored("ada"), 0);

        f.provider.sign_out();
        sleep(Duration::from_millis(10)).await;
        assert!(f.session.history().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn favorite_and_clear_go_through_active_store() {
        let f = fixture();
        f.session.set_text("keep me");
        sleep(Duration::from_millis(250)).await;

        let id = f.session.history().await.unwrap()[0].id.clone();
        f.session.set_favorite(&id, true).await.unwrap();
        assert!(f.session.history().await.unwrap()[0].is_favorite);
        assert!(matches!(
            f.session.set_favorite("nope", true).await,
            Err(HistoryError::NotFound(_))
        ));

        f.session.clear_history().await.unwrap();
        assert!(f.session.history().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn speak_translation_needs_a_result() {
        let f = fixture();
        assert_eq!(f.session.speak_translation(), Err(SpeakRejected::EmptyText));

        f.session.set_text("bonjour");
        sleep(Duration::from_millis(250)).await;

        let mut rx = f.session.playback().subscribe();
        assert_eq!(f.session.speak_translation(), Ok(()));
        rx.wait_for(|v| v.state == PlaybackState::Idle).await.unwrap();
        assert_eq!(f.session.playback().view().notice, None);
    }
}
