//! Speech playback controller.
//!
//! [`PlaybackController`] serialises "read this aloud" requests:
//!
//! ```text
//! Idle ──speak──▶ Synthesizing ──bytes──▶ Playing ──done──▶ Idle
//!                      │                     │
//!                      └──────failure────────┴──────────▶ Idle (+ notice)
//! ```
//!
//! A `speak` while not idle is rejected, never queued.  The audio output is
//! built at the start of the first `speak`, before synthesis, through the
//! injected factory on the blocking pool, and then reused for the life of the
//! controller.  A failed construction is retried on the next `speak`.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, OnceCell};

use crate::audio::{decode, AudioOutput, CpalOutput, OutputError};
use crate::tts::synth::SpeechSynthesizer;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Phase of the single playback session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Synthesizing,
    Playing,
}

impl PlaybackState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }
}

/// Transient message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackNotice {
    /// Shown while audio is playing; cleared on completion.
    Speaking,
    /// The last utterance failed.
    Failed(String),
}

/// What observers see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackView {
    pub state: PlaybackState,
    /// Text of the active utterance; `None` when idle.
    pub text: Option<String>,
    pub notice: Option<PlaybackNotice>,
}

/// Why a `speak` call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpeakRejected {
    #[error("nothing to speak")]
    EmptyText,
    #[error("already speaking")]
    Busy,
}

/// Builds the shared audio output on first use.
pub type OutputFactory =
    Box<dyn Fn() -> Result<Arc<dyn AudioOutput>, OutputError> + Send + Sync>;

/// Factory opening the default speaker at `sample_rate` Hz.
pub fn cpal_output_factory(sample_rate: u32) -> OutputFactory {
    Box::new(move || {
        let output: Arc<dyn AudioOutput> = Arc::new(CpalOutput::open(sample_rate)?);
        Ok(output)
    })
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

struct Inner {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    factory: OutputFactory,
    output: OnceCell<Arc<dyn AudioOutput>>,
    sample_rate: u32,
    channels: u16,
    view: watch::Sender<PlaybackView>,
}

/// Cheap-to-clone handle; all clones share one session and one output.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    /// `sample_rate` / `channels` describe the PCM the synthesizer returns.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        factory: OutputFactory,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        let (view, _) = watch::channel(PlaybackView::default());
        Self {
            inner: Arc::new(Inner {
                synthesizer,
                factory,
                output: OnceCell::new(),
                sample_rate,
                channels,
                view,
            }),
        }
    }

    /// Current snapshot.
    pub fn view(&self) -> PlaybackView {
        self.inner.view.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackView> {
        self.inner.view.subscribe()
    }

    /// Start reading `text` aloud.
    ///
    /// Returns immediately; progress is published through [`subscribe`].
    /// Must be called from within a tokio runtime.
    ///
    /// [`subscribe`]: Self::subscribe
    pub fn speak(&self, text: &str) -> Result<(), SpeakRejected> {
        if text.trim().is_empty() {
            return Err(SpeakRejected::EmptyText);
        }

        let accepted = self.inner.view.send_if_modified(|view| {
            if view.state.is_busy() {
                return false;
            }
            view.state = PlaybackState::Synthesizing;
            view.text = Some(text.to_string());
            view.notice = None;
            true
        });
        if !accepted {
            log::debug!("playback: speak rejected, session busy");
            return Err(SpeakRejected::Busy);
        }

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        tokio::spawn(async move {
            match inner.run(&text).await {
                Ok(()) => inner.finish(None),
                Err(message) => {
                    log::error!("playback failed: {message}");
                    inner.finish(Some(message));
                }
            }
        });
        Ok(())
    }
}

impl Inner {
    async fn run(self: &Arc<Self>, text: &str) -> Result<(), String> {
        let output = self.output().await.map_err(|e| e.to_string())?;

        let pcm = self
            .synthesizer
            .synthesize(text)
            .await
            .map_err(|e| e.to_string())?;

        let buffer =
            decode(&pcm, self.sample_rate, self.channels).map_err(|e| e.to_string())?;

        self.view.send_modify(|view| {
            view.state = PlaybackState::Playing;
            view.notice = Some(PlaybackNotice::Speaking);
        });
        log::debug!(
            "playback: playing {:.2}s of audio",
            buffer.duration_secs()
        );

        output.play(buffer).await.map_err(|e| e.to_string())
    }

    /// The shared output, opening it on first use.  Opening may block on the
    /// device, so the factory runs on the blocking pool.
    async fn output(self: &Arc<Self>) -> Result<&Arc<dyn AudioOutput>, OutputError> {
        self.output
            .get_or_try_init(|| {
                let inner = Arc::clone(self);
                async move {
                    tokio::task::spawn_blocking(move || (inner.factory)())
                        .await
                        .unwrap_or_else(|_| Err(OutputError::ThreadGone))
                }
            })
            .await
    }

    fn finish(&self, failure: Option<String>) {
        self.view.send_modify(|view| {
            view.state = PlaybackState::Idle;
            view.text = None;
            view.notice = failure.map(PlaybackNotice::Failed);
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
