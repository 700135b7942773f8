//! Text-to-speech: remote synthesis and exclusive playback.
//!
//! * [`SpeechSynthesizer`] — async trait for TTS backends.
//! * [`ApiSynthesizer`] — OpenAI-compatible `/v1/audio/speech` backend.
//! * [`PlaybackController`] — one utterance at a time over a shared output.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use live_translate::config::AppConfig;
//! use live_translate::tts::{cpal_output_factory, ApiSynthesizer, PlaybackController};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let rate = config.speech.sample_rate;
//!     let controller = PlaybackController::new(
//!         Arc::new(ApiSynthesizer::from_config(&config.speech)),
//!         cpal_output_factory(rate),
//!         rate,
//!         config.speech.channels,
//!     );
//!     controller.speak("hello there").unwrap();
//! }
//! ```

pub mod playback;
pub mod synth;

pub use playback::{
    cpal_output_factory, OutputFactory, PlaybackController, PlaybackNotice, PlaybackState,
    PlaybackView, SpeakRejected,
};
pub use synth::{ApiSynthesizer, SpeechSynthesizer, TtsError};
