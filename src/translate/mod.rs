//! Translation capability and response contract.
//!
//! This module provides:
//! * [`Translator`] — async trait implemented by translation backends.
//! * [`ApiTranslator`] — OpenAI-compatible chat-completions backend.
//! * [`validate`] — turns a raw model reply into a [`TranslationResult`].
//! * [`PromptBuilder`] — builds the JSON-contract prompt.
//! * [`EditState`] / [`TranslationRequest`] / [`TranslationResult`] — the
//!   value types flowing through the orchestrator.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use live_translate::config::AppConfig;
//! use live_translate::translate::{validate, ApiTranslator, EditState, Translator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let translator = ApiTranslator::from_config(&config.translation);
//!
//!     let request = EditState {
//!         source_text: "good night".into(),
//!         source_language: "auto".into(),
//!         target_language: "de".into(),
//!         ..EditState::default()
//!     }
//!     .into_request(1);
//!
//!     let raw = translator.translate(&request).await.unwrap();
//!     println!("{}", validate(&raw).unwrap().translation);
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod types;
pub mod validate;

pub use client::{ApiTranslator, TranslateError, Translator};
pub use prompt::PromptBuilder;
pub use types::{EditState, RequestId, TranslationRequest, TranslationResult, TtsConfig};
pub use validate::validate;
