//! Live translation core: debounced translation requests, response contract
//! validation, speech playback and translation history.

pub mod audio;
pub mod config;
pub mod history;
pub mod identity;
pub mod orchestrator;
pub mod preferences;
pub mod session;
pub mod storage;
pub mod translate;
pub mod tts;
