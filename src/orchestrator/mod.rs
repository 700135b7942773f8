//! Translation request orchestration.
//!
//! Turns keystroke-rate edits into a minimal, race-safe set of translation
//! requests and exposes the latest settled result.
//!
//! # Architecture
//!
//! ```text
//! EditState (UI, every edit)
//!        │
//!        ▼
//! TranslationOrchestrator::submit()
//!        │
//!        ├─ blank → clear view
//!        └─ text  → debounce timer (tokio task)
//!                     └─▶ Translator::translate → validate
//!                           └─▶ RequestTracker::settle
//!                                 ├─ Apply   → view + HistoryStore::append
//!                                 └─ Discard → nothing
//!
//! watch::Receiver<TranslationView> ←─── read by the front-end
//! ```

pub mod runner;
pub mod state;

pub use runner::TranslationOrchestrator;
pub use state::{RequestPhase, RequestTracker, Settlement, TranslationView};
