//! Translation history — one contract, two interchangeable backends.
//!
//! * [`HistoryStore`] — async trait: append / list / set_favorite / clear_all.
//! * [`LocalHistoryStore`] — JSON array in a durable key-value slot.
//! * [`RemoteHistoryStore`] — per-user collection on a remote service,
//!   scoped to one [`Identity`].
//! * [`HistoryBackends`] — picks the backend for the current identity.
//!
//! Both backends keep at most `capacity` entries (50 by default), newest
//! first, evicting by insertion order.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use live_translate::history::{HistoryStore, LocalHistoryStore, NewHistoryEntry};
//! use live_translate::storage::MemoryKeyValueStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = LocalHistoryStore::new(Arc::new(MemoryKeyValueStore::new()), 50);
//! let entry = store
//!     .append(NewHistoryEntry {
//!         source_text: "thank you".into(),
//!         translation: "merci".into(),
//!         source_language: "en".into(),
//!         target_language: "fr".into(),
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(store.list().await.unwrap()[0].id, entry.id);
//! # }
//! ```

pub mod local;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DeploymentMode;
use crate::identity::Identity;
use crate::storage::{KeyValueStore, StorageError};

pub use local::LocalHistoryStore;
pub use remote::{HistoryCollection, HttpHistoryCollection, RemoteHistoryStore};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A persisted translation.
///
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source_text: String,
    pub translation: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub is_favorite: bool,
}

/// What the orchestrator hands to [`HistoryStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub source_text: String,
    pub translation: String,
    pub source_language: String,
    pub target_language: String,
}

impl NewHistoryEntry {
    /// Stamp with a fresh id and the current time.
    pub(crate) fn into_entry(self) -> HistoryEntry {
        HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            source_text: self.source_text,
            translation: self.translation,
            source_language: self.source_language,
            target_language: self.target_language,
            is_favorite: false,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

/// History failures.  Never shown to the user; callers log and move on.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("no history entry with id {0}")]
    NotFound(String),
}

impl From<StorageError> for HistoryError {
    fn from(e: StorageError) -> Self {
        HistoryError::PersistenceFailure(e.to_string())
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        HistoryError::PersistenceFailure(e.to_string())
    }
}

impl From<reqwest::Error> for HistoryError {
    fn from(e: reqwest::Error) -> Self {
        HistoryError::PersistenceFailure(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// HistoryStore trait
// ---------------------------------------------------------------------------

/// Backend-agnostic history contract.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a new entry, returning it with its assigned id and timestamp.
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, HistoryError>;

    /// Newest first, at most `capacity` entries.
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Set (not toggle) the favorite flag of entry `id`.
    async fn set_favorite(&self, id: &str, value: bool) -> Result<(), HistoryError>;

    /// Remove every entry visible to this store.
    async fn clear_all(&self) -> Result<(), HistoryError>;

    /// Which deployment mode this backend belongs to.
    fn mode(&self) -> DeploymentMode;
}

/// Insert `entry` at the front and evict from the back beyond `capacity`.
pub(crate) fn push_bounded(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, capacity: usize) {
    entries.insert(0, entry);
    entries.truncate(capacity);
}

// ---------------------------------------------------------------------------
// HistoryBackends
// ---------------------------------------------------------------------------

/// The resources both backends are built from; hands out the right store
/// for an identity.
///
/// There is a single local store per process: every signed-out session
/// shares it, so its read-modify-write appends never interleave.
#[derive(Clone)]
pub struct HistoryBackends {
    local: Arc<LocalHistoryStore>,
    remote: Arc<dyn HistoryCollection>,
    capacity: usize,
}

impl HistoryBackends {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn HistoryCollection>,
        capacity: usize,
    ) -> Self {
        Self {
            local: Arc::new(LocalHistoryStore::new(local, capacity)),
            remote,
            capacity,
        }
    }

    /// Remote store when someone is signed in, local store otherwise.
    pub fn for_identity(&self, identity: Option<&Identity>) -> Arc<dyn HistoryStore> {
        match identity {
            Some(owner) => Arc::new(RemoteHistoryStore::new(
                Arc::clone(&self.remote),
                owner.clone(),
                self.capacity,
            )),
            None => Arc::clone(&self.local) as Arc<dyn HistoryStore>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn entry(n: usize) -> HistoryEntry {
        NewHistoryEntry {
            source_text: n.to_string(),
            translation: format!("t{n}"),
            source_language: "en".into(),
            target_language: "fr".into(),
        }
        .into_entry()
    }

    #[test]
    fn push_bounded_keeps_newest_first() {
        let mut entries = Vec::new();
        for n in 1..=5 {
            push_bounded(&mut entries, entry(n), 3);
        }
        let texts: Vec<_> = entries.iter().map(|e| e.source_text.as_str()).collect();
        assert_eq!(texts, vec!["5", "4", "3"]);
    }

    #[test]
    fn into_entry_assigns_unique_ids() {
        let a = entry(1);
        let b = entry(1);
        assert_ne!(a.id, b.id);
        assert!(!a.is_favorite);
    }

    #[test]
    fn entry_serialises_camel_case() {
        let json = serde_json::to_value(entry(1)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("isFavorite").is_some());
        assert!(json.get("sourceText").is_some());
    }

    #[test]
    fn backend_follows_identity() {
        let backends = HistoryBackends::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(HttpHistoryCollection::new("http://localhost:8080", 5)),
            50,
        );
        assert_eq!(backends.for_identity(None).mode(), DeploymentMode::Local);
        assert_eq!(
            backends.for_identity(Some(&Identity::new("u1"))).mode(),
            DeploymentMode::Cloud
        );
    }

    #[tokio::test]
    async fn signed_out_sessions_share_one_local_store() {
        let backends = HistoryBackends::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(HttpHistoryCollection::new("http://localhost:8080", 5)),
            50,
        );
        let first = backends.for_identity(None);
        let second = backends.for_identity(None);
        assert!(Arc::ptr_eq(&first, &second));

        let new = |text: &str| NewHistoryEntry {
            source_text: text.into(),
            translation: text.into(),
            source_language: "en".into(),
            target_language: "fr".into(),
        };
        let (a, b) = tokio::join!(first.append(new("one")), second.append(new("two")));
        a.unwrap();
        b.unwrap();
        assert_eq!(backends.for_identity(None).list().await.unwrap().len(), 2);
    }
}
