//! History kept in a local key-value slot.
//!
//! The whole list lives under [`HISTORY_KEY`] as a JSON array, newest first,
//! already trimmed to capacity.  Every operation is a read-modify-write of
//! that one slot, serialised by an async mutex.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::DeploymentMode;
use crate::history::{push_bounded, HistoryEntry, HistoryError, HistoryStore, NewHistoryEntry};
use crate::storage::KeyValueStore;

/// Slot name for the history array.
pub const HISTORY_KEY: &str = "translation_history";

pub struct LocalHistoryStore {
    slots: Arc<dyn KeyValueStore>,
    capacity: usize,
    lock: Mutex<()>,
}

impl LocalHistoryStore {
    pub fn new(slots: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            slots,
            capacity,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        match self.slots.get(HISTORY_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn store(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_string(entries)?;
        self.slots.set(HISTORY_KEY, &json)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, HistoryError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().unwrap_or_else(|e| {
            log::warn!("history: discarding unreadable local history ({e})");
            Vec::new()
        });
        let entry = entry.into_entry();
        push_bounded(&mut entries, entry.clone(), self.capacity);
        self.store(&entries)?;

        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        entries.truncate(self.capacity);
        Ok(entries)
    }

    async fn set_favorite(&self, id: &str, value: bool) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;
        if entry.is_favorite == value {
            return Ok(());
        }
        entry.is_favorite = value;
        self.store(&entries)
    }

    async fn clear_all(&self) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;
        self.store(&[])
    }

    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Local
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
