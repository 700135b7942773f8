//! UI preferences persisted in the local key-value store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError};

/// Slot name for the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Parse a user-typed name (`light`, `dark`, `system`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

pub struct Preferences {
    slots: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(slots: Arc<dyn KeyValueStore>) -> Self {
        Self { slots }
    }

    /// Stored theme; `System` when unset or unreadable.
    pub fn theme(&self) -> Theme {
        match self.slots.get(THEME_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("preferences: ignoring stored theme ({e})");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::warn!("preferences: theme unavailable ({e})");
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.slots.set(THEME_KEY, &serde_json::to_string(&theme)?)
    }
}
