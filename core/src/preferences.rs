//! Persisted light/dark theme flag.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::storage::{load_json, save_json, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreference {
    pub is_dark_mode: bool,
}

impl ThemePreference {
    /// Stored preference, or light mode when nothing usable is stored.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json(store, THEME_KEY) {
            Ok(Some(pref)) => pref,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable theme preference");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, THEME_KEY, self)
    }

    pub fn toggle(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
    }
}
