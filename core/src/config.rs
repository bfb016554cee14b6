//! Client configuration loaded from environment variables with defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::client::{CatalogClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::StorageError;
use crate::storage::{FileStore, MemoryStore};
use crate::store::{CharacterStore, DEFAULT_CACHE_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Catalog API root, e.g. `https://rickandmortyapi.com/api`
    pub base_url: String,
    pub request_timeout: Duration,
    /// How many of the most recent characters are kept for offline use
    pub cache_limit: usize,
    /// Directory for persisted state; `None` keeps everything in memory
    pub cache_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            cache_limit: DEFAULT_CACHE_LIMIT,
            cache_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from `CATALOG_*` variables (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let base_url = env::var("CATALOG_BASE_URL").unwrap_or(defaults.base_url);
        let request_timeout = parse_positive::<u64>("CATALOG_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let cache_limit = parse_positive::<usize>("CATALOG_CACHE_LIMIT").unwrap_or(defaults.cache_limit);
        let cache_dir = env::var("CATALOG_CACHE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            request_timeout,
            cache_limit,
            cache_dir,
        }
    }

    pub fn client(&self) -> CatalogClient {
        CatalogClient::with_timeout(&self.base_url, self.request_timeout)
    }

    /// Build a `CharacterStore` persisting under `cache_dir`, or in memory
    /// when no directory is configured.
    pub fn open_store(&self) -> Result<CharacterStore, StorageError> {
        let store = match &self.cache_dir {
            Some(dir) => CharacterStore::with_cache_limit(FileStore::open(dir)?, self.cache_limit),
            None => CharacterStore::with_cache_limit(MemoryStore::new(), self.cache_limit),
        };
        Ok(store)
    }
}

/// Read a numeric setting that must be greater than zero.
fn parse_positive<T: FromStr + PartialEq + Default>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Some(value),
        _ => {
            warn!(variable = name, value = %raw, "ignoring invalid setting, using default");
            None
        }
    }
}
