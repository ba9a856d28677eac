//! On-disk cache of extracted article bodies.
//!
//! The cache is one pretty-printed JSON object mapping `"<url>_<title>"` to an
//! [`EnrichedRecord`] snapshot. It is read once before enrichment and written
//! once afterwards; the whole file is replaced on save, so the last run to
//! finish wins.
//!
//! Cache problems never fail a run: a missing or corrupt file loads as an empty
//! cache and a failed save is only logged.

use crate::models::EnrichedRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Cache contents, keyed by [`crate::models::NewsRecord::cache_key`].
pub type CacheMap = BTreeMap<String, EnrichedRecord>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cache file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON file holding a [`CacheMap`].
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Create a store backed by the JSON file at `path`.
    ///
    /// Nothing is read or created until [`load`](Self::load) or
    /// [`save`](Self::save) is called.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = CacheStore::new("news_cache.json");
    /// let mut cache = store.load().await;
    /// // ... enrich ...
    /// store.save(&cache).await;
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Load the cache, falling back to an empty map on any problem.
    ///
    /// # Returns
    ///
    /// The stored map, or an empty one when the file is missing, unreadable
    /// or not valid JSON. Problems are logged, never returned.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> CacheMap {
        match self.try_load().await {
            Ok(Some(map)) => {
                info!(entries = map.len(), "Loaded cached articles");
                map
            }
            Ok(None) => {
                info!("No cache file yet; starting empty");
                CacheMap::new()
            }
            Err(e) => {
                warn!(error = %e, "Error loading cache; starting empty");
                CacheMap::new()
            }
        }
    }

    /// Load the cache, reporting problems to the caller.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(map))` - the file was read and parsed
    /// * `Ok(None)` - the file does not exist yet
    /// * `Err(_)` - the file exists but could not be read or parsed
    pub async fn try_load(&self) -> Result<Option<CacheMap>, CacheError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.display(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Json {
                path: self.display(),
                source,
            })
    }

    /// Overwrite the cache file with `map`, logging instead of failing.
    ///
    /// # Arguments
    ///
    /// * `map` - The complete cache; the previous file contents are replaced
    ///
    /// # Returns
    ///
    /// `true` if the file was written.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self, map: &CacheMap) -> bool {
        match self.try_save(map).await {
            Ok(()) => {
                info!(entries = map.len(), "Saved articles to cache");
                true
            }
            Err(e) => {
                error!(error = %e, "Error saving cache");
                false
            }
        }
    }

    /// Write `map` as pretty-printed JSON, replacing the file.
    pub async fn try_save(&self, map: &CacheMap) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(map).map_err(|source| CacheError::Json {
            path: self.display(),
            source,
        })?;
        fs::write(&self.path, json)
            .await
            .map_err(|source| CacheError::Io {
                path: self.display(),
                source,
            })
    }
}
