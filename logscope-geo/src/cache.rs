//! IP → country cache, optionally persisted as a JSON object on disk.
//!
//! Loading never fails: a missing file starts an empty cache, an unreadable or
//! malformed file logs a warning and also starts empty. Saving writes to a
//! `.tmp` sibling and renames it over the final path so a crash mid-write
//! never corrupts the stored cache.

use logscope_core::LogscopeError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct GeoCache {
    entries: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl GeoCache {
    /// Memory-only cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path` if given; the same path is used by [`GeoCache::save`].
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("geo cache: no cache file configured, keeping cache in memory");
            return Self::in_memory();
        };
        let mut cache = Self {
            entries: BTreeMap::new(),
            path: Some(path.to_path_buf()),
        };

        if !path.exists() {
            tracing::info!(path = %path.display(), "geo cache: no cache file found, starting fresh");
            return cache;
        }

        let data = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "geo cache: failed to read cache file");
                return cache;
            }
        };

        match serde_json::from_str::<BTreeMap<String, String>>(&data) {
            Ok(entries) => {
                tracing::info!(entries = entries.len(), path = %path.display(), "geo cache: restored from file");
                cache.entries = entries;
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "geo cache: cache file is malformed, ignoring");
            }
        }
        cache
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, ip: &str) -> Option<&str> {
        self.entries.get(ip).map(String::as_str)
    }

    pub fn insert(&mut self, ip: impl Into<String>, country: impl Into<String>) {
        self.entries.insert(ip.into(), country.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache to its file. No-op for a memory-only cache.
    pub fn save(&self) -> Result<(), LogscopeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.entries)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: tmp file → rename
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), entries = self.entries.len(), "geo cache: saved");
        Ok(())
    }
}
