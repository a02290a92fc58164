use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use errors::StorageError;
use parking_lot::Mutex;
use tn_core::LocalCache;
use tracing::warn;

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Cache persisted as a single JSON object on disk.
///
/// The file is read once on open. Every `set` rewrites it. An unreadable
/// file starts the cache empty rather than failing.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>
}

impl FileCache {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new()
        };
        Self {
            path,
            entries: Mutex::new(entries)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_failed = |reason: String| StorageError::WriteFailed {
            backend: "file-cache".to_string(),
            reason
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }
        let data = serde_json::to_string_pretty(entries).map_err(|e| {
            StorageError::SerializationError {
                error_type: "json".to_string(),
                reason: e.to_string()
            }
        })?;
        std::fs::write(&self.path, data).map_err(|e| write_failed(e.to_string()))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }
}
