//! Key-value persistence
//!
//! Persisted state (rated folder identity, rating-playlist mapping, user
//! settings) is opaque to the store beyond get/set by string key. Two backends
//! are provided: [`MemoryStore`] for ephemeral sessions and [`JsonFileStore`],
//! which keeps every key in one JSON object on disk.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// String key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object file
///
/// The whole object is cached in memory and rewritten on every change through a
/// temporary file and rename, so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// File name used inside a data folder
    pub const FILE_NAME: &'static str = "starshelf.json";

    /// Open (or start) the store at `path`
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is an
    /// error: silently discarding it would drop the rating-playlist mapping.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store file inside a data folder, creating the folder if needed
    pub fn open_in(data_folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_folder)?;
        Self::open(data_folder.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            warn!("Failed to replace {}: {}", self.path.display(), e);
            Error::Store(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open_in(dir.path()).unwrap();
            store.set("rated_folder_uri", "folder:abc").unwrap();
            store.set("playlist_uris", r#"{"4.0":"playlist:1"}"#).unwrap();
        }

        let store = JsonFileStore::open_in(dir.path()).unwrap();
        assert_eq!(store.get("rated_folder_uri").unwrap(), Some("folder:abc".to_string()));
        assert_eq!(
            store.get("playlist_uris").unwrap(),
            Some(r#"{"4.0":"playlist:1"}"#.to_string())
        );
        assert!(!dir.path().join("starshelf.json.tmp").exists());
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JsonFileStore::FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_json_store_empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JsonFileStore::FILE_NAME);
        std::fs::write(&path, "").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }
}
