//! Key-value storage for desktop hosts
//!
//! - [`FileKeyValueStore`]: persistent store backed by a JSON document in the
//!   application data directory (the desktop stand-in for `localStorage`).
//! - [`MemoryKeyValueStore`]: process-lifetime store (the stand-in for
//!   `sessionStorage`).

use bridge_traits::{
    error::{BridgeError, Result},
    storage::{KeyValueStore, StorageBackends},
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const STORE_FILE_NAME: &str = "storage.json";

/// JSON-file backed key-value store
///
/// The whole document is kept in memory and rewritten on every mutation.
/// Writes go to a temporary sibling file first and are renamed into place so
/// a crash never leaves a truncated document behind.
pub struct FileKeyValueStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open (or create) the store at `path`.
    ///
    /// A missing file starts an empty store. A corrupt file is logged and
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BridgeError::Io)?;
        }

        let items = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Discarding unreadable key-value store");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        debug!(path = ?path, entries = items.len(), "Opened key-value store");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Open the store inside the platform data directory
    /// (`~/.local/share/<app>/storage.json` on Linux).
    pub fn in_data_dir(app_name: &str) -> Result<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            BridgeError::NotAvailable("platform data directory".to_string())
        })?;
        Self::open(base.join(app_name).join(STORE_FILE_NAME))
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| BridgeError::OperationFailed(format!("Serialize store: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(BridgeError::Io)?;
        fs::rename(&tmp, &self.path).map_err(BridgeError::Io)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock();
        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&items) {
            // keep memory and disk in agreement
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }

        debug!(key = key, "Stored item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock();
        if items.remove(key).is_some() {
            self.persist(&items)?;
            debug!(key = key, "Removed item");
        }
        Ok(())
    }
}

/// In-memory key-value store
#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// Desktop storage set: a file store in the data directory for
/// [`StorageMode::Local`](bridge_traits::StorageMode::Local) and a memory
/// store for [`StorageMode::Session`](bridge_traits::StorageMode::Session).
///
/// When the data directory cannot be used the local slot stays empty and
/// persistence in local mode silently becomes a no-op.
pub fn desktop_storage_backends(app_name: &str) -> StorageBackends {
    let backends = StorageBackends::none().with_session(Arc::new(MemoryKeyValueStore::new()));

    match FileKeyValueStore::in_data_dir(app_name) {
        Ok(store) => backends.with_local(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "Persistent key-value store unavailable");
            backends
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("bridge-desktop-test-{}", Uuid::new_v4()))
            .join(STORE_FILE_NAME)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert!(store.is_empty());

        store.set_item("audio:progress:a.mp3", "42").unwrap();
        assert_eq!(
            store.get_item("audio:progress:a.mp3").unwrap(),
            Some("42".to_string())
        );
        assert_eq!(store.len(), 1);

        store.remove_item("audio:progress:a.mp3").unwrap();
        assert_eq!(store.get_item("audio:progress:a.mp3").unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = temp_store_path();

        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set_item("audio:progress:b.mp3", "17").unwrap();
            store.set_item("other", "x").unwrap();
            store.remove_item("other").unwrap();
        }

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("audio:progress:b.mp3").unwrap(),
            Some("17".to_string())
        );
        assert!(!reopened.has_item("other").unwrap());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_ignores_corrupt_document() {
        let path = temp_store_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get_item("anything").unwrap(), None);

        store.set_item("k", "v").unwrap();
        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("k").unwrap(), Some("v".to_string()));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
