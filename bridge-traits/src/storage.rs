//! Key-Value Storage Abstractions
//!
//! Provides the synchronous string key-value contract used for playback
//! progress, plus the selector that picks between the persistent and the
//! session-scoped backend.

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{error::Result, platform::PlatformSendSync};

/// String key-value storage trait
///
/// Abstracts Web-Storage-like backends:
/// - Web: `localStorage` / `sessionStorage`
/// - Desktop: JSON file in the app data directory, in-memory map
/// - Mobile: UserDefaults / SharedPreferences
///
/// Every operation may fail (quota exceeded, storage disabled by the user,
/// I/O errors). Callers decide whether a failure matters.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set_item("audio:progress:intro.mp3", "42")?;
///     Ok(())
/// }
/// ```
pub trait KeyValueStore: PlatformSendSync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

/// Which storage backend persisted values go to.
///
/// Deserializes from `"local"` / `"localStorage"`, `"session"` /
/// `"sessionStorage"`, `"disabled"`, or the boolean `false` (no storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Survives restarts (`localStorage`, app data file).
    #[default]
    Local,
    /// Lives as long as the session (`sessionStorage`, process memory).
    Session,
    /// Nothing is stored.
    Disabled,
}

const STORAGE_MODE_NAMES: &[&str] = &["local", "localStorage", "session", "sessionStorage", "disabled"];

impl<'de> Deserialize<'de> for StorageMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(StorageMode::Disabled),
            Repr::Flag(true) => Err(D::Error::invalid_value(
                Unexpected::Bool(true),
                &"a storage name or `false`",
            )),
            Repr::Name(name) => match name.as_str() {
                "local" | "localStorage" => Ok(StorageMode::Local),
                "session" | "sessionStorage" => Ok(StorageMode::Session),
                "disabled" => Ok(StorageMode::Disabled),
                other => Err(D::Error::unknown_variant(other, STORAGE_MODE_NAMES)),
            },
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => f.write_str("local"),
            StorageMode::Session => f.write_str("session"),
            StorageMode::Disabled => f.write_str("disabled"),
        }
    }
}

/// The key-value backends a host offers.
///
/// Either slot may be empty when the platform lacks that kind of storage;
/// [`StorageBackends::resolve`] then yields `None` and callers skip
/// persistence.
#[derive(Clone, Default)]
pub struct StorageBackends {
    pub local: Option<Arc<dyn KeyValueStore>>,
    pub session: Option<Arc<dyn KeyValueStore>>,
}

impl StorageBackends {
    /// A host without any storage.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn with_session(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session = Some(store);
        self
    }

    /// Backend for `mode`, if the host provides one.
    pub fn resolve(&self, mode: StorageMode) -> Option<Arc<dyn KeyValueStore>> {
        match mode {
            StorageMode::Local => self.local.clone(),
            StorageMode::Session => self.session.clone(),
            StorageMode::Disabled => None,
        }
    }

    /// Whether `mode` resolves to a backend.
    pub fn supports(&self, mode: StorageMode) -> bool {
        match mode {
            StorageMode::Local => self.local.is_some(),
            StorageMode::Session => self.session.is_some(),
            StorageMode::Disabled => true,
        }
    }
}

impl fmt::Debug for StorageBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBackends")
            .field("local", &self.local.as_ref().map(|_| "KeyValueStore { ... }"))
            .field(
                "session",
                &self.session.as_ref().map(|_| "KeyValueStore { ... }"),
            )
            .finish()
    }
}
