//! Web Storage implementations of the key-value bridge.
//!
//! `localStorage` backs [`StorageMode::Local`](bridge_traits::StorageMode::Local)
//! and `sessionStorage` backs
//! [`StorageMode::Session`](bridge_traits::StorageMode::Session). Either may be
//! missing (disabled cookies, sandboxed iframes); the corresponding slot of
//! [`browser_storage_backends`] is then left empty.

use std::sync::Arc;

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::{KeyValueStore, StorageBackends},
};
use tracing::debug;

use crate::error::js_error;

#[derive(Clone)]
/// Key-value store over a browser `Storage` object.
pub struct WebKeyValueStore {
    storage: web_sys::Storage,
}

impl WebKeyValueStore {
    /// Store over `window.localStorage`.
    pub fn local() -> BridgeResult<Self> {
        let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|err| js_error("localStorage", err))?
            .ok_or_else(|| BridgeError::NotAvailable("localStorage".into()))?;
        Ok(Self { storage })
    }

    /// Store over `window.sessionStorage`.
    pub fn session() -> BridgeResult<Self> {
        let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
        let storage = window
            .session_storage()
            .map_err(|err| js_error("sessionStorage", err))?
            .ok_or_else(|| BridgeError::NotAvailable("sessionStorage".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for WebKeyValueStore {
    fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|err| js_error("get_item", err))
    }

    fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|err| js_error("set_item", err))
    }

    fn remove_item(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|err| js_error("remove_item", err))
    }
}

/// Both browser storages, skipping whichever is unavailable.
pub fn browser_storage_backends() -> StorageBackends {
    let mut backends = StorageBackends::none();

    match WebKeyValueStore::local() {
        Ok(store) => backends = backends.with_local(Arc::new(store)),
        Err(err) => debug!(error = %err, "localStorage unavailable"),
    }
    match WebKeyValueStore::session() {
        Ok(store) => backends = backends.with_session(Arc::new(store)),
        Err(err) => debug!(error = %err, "sessionStorage unavailable"),
    }

    backends
}
