//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` using a JSON document in the platform data directory
//!   ([`FileKeyValueStore`])
//! - `KeyValueStore` kept in process memory ([`MemoryKeyValueStore`])
//! - [`desktop_storage_backends`] assembling both into a
//!   [`StorageBackends`](bridge_traits::StorageBackends) set
//!
//! Desktop hosts bring their own media element (a native player or an
//! embedded web view); this crate does not ship one.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::desktop_storage_backends;
//! use bridge_traits::StorageMode;
//!
//! let backends = desktop_storage_backends("global-audio");
//! let store = backends.resolve(StorageMode::Local);
//! ```

mod storage;

pub use storage::{desktop_storage_backends, FileKeyValueStore, MemoryKeyValueStore};
