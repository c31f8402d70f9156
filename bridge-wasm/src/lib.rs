//! WebAssembly Bridge Implementations
//!
//! Browser implementations of the bridge traits defined in `bridge-traits`,
//! built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to an empty crate on native targets.
//!
//! # Implementations
//!
//! - [`WasmMediaFactory`] / [`WasmAudioElement`]: `HTMLAudioElement` media element
//! - [`WebKeyValueStore`]: `localStorage` / `sessionStorage` key-value stores
//! - [`browser_storage_backends`]: both stores assembled into a `StorageBackends`
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{browser_storage_backends, WasmMediaFactory};
//! use std::sync::Arc;
//!
//! let factory = Arc::new(WasmMediaFactory);
//! let storage = browser_storage_backends();
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

mod error;
pub mod media;
pub mod storage;

pub use media::{WasmAudioElement, WasmMediaFactory};
pub use storage::{browser_storage_backends, WebKeyValueStore};
