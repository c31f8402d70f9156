//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the audio core and platform-specific
//! implementations. Each trait represents a capability that the core requires but
//! that must be implemented differently per platform (desktop, web, mobile).
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaElement`](playback::MediaElement) - The single native audio primitive
//! - [`MediaElementFactory`](playback::MediaElementFactory) - Lazily creates media elements
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - String key-value persistence
//!   (localStorage, sessionStorage, app data files)
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Media element | Key-value stores |
//! |----------|---------------------|---------------|------------------|
//! | Desktop  | `bridge-desktop`    | host supplied | file + memory    |
//! | Web      | `bridge-wasm`       | `HTMLAudioElement` | `localStorage` + `sessionStorage` |
//!
//! ## Missing Capabilities
//!
//! A host that cannot play audio (server-side rendering, CLI tooling) reports
//! [`BridgeError::NotAvailable`](error::BridgeError::NotAvailable) from its
//! factory. The core treats that as a valid no-op target instead of an error:
//!
//! ```ignore
//! match factory.create(sink) {
//!     Ok(element) => Some(element),
//!     Err(err) if err.is_not_available() => None,
//!     Err(err) => {
//!         tracing::debug!(error = %err, "media element creation failed");
//!         None
//!     }
//! }
//! ```
//!
//! ## Thread Safety
//!
//! On native targets all bridge traits require `Send + Sync` (through
//! [`PlatformSendSync`](platform::PlatformSendSync)). On `wasm32` the bound is
//! dropped so browser handles can be wrapped directly.

pub mod error;
pub mod platform;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use playback::{
    MediaElement, MediaElementFactory, MediaEvent, MediaEventSink, MediaHandleId,
    UnavailableMediaFactory,
};
pub use storage::{KeyValueStore, StorageBackends, StorageMode};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
