//! Application-wide audio playback.
//!
//! This crate re-exports the workspace crates behind one dependency and maps
//! the documented features (`desktop-shims`, `wasm`) onto them, so host
//! applications do not need to wire each crate individually.
//!
//! ```no_run
//! use global_audio::bridge::UnavailableMediaFactory;
//! use global_audio::{AudioDependencies, AudioService, ProgressOptions};
//! use std::sync::Arc;
//!
//! # fn main() -> global_audio::service::Result<()> {
//! let deps = AudioDependencies::new(
//!     Arc::new(UnavailableMediaFactory),
//!     global_audio::bridge::StorageBackends::none(),
//! );
//! let audio = AudioService::new(deps, ProgressOptions::default())?;
//! audio.controls().set_source(Some("https://cdn.example.com/episode-12.mp3"));
//! # Ok(())
//! # }
//! ```

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;
pub use core_service as service;

pub use core_playback::{
    AudioControls, AudioEventHandlers, AudioManager, KeyBuilder, PlaybackEvent, PlaybackPhase,
    PlaybackState, ProgressOptions, Subscription,
};
pub use core_runtime::logging::{init_logging, LoggingConfig};
pub use core_service::{build_audio_manager, AudioDependencies, AudioService};
