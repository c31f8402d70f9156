//! # Playback Module
//!
//! Application-wide audio playback built around a single shared media element.
//!
//! ## Overview
//!
//! This module handles:
//! - Lazily creating and owning the one media element (`manager`)
//! - The playback state snapshot and its listeners (`state`, `store`)
//! - Remembering the position per source (`progress`)
//! - Lifecycle callbacks for side effects (`fanout`)
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_traits::UnavailableMediaFactory;
//! use core_playback::{AudioManager, ManagerConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> core_playback::Result<()> {
//! let config = ManagerConfig::builder()
//!     .media_factory(Arc::new(UnavailableMediaFactory))
//!     .build()?;
//! let manager = AudioManager::from_config(config)?;
//!
//! let _subscription = manager.subscribe(|state| {
//!     println!("{:?} at {}s", state.phase(), state.current_time);
//! });
//! manager.set_source(Some("https://cdn.example.com/lesson-1.mp3"));
//! manager.seek(30.0);
//! # Ok(())
//! # }
//! ```

pub mod controls;
pub mod error;
pub mod fanout;
pub mod manager;
pub mod progress;
pub mod state;
pub mod store;
pub mod subscription;

pub use controls::AudioControls;
pub use error::{PlaybackError, Result};
pub use fanout::{AudioEventHandlers, EventFanout};
pub use manager::AudioManager;
pub use progress::ProgressStore;
pub use state::{PlaybackPhase, PlaybackState, StatePatch};
pub use store::StateStore;
pub use subscription::Subscription;

pub use core_runtime::config::{KeyBuilder, ManagerConfig, ProgressOptions, ProgressSettings};
pub use core_runtime::events::{EventBus, PlaybackEvent};
