//! Audio service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (media element
//! factory, key-value storage, clock) into the shared audio manager. Desktop
//! apps typically enable the `desktop-shims` feature (file-backed progress
//! storage from `bridge-desktop`) and supply their own media factory, whereas
//! WebAssembly builds enable the `wasm` feature and rely on the
//! `HTMLAudioElement` and Web Storage adapters from `bridge-wasm`.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{Clock, MediaElementFactory, StorageBackends, SystemClock};
use core_playback::{AudioControls, AudioManager};
use core_runtime::config::{ManagerConfig, ProgressOptions, ProgressSettings};
use core_runtime::events::EventBus;
use tracing::info;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_wasm::{browser_storage_backends, WasmMediaFactory};

/// Aggregated handle to all bridge dependencies the audio manager requires.
#[derive(Clone)]
pub struct AudioDependencies {
    pub media_factory: Arc<dyn MediaElementFactory>,
    pub storage: StorageBackends,
    pub clock: Arc<dyn Clock>,
}

impl AudioDependencies {
    /// Construct a dependency bundle from explicit bridge handles, using the
    /// system clock.
    pub fn new(media_factory: Arc<dyn MediaElementFactory>, storage: StorageBackends) -> Self {
        Self {
            media_factory,
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// `media_factory` plus the file-backed desktop stores for `app_name`.
    #[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
    pub fn desktop(media_factory: Arc<dyn MediaElementFactory>, app_name: &str) -> Self {
        Self::new(
            media_factory,
            bridge_desktop::desktop_storage_backends(app_name),
        )
    }

    /// `HTMLAudioElement` playback with `localStorage`/`sessionStorage`.
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    pub fn browser() -> Self {
        Self::new(Arc::new(WasmMediaFactory), browser_storage_backends())
    }
}

impl std::fmt::Debug for AudioDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDependencies")
            .field("media_factory", &"MediaElementFactory { ... }")
            .field("storage", &self.storage)
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

/// Build a manager from `deps` with the given persistence options.
pub fn build_audio_manager(
    deps: &AudioDependencies,
    progress: ProgressOptions,
    event_bus: Option<EventBus>,
) -> Result<AudioManager> {
    let mut builder = ManagerConfig::builder()
        .media_factory(Arc::clone(&deps.media_factory))
        .storage(deps.storage.clone())
        .clock(Arc::clone(&deps.clock))
        .progress(progress);
    if let Some(bus) = event_bus {
        builder = builder.event_bus(bus);
    }

    let manager = AudioManager::from_config(builder.build()?)?;
    Ok(manager)
}

/// Primary façade exposed to host applications.
///
/// Owns the one [`AudioManager`] of the application and the bus its
/// lifecycle events are republished on.
#[derive(Clone)]
pub struct AudioService {
    deps: Arc<AudioDependencies>,
    manager: AudioManager,
    events: EventBus,
}

impl AudioService {
    /// Create a new service from the provided dependencies.
    pub fn new(deps: AudioDependencies, progress: ProgressOptions) -> Result<Self> {
        let events = EventBus::default();
        let manager = build_audio_manager(&deps, progress, Some(events.clone()))?;
        info!(storage = ?deps.storage, "Audio service ready");
        Ok(Self {
            deps: Arc::new(deps),
            manager,
            events,
        })
    }

    /// Create a service whose persistence options come from a JSON document
    /// such as `{"rememberProgress": true, "storage": "sessionStorage"}`.
    pub fn from_settings_json(deps: AudioDependencies, json: &str) -> Result<Self> {
        let settings = ProgressSettings::from_json_str(json)?;
        Self::new(deps, settings.into())
    }

    pub fn manager(&self) -> &AudioManager {
        &self.manager
    }

    pub fn controls(&self) -> AudioControls {
        self.manager.controls()
    }

    /// Bus carrying every playback lifecycle event.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<AudioDependencies> {
        Arc::clone(&self.deps)
    }

    /// Release the media element. The service stays usable.
    pub fn shutdown(&self) {
        self.manager.dispose();
    }
}

impl std::fmt::Debug for AudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioService")
            .field("manager", &self.manager)
            .field("events", &self.events)
            .finish()
    }
}

/// Convenience bootstrapper for WebAssembly hosts.
///
/// ```
/// # #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
/// # fn example() -> core_service::Result<()> {
/// use core_service::bootstrap_wasm;
/// use core_runtime::config::ProgressOptions;
///
/// let audio = bootstrap_wasm(ProgressOptions::default())?;
/// audio.manager().set_source(Some("/lessons/intro.mp3"));
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn bootstrap_wasm(progress: ProgressOptions) -> Result<AudioService> {
    AudioService::new(AudioDependencies::browser(), progress)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))
}
