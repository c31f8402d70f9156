//! # Manager Configuration
//!
//! Collects the host capabilities and progress-persistence options an audio
//! manager is built from.
//!
//! ## Overview
//!
//! [`ManagerConfig::builder`] gathers every dependency and validates it once,
//! up front, so the running manager never has to deal with missing pieces:
//!
//! - `MediaElementFactory` - required; produces the single playback element
//! - `StorageBackends` - optional; where progress is written
//! - `Clock` - optional; defaults to [`SystemClock`]
//! - `ProgressOptions` - optional; defaults to [`ProgressOptions::default`]
//! - `EventBus` - optional; receives every playback lifecycle event
//!
//! When the `desktop-shims` feature is enabled and no storage is provided, a
//! file-backed local store in the platform data directory and an in-memory
//! session store are injected automatically.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ManagerConfig, ProgressOptions};
//! use bridge_traits::StorageMode;
//! use std::sync::Arc;
//!
//! let config = ManagerConfig::builder()
//!     .media_factory(Arc::new(MyFactory))
//!     .progress(ProgressOptions::default().with_storage(StorageMode::Session))
//!     .build()?;
//! ```
//!
//! ## Loading progress options from JSON
//!
//! Hosts that keep settings in a file can deserialize [`ProgressSettings`]:
//!
//! ```
//! use core_runtime::config::ProgressSettings;
//! use bridge_traits::StorageMode;
//!
//! let settings = ProgressSettings::from_json_str(r#"{ "storage": "session" }"#).unwrap();
//! assert!(settings.enabled);
//! assert_eq!(settings.storage, StorageMode::Session);
//! assert_eq!(settings.throttle_ms, 2000);
//! ```

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{
    platform::PlatformSendSync, Clock, MediaElementFactory, StorageBackends, StorageMode,
    SystemClock,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Minimum interval between two non-forced progress writes.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(2000);

/// Largest accepted throttle interval.
pub const MAX_THROTTLE: Duration = Duration::from_secs(60 * 60);

/// Application name used for the desktop data directory.
pub const DEFAULT_APP_NAME: &str = "global-audio";

// ============================================================================
// Progress options
// ============================================================================

/// Callback bound used by [`KeyBuilder`].
pub trait KeyBuilderFn: Fn(&str) -> String + PlatformSendSync {}

impl<F> KeyBuilderFn for F where F: Fn(&str) -> String + PlatformSendSync {}

/// Derives the storage key for a media source.
///
/// ```
/// use core_runtime::config::KeyBuilder;
///
/// let keys = KeyBuilder::new(|src| format!("podcast:{}", src));
/// assert_eq!(keys.build("ep1.mp3"), "podcast:ep1.mp3");
/// ```
#[derive(Clone)]
pub struct KeyBuilder(Arc<dyn KeyBuilderFn>);

impl KeyBuilder {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&str) -> String + PlatformSendSync + 'static,
    {
        Self(Arc::new(build))
    }

    pub fn build(&self, src: &str) -> String {
        (self.0)(src)
    }
}

impl fmt::Debug for KeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyBuilder { .. }")
    }
}

/// Progress persistence options.
///
/// Applied wholesale: every `configure` call replaces the previous value, and
/// fields left at their defaults here are defaults there too.
#[derive(Debug, Clone)]
pub struct ProgressOptions {
    /// Whether playback positions are saved and restored.
    pub enabled: bool,
    /// Which backend positions go to.
    pub storage: StorageMode,
    /// Minimum interval between two non-forced writes.
    pub throttle: Duration,
    /// Custom key derivation; `None` uses `audio:progress:<src>`.
    pub key_builder: Option<KeyBuilder>,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            storage: StorageMode::default(),
            throttle: DEFAULT_THROTTLE,
            key_builder: None,
        }
    }
}

impl ProgressOptions {
    /// Options with persistence switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_key_builder(mut self, key_builder: KeyBuilder) -> Self {
        self.key_builder = Some(key_builder);
        self
    }

    /// Whether positions can actually be written with these options.
    pub fn is_active(&self) -> bool {
        self.enabled && self.storage != StorageMode::Disabled
    }

    /// Checks the throttle bound.
    pub fn validate(&self) -> Result<()> {
        if self.throttle > MAX_THROTTLE {
            return Err(Error::Config(format!(
                "Progress throttle of {}ms exceeds maximum of {}ms",
                self.throttle.as_millis(),
                MAX_THROTTLE.as_millis()
            )));
        }
        Ok(())
    }
}

/// Serialisable subset of [`ProgressOptions`].
///
/// Field names also accept the camelCase spellings used by web front ends
/// (`rememberProgress`, `throttleMs`, `"localStorage"`), and `"storage": false`
/// turns storage off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSettings {
    #[serde(default = "default_enabled", alias = "rememberProgress")]
    pub enabled: bool,

    #[serde(default)]
    pub storage: StorageMode,

    #[serde(default = "default_throttle_ms", alias = "throttleMs")]
    pub throttle_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE.as_millis() as u64
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            storage: StorageMode::default(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl ProgressSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid progress settings: {}", e)))?;
        settings.to_options().validate()?;
        Ok(settings)
    }

    /// Runtime options for these settings (no custom key builder).
    pub fn to_options(&self) -> ProgressOptions {
        ProgressOptions {
            enabled: self.enabled,
            storage: self.storage,
            throttle: Duration::from_millis(self.throttle_ms),
            key_builder: None,
        }
    }
}

impl From<ProgressSettings> for ProgressOptions {
    fn from(settings: ProgressSettings) -> Self {
        settings.to_options()
    }
}

// ============================================================================
// Manager configuration
// ============================================================================

/// Everything an audio manager is built from.
///
/// Use [`ManagerConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ManagerConfig {
    /// Creates the playback element on first use (required)
    pub media_factory: Arc<dyn MediaElementFactory>,

    /// Key-value backends for progress persistence
    pub storage: StorageBackends,

    /// Time source for the write throttle
    pub clock: Arc<dyn Clock>,

    /// Initial progress persistence options
    pub progress: ProgressOptions,

    /// Bus that receives every playback lifecycle event (optional)
    pub event_bus: Option<EventBus>,
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("media_factory", &"MediaElementFactory { ... }")
            .field("storage", &self.storage)
            .field("clock", &"Clock { ... }")
            .field("progress", &self.progress)
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

impl ManagerConfig {
    /// Creates a new builder for constructing a `ManagerConfig`.
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// A storage mode without a matching backend is accepted: persistence
    /// then silently does nothing.
    pub fn validate(&self) -> Result<()> {
        self.progress.validate()?;

        if self.progress.is_active() && !self.storage.supports(self.progress.storage) {
            debug!(
                storage = %self.progress.storage,
                "No backend for the configured storage mode; progress will not be persisted"
            );
        }

        Ok(())
    }
}

fn media_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaElementFactory".to_string(),
        message: "A MediaElementFactory is required to create the playback element. \
                 Web: use bridge_wasm::WasmMediaFactory. \
                 Server-side rendering or headless hosts: use bridge_traits::UnavailableMediaFactory \
                 to get a manager whose operations are no-ops."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_storage(app_name: &str) -> StorageBackends {
    bridge_desktop::desktop_storage_backends(app_name)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_storage(_app_name: &str) -> StorageBackends {
    StorageBackends::none()
}

/// Builder for constructing [`ManagerConfig`] instances.
#[derive(Default)]
pub struct ManagerConfigBuilder {
    media_factory: Option<Arc<dyn MediaElementFactory>>,
    storage: Option<StorageBackends>,
    clock: Option<Arc<dyn Clock>>,
    progress: Option<ProgressOptions>,
    event_bus: Option<EventBus>,
    app_name: Option<String>,
}

impl ManagerConfigBuilder {
    /// Sets the media element factory (required).
    pub fn media_factory(mut self, factory: Arc<dyn MediaElementFactory>) -> Self {
        self.media_factory = Some(factory);
        self
    }

    /// Sets the storage backends.
    ///
    /// If not provided, the desktop defaults are used when the
    /// `desktop-shims` feature is enabled; otherwise no storage is available.
    pub fn storage(mut self, storage: StorageBackends) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the clock. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the initial progress options.
    pub fn progress(mut self, progress: ProgressOptions) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Publishes playback events on `bus`.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Directory name for the desktop default storage.
    ///
    /// Default: `global-audio`
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if no media factory was provided
    /// - [`Error::Config`] if the progress options are out of range
    pub fn build(self) -> Result<ManagerConfig> {
        let media_factory = self.media_factory.ok_or_else(media_factory_missing_error)?;

        let storage = match self.storage {
            Some(storage) => storage,
            None => {
                let app_name = self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME);
                provide_default_storage(app_name)
            }
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let config = ManagerConfig {
            media_factory,
            storage,
            clock,
            progress: self.progress.unwrap_or_default(),
            event_bus: self.event_bus,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{ManualClock, UnavailableMediaFactory};

    fn factory() -> Arc<dyn MediaElementFactory> {
        Arc::new(UnavailableMediaFactory)
    }

    #[test]
    fn test_missing_media_factory() {
        let err = ManagerConfig::builder().build().unwrap_err();
        assert_eq!(err.missing_capability(), Some("MediaElementFactory"));
        assert!(err.to_string().contains("UnavailableMediaFactory"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = ManagerConfig::builder()
            .media_factory(factory())
            .storage(StorageBackends::none())
            .build()
            .unwrap();

        assert!(config.progress.enabled);
        assert_eq!(config.progress.storage, StorageMode::Local);
        assert_eq!(config.progress.throttle, DEFAULT_THROTTLE);
        assert!(config.progress.key_builder.is_none());
        assert!(config.event_bus.is_none());
        assert!(config.clock.unix_timestamp() > 0);
    }

    #[test]
    fn test_builder_overrides() {
        let clock = Arc::new(ManualClock::default());
        let config = ManagerConfig::builder()
            .media_factory(factory())
            .storage(StorageBackends::none())
            .clock(clock)
            .progress(ProgressOptions::disabled())
            .event_bus(EventBus::new(8))
            .build()
            .unwrap();

        assert!(!config.progress.enabled);
        assert_eq!(config.clock.unix_timestamp_millis(), 0);
        assert!(config.event_bus.is_some());
    }

    #[test]
    fn test_throttle_upper_bound() {
        let result = ManagerConfig::builder()
            .media_factory(factory())
            .storage(StorageBackends::none())
            .progress(ProgressOptions::default().with_throttle(Duration::from_secs(2 * 60 * 60)))
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_storage_without_backend_is_accepted() {
        let config = ManagerConfig::builder()
            .media_factory(factory())
            .storage(StorageBackends::none())
            .progress(ProgressOptions::default().with_storage(StorageMode::Session))
            .build();

        assert!(config.is_ok());
    }

    #[test]
    fn test_progress_options_activity() {
        assert!(ProgressOptions::default().is_active());
        assert!(!ProgressOptions::disabled().is_active());
        assert!(!ProgressOptions::default()
            .with_storage(StorageMode::Disabled)
            .is_active());
    }

    #[test]
    fn test_key_builder() {
        let options = ProgressOptions::default()
            .with_key_builder(KeyBuilder::new(|src: &str| format!("lesson:{}", src.len())));
        let builder = options.key_builder.unwrap();
        assert_eq!(builder.build("abc"), "lesson:3");
    }

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings = ProgressSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, ProgressSettings::default());

        let options: ProgressOptions = settings.into();
        assert!(options.enabled);
        assert_eq!(options.throttle, Duration::from_millis(2000));
    }

    #[test]
    fn test_settings_accept_web_spelling() {
        let settings = ProgressSettings::from_json_str(
            r#"{ "rememberProgress": false, "storage": "sessionStorage", "throttleMs": 500 }"#,
        )
        .unwrap();

        assert!(!settings.enabled);
        assert_eq!(settings.storage, StorageMode::Session);
        assert_eq!(settings.throttle_ms, 500);
    }

    #[test]
    fn test_settings_accept_false_storage() {
        let settings = ProgressSettings::from_json_str(
            r#"{ "rememberProgress": true, "storage": false }"#,
        )
        .unwrap();

        assert!(settings.enabled);
        assert_eq!(settings.storage, StorageMode::Disabled);
        assert!(!settings.to_options().is_active());

        assert!(matches!(
            ProgressSettings::from_json_str(r#"{ "storage": true }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_settings_rejects_invalid_json() {
        assert!(matches!(
            ProgressSettings::from_json_str(r#"{ "storage": "cookies" }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ProgressSettings::from_json_str(r#"{ "throttle_ms": 7200000 }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_settings_serialize() {
        let json = serde_json::to_string(&ProgressSettings::default()).unwrap();
        assert_eq!(json, r#"{"enabled":true,"storage":"local","throttle_ms":2000}"#);
    }

    #[test]
    fn test_config_debug_hides_capabilities() {
        let config = ManagerConfig::builder()
            .media_factory(factory())
            .storage(StorageBackends::none())
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("MediaElementFactory { ... }"));
        assert!(debug.contains("Clock { ... }"));
    }
}
