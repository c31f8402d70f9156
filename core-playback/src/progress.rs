//! Progress persistence
//!
//! Remembers the playback position per source in a key-value backend so a
//! later visit can resume where the listener left off.
//!
//! - Keys default to `audio:progress:<src>`; a [`KeyBuilder`] can override them.
//! - Values are the floored position in whole seconds, as a decimal string.
//! - Non-forced writes are throttled by the configured interval.
//! - Storage failures are logged at debug level and otherwise ignored.

use crate::state::DEFAULT_PROGRESS_KEY_PREFIX;
use bridge_traits::{Clock, KeyValueStore, StorageBackends};
use core_runtime::config::{KeyBuilder, ProgressOptions, MAX_THROTTLE};
use core_runtime::logging::redact_source;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Storage key for `src`.
pub fn progress_key(key_builder: Option<&KeyBuilder>, src: &str) -> String {
    match key_builder {
        Some(builder) => builder.build(src),
        None => format!("{}{}", DEFAULT_PROGRESS_KEY_PREFIX, src),
    }
}

/// Parse a stored position. Anything that is not a finite number is ignored.
pub fn parse_progress(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

struct ThrottleGate {
    options: ProgressOptions,
    last_saved_at: Option<i64>,
}

/// Throttled reader/writer of playback positions.
pub struct ProgressStore {
    backends: StorageBackends,
    clock: Arc<dyn Clock>,
    gate: Mutex<ThrottleGate>,
}

impl ProgressStore {
    pub fn new(backends: StorageBackends, clock: Arc<dyn Clock>, options: ProgressOptions) -> Self {
        Self {
            backends,
            clock,
            gate: Mutex::new(ThrottleGate {
                options,
                last_saved_at: None,
            }),
        }
    }

    /// Replace the options wholesale. The throttle window keeps running.
    ///
    /// A throttle above [`MAX_THROTTLE`] is clamped to it.
    pub fn configure(&self, mut options: ProgressOptions) {
        if let Err(e) = options.validate() {
            warn!(error = %e, "Clamping progress throttle");
            options.throttle = MAX_THROTTLE;
        }
        debug!(
            enabled = options.enabled,
            storage = %options.storage,
            throttle_ms = options.throttle.as_millis() as u64,
            custom_keys = options.key_builder.is_some(),
            "Progress persistence configured"
        );
        self.gate.lock().options = options;
    }

    pub fn options(&self) -> ProgressOptions {
        self.gate.lock().options.clone()
    }

    /// Forget when the last write happened, so the next save goes through.
    pub fn reset_throttle(&self) {
        self.gate.lock().last_saved_at = None;
    }

    /// Whether positions would currently be read and written.
    pub fn is_available(&self) -> bool {
        self.backend(&self.options()).is_some()
    }

    pub fn build_key(&self, src: &str) -> String {
        let key_builder = self.gate.lock().options.key_builder.clone();
        progress_key(key_builder.as_ref(), src)
    }

    /// Write `position` for `src`.
    ///
    /// Skipped when persistence is off, `src` is missing, no backend exists
    /// for the storage mode, the position is not finite, or (unless `force`)
    /// the throttle interval has not elapsed since the previous write. The
    /// throttle window restarts before the write, so a failed write still
    /// counts. Returns whether the value was stored.
    pub fn save(&self, src: Option<&str>, position: f64, force: bool) -> bool {
        let Some(src) = src.filter(|src| !src.is_empty()) else {
            return false;
        };

        let options = self.options();
        let Some(store) = self.backend(&options) else {
            return false;
        };

        if !position.is_finite() {
            debug!(position, "Not persisting non-finite position");
            return false;
        }

        let now = self.clock.unix_timestamp_millis();
        {
            let mut gate = self.gate.lock();
            if !force {
                if let Some(last) = gate.last_saved_at {
                    let throttle_ms = i64::try_from(options.throttle.as_millis()).unwrap_or(i64::MAX);
                    if now.saturating_sub(last) < throttle_ms {
                        return false;
                    }
                }
            }
            gate.last_saved_at = Some(now);
        }

        let key = progress_key(options.key_builder.as_ref(), src);
        let value = (position.max(0.0).floor() as u64).to_string();

        match store.set_item(&key, &value) {
            Ok(()) => {
                trace!(src = %redact_source(src), seconds = %value, forced = force, "Saved playback progress");
                true
            }
            Err(e) => {
                debug!(src = %redact_source(src), error = %e, "Failed to save playback progress");
                false
            }
        }
    }

    /// Stored position for `src`, if there is a usable one.
    pub fn load(&self, src: &str) -> Option<f64> {
        let options = self.options();
        let store = self.backend(&options)?;
        let key = progress_key(options.key_builder.as_ref(), src);

        match store.get_item(&key) {
            Ok(Some(raw)) => {
                let position = parse_progress(&raw);
                if position.is_none() {
                    debug!(src = %redact_source(src), "Ignoring unreadable stored progress");
                }
                position
            }
            Ok(None) => None,
            Err(e) => {
                debug!(src = %redact_source(src), error = %e, "Failed to load playback progress");
                None
            }
        }
    }

    fn backend(&self, options: &ProgressOptions) -> Option<Arc<dyn KeyValueStore>> {
        if !options.enabled {
            return None;
        }
        self.backends.resolve(options.storage)
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gate = self.gate.lock();
        f.debug_struct("ProgressStore")
            .field("backends", &self.backends)
            .field("options", &gate.options)
            .field("last_saved_at", &gate.last_saved_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemoryKeyValueStore;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::{ManualClock, StorageMode};
    use std::time::Duration;

    mockall::mock! {
        Store {}

        impl KeyValueStore for Store {
            fn get_item(&self, key: &str) -> BridgeResult<Option<String>>;
            fn set_item(&self, key: &str, value: &str) -> BridgeResult<()>;
            fn remove_item(&self, key: &str) -> BridgeResult<()>;
        }
    }

    struct Fixture {
        local: Arc<MemoryKeyValueStore>,
        session: Arc<MemoryKeyValueStore>,
        clock: Arc<ManualClock>,
        progress: ProgressStore,
    }

    fn fixture(options: ProgressOptions) -> Fixture {
        let local = Arc::new(MemoryKeyValueStore::new());
        let session = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::default());
        let backends = StorageBackends::none()
            .with_local(local.clone())
            .with_session(session.clone());
        let progress = ProgressStore::new(backends, clock.clone(), options);
        Fixture {
            local,
            session,
            clock,
            progress,
        }
    }

    fn with_store(store: MockStore) -> ProgressStore {
        ProgressStore::new(
            StorageBackends::none().with_local(Arc::new(store)),
            Arc::new(ManualClock::default()),
            ProgressOptions::default(),
        )
    }

    #[test]
    fn test_default_and_custom_keys() {
        assert_eq!(progress_key(None, "a.mp3"), "audio:progress:a.mp3");

        let builder = KeyBuilder::new(|src: &str| format!("course-7:{}", src));
        assert_eq!(progress_key(Some(&builder), "a.mp3"), "course-7:a.mp3");

        let f = fixture(ProgressOptions::default().with_key_builder(builder));
        assert_eq!(f.progress.build_key("b.mp3"), "course-7:b.mp3");
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(parse_progress("42"), Some(42.0));
        assert_eq!(parse_progress(" 17.5 "), Some(17.5));
        assert_eq!(parse_progress(""), None);
        assert_eq!(parse_progress("abc"), None);
        assert_eq!(parse_progress("inf"), None);
        assert_eq!(parse_progress("NaN"), None);
    }

    #[test]
    fn test_save_floors_position() {
        let f = fixture(ProgressOptions::default());

        assert!(f.progress.save(Some("a.mp3"), 42.9, false));

        assert_eq!(
            f.local.get_item("audio:progress:a.mp3").unwrap(),
            Some("42".to_string())
        );
        assert_eq!(f.progress.load("a.mp3"), Some(42.0));
    }

    #[test]
    fn test_save_is_throttled_unless_forced() {
        let f = fixture(ProgressOptions::default());

        assert!(f.progress.save(Some("a.mp3"), 1.0, false));

        f.clock.advance(Duration::from_millis(1999));
        assert!(!f.progress.save(Some("a.mp3"), 3.0, false));
        assert_eq!(f.progress.load("a.mp3"), Some(1.0));

        assert!(f.progress.save(Some("a.mp3"), 4.0, true));
        assert_eq!(f.progress.load("a.mp3"), Some(4.0));

        // The forced write restarted the window.
        f.clock.advance(Duration::from_millis(1000));
        assert!(!f.progress.save(Some("a.mp3"), 5.0, false));

        f.clock.advance(Duration::from_millis(1000));
        assert!(f.progress.save(Some("a.mp3"), 6.0, false));
        assert_eq!(f.progress.load("a.mp3"), Some(6.0));
    }

    #[test]
    fn test_reset_throttle_allows_next_save() {
        let f = fixture(ProgressOptions::default());

        assert!(f.progress.save(Some("a.mp3"), 1.0, false));
        assert!(!f.progress.save(Some("a.mp3"), 2.0, false));

        f.progress.reset_throttle();
        assert!(f.progress.save(Some("a.mp3"), 2.0, false));
    }

    #[test]
    fn test_save_skips_without_source_or_when_disabled() {
        let f = fixture(ProgressOptions::default());
        assert!(!f.progress.save(None, 10.0, true));
        assert!(!f.progress.save(Some(""), 10.0, true));
        assert!(!f.progress.save(Some("a.mp3"), f64::NAN, true));

        f.progress.configure(ProgressOptions::disabled());
        assert!(!f.progress.save(Some("a.mp3"), 10.0, true));
        assert_eq!(f.progress.load("a.mp3"), None);

        f.progress
            .configure(ProgressOptions::default().with_storage(StorageMode::Disabled));
        assert!(!f.progress.save(Some("a.mp3"), 10.0, true));
        assert!(!f.progress.is_available());

        assert!(f.local.is_empty());
    }

    #[test]
    fn test_session_mode_uses_session_backend() {
        let f = fixture(ProgressOptions::default().with_storage(StorageMode::Session));

        assert!(f.progress.save(Some("a.mp3"), 8.0, true));

        assert!(f.local.is_empty());
        assert_eq!(
            f.session.get_item("audio:progress:a.mp3").unwrap(),
            Some("8".to_string())
        );
    }

    #[test]
    fn test_missing_backend_is_a_no_op() {
        let progress = ProgressStore::new(
            StorageBackends::none(),
            Arc::new(ManualClock::default()),
            ProgressOptions::default(),
        );

        assert!(!progress.is_available());
        assert!(!progress.save(Some("a.mp3"), 8.0, true));
        assert_eq!(progress.load("a.mp3"), None);
    }

    #[test]
    fn test_configure_clamps_throttle() {
        let f = fixture(ProgressOptions::default());

        f.progress
            .configure(ProgressOptions::default().with_throttle(Duration::from_secs(2 * 60 * 60)));

        let options = f.progress.options();
        assert_eq!(options.throttle, MAX_THROTTLE);
        assert!(options.validate().is_ok());

        // The clamped window still throttles.
        assert!(f.progress.save(Some("a.mp3"), 1.0, false));
        f.clock.advance(MAX_THROTTLE - Duration::from_millis(1));
        assert!(!f.progress.save(Some("a.mp3"), 2.0, false));
        f.clock.advance(Duration::from_millis(1));
        assert!(f.progress.save(Some("a.mp3"), 3.0, false));
    }

    #[test]
    fn test_configure_replaces_key_builder() {
        let f = fixture(
            ProgressOptions::default()
                .with_key_builder(KeyBuilder::new(|src: &str| format!("custom:{}", src))),
        );

        f.progress.configure(ProgressOptions::default());

        assert_eq!(f.progress.build_key("a.mp3"), "audio:progress:a.mp3");
    }

    #[test]
    fn test_write_failure_is_swallowed_and_still_throttles() {
        let mut store = MockStore::new();
        store
            .expect_set_item()
            .times(1)
            .returning(|_, _| Err(BridgeError::QuotaExceeded("storage full".to_string())));

        let progress = with_store(store);

        assert!(!progress.save(Some("a.mp3"), 30.0, false));
        // Still inside the window opened by the failed attempt.
        assert!(!progress.save(Some("a.mp3"), 31.0, false));
    }

    #[test]
    fn test_read_failure_is_treated_as_missing() {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .times(1)
            .returning(|_| Err(BridgeError::NotAvailable("storage blocked".to_string())));

        let progress = with_store(store);

        assert_eq!(progress.load("a.mp3"), None);
    }

    #[test]
    fn test_unreadable_value_is_ignored() {
        let f = fixture(ProgressOptions::default());
        f.local.set_item("audio:progress:a.mp3", "twelve").unwrap();
        f.local.set_item("audio:progress:b.mp3", "").unwrap();

        assert_eq!(f.progress.load("a.mp3"), None);
        assert_eq!(f.progress.load("b.mp3"), None);
    }
}
