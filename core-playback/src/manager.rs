//! # Audio Manager
//!
//! One shared media element for the whole application, a state snapshot every
//! UI component renders from, per-source progress persistence and a lifecycle
//! event fan-out.
//!
//! ## Element lifecycle
//!
//! The element is created lazily by the first operation that needs it. If the
//! host has no media capability the factory reports
//! [`BridgeError::NotAvailable`](bridge_traits::error::BridgeError::NotAvailable)
//! and every operation quietly does nothing. [`AudioManager::dispose`] detaches
//! and drops the element; the next operation creates a fresh one.
//!
//! ## Locking
//!
//! No internal lock is held while the element, state listeners, event handlers,
//! key builders or storage backends run. Any of them may call back into the
//! manager.

use crate::controls::AudioControls;
use crate::error::Result;
use crate::fanout::{AudioEventHandlers, EventFanout};
use crate::progress::ProgressStore;
use crate::state::{clamp_rate, clamp_volume, finite_seconds, PlaybackState, StatePatch, AUDIO_ERROR};
use crate::store::StateStore;
use crate::subscription::Subscription;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::platform::PlatformSendSync;
use bridge_traits::{MediaElement, MediaElementFactory, MediaEvent, MediaEventSink, MediaHandleId};
use core_runtime::config::{ManagerConfig, ProgressOptions};
use core_runtime::events::PlaybackEvent;
use core_runtime::logging::redact_source;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

/// The element currently owned by the manager.
struct MediaSlot {
    element: Option<Arc<dyn MediaElement>>,
    /// Bumped on dispose so events from a detached element are ignored.
    generation: u64,
    /// Seek requested before the duration was known.
    pending_seek: Option<f64>,
}

struct Inner {
    factory: Arc<dyn MediaElementFactory>,
    store: StateStore,
    progress: ProgressStore,
    fanout: EventFanout,
    slot: Mutex<MediaSlot>,
}

/// Shared audio playback service.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct AudioManager {
    inner: Arc<Inner>,
}

impl AudioManager {
    /// Build a manager from a validated configuration.
    ///
    /// When the configuration carries an event bus, every lifecycle event is
    /// also republished there.
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        config.validate()?;

        let ManagerConfig {
            media_factory,
            storage,
            clock,
            progress,
            event_bus,
        } = config;

        let manager = Self {
            inner: Arc::new(Inner {
                factory: media_factory,
                store: StateStore::new(),
                progress: ProgressStore::new(storage, clock, progress),
                fanout: EventFanout::new(),
                slot: Mutex::new(MediaSlot {
                    element: None,
                    generation: 0,
                    pending_seek: None,
                }),
            }),
        };

        if let Some(bus) = event_bus {
            // Lives as long as the manager.
            let _ = manager.subscribe_events(AudioEventHandlers::forward_to(bus));
        }

        debug!("Audio manager created");
        Ok(manager)
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Current state snapshot.
    pub fn snapshot(&self) -> Arc<PlaybackState> {
        self.inner.store.snapshot()
    }

    /// Register a listener called with every new snapshot.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Arc<PlaybackState>) + PlatformSendSync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    /// Register a set of lifecycle callbacks.
    pub fn subscribe_events(&self, handlers: AudioEventHandlers) -> Subscription {
        self.inner.fanout.subscribe(handlers)
    }

    /// The media element, created on demand. `None` on hosts without audio.
    pub fn element(&self) -> Option<Arc<dyn MediaElement>> {
        self.inner.ensure()
    }

    pub fn element_id(&self) -> Option<MediaHandleId> {
        self.element().map(|element| element.id())
    }

    /// Handle exposing only the playback controls.
    pub fn controls(&self) -> AudioControls {
        AudioControls::new(self.clone())
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replace the progress persistence options wholesale.
    ///
    /// A throttle above the maximum [`ManagerConfig`] accepts is clamped to it.
    pub fn configure(&self, options: ProgressOptions) {
        self.inner.progress.configure(options);
    }

    pub fn progress_options(&self) -> ProgressOptions {
        self.inner.progress.options()
    }

    /// Storage key progress for `src` is saved under.
    pub fn progress_key(&self, src: &str) -> String {
        self.inner.progress.build_key(src)
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Switch the element to `src`, or unload it with `None`.
    ///
    /// An empty string unloads too. Switching to the current source does
    /// nothing. A saved position for the new source is applied once its
    /// duration is known.
    pub fn set_source(&self, src: Option<&str>) {
        let Some(element) = self.inner.ensure() else {
            return;
        };

        match src.filter(|src| !src.is_empty()) {
            None => {
                log_failure(element.pause(), "pause");
                log_failure(element.clear_source(), "clear source");
                log_failure(element.load(), "load");
                self.inner.slot.lock().pending_seek = None;
                self.inner.store.reset();
                debug!("Media source cleared");
            }
            Some(src) => {
                if self.inner.store.snapshot().src.as_deref() == Some(src) {
                    return;
                }

                log_failure(element.pause(), "pause");
                log_failure(element.set_source(src), "set source");
                log_failure(element.load(), "load");

                let resume_at = self.inner.progress.load(src);
                self.inner.slot.lock().pending_seek = resume_at;

                self.inner.store.replace(PlaybackState {
                    src: Some(src.to_string()),
                    is_playing: false,
                    current_time: 0.0,
                    duration: 0.0,
                    volume: clamp_volume(element.volume()),
                    rate: clamp_rate(element.playback_rate()),
                    is_ready: false,
                    error: None,
                });
                debug!(src = %redact_source(src), resume_at = ?resume_at, "Media source changed");
            }
        }
    }

    /// Start playback, switching to `src` first when given.
    ///
    /// A rejected start (autoplay policy, unsupported media) is logged and
    /// swallowed; the state follows whatever the element reports.
    pub async fn play(&self, src: Option<&str>) {
        if let Some(src) = src.filter(|src| !src.is_empty()) {
            self.set_source(Some(src));
        }

        let Some(element) = self.inner.ensure() else {
            return;
        };

        if let Err(e) = element.play().await {
            debug!(error = %e, "Playback request rejected");
        }
    }

    pub fn pause(&self) {
        if let Some(element) = self.inner.ensure() {
            log_failure(element.pause(), "pause");
        }
    }

    /// Pause, rewind to the start and save the position immediately.
    pub fn stop(&self) {
        let Some(element) = self.inner.ensure() else {
            return;
        };

        log_failure(element.pause(), "pause");
        log_failure(element.set_current_time(0.0), "rewind");
        self.inner
            .store
            .set_state(StatePatch::new().current_time(0.0).is_playing(false));
        self.inner.save_progress(true);
    }

    /// Move to `time` seconds.
    ///
    /// The target is clamped to `[0, duration]`. While the duration is still
    /// unknown the target is kept and applied when metadata arrives.
    pub fn seek(&self, time: f64) {
        if !time.is_finite() {
            debug!(time, "Ignoring seek to non-finite position");
            return;
        }

        let Some(element) = self.inner.ensure() else {
            return;
        };

        let duration = self.inner.store.snapshot().duration;
        let upper = if duration > 0.0 { duration } else { time };
        let target = time.min(upper).max(0.0);

        if duration <= 0.0 {
            trace!(target, "Deferring seek until metadata is loaded");
            self.inner.slot.lock().pending_seek = Some(target);
            return;
        }

        log_failure(element.set_current_time(target), "seek");
        self.inner
            .store
            .set_state(StatePatch::new().current_time(target));
    }

    /// Set the volume, clamped to `[0, 1]`.
    pub fn set_volume(&self, volume: f64) {
        let Some(element) = self.inner.ensure() else {
            return;
        };

        let volume = clamp_volume(volume);
        log_failure(element.set_volume(volume), "set volume");
        self.inner.store.set_state(StatePatch::new().volume(volume));
    }

    /// Set the playback rate, clamped to `[0.5, 2]`.
    pub fn set_playback_rate(&self, rate: f64) {
        let Some(element) = self.inner.ensure() else {
            return;
        };

        let rate = clamp_rate(rate);
        log_failure(element.set_playback_rate(rate), "set playback rate");
        self.inner.store.set_state(StatePatch::new().rate(rate));
    }

    /// Overwrite the seek applied when the next metadata arrives.
    pub fn set_pending_seek(&self, seconds: Option<f64>) {
        self.inner.slot.lock().pending_seek = seconds.filter(|s| s.is_finite());
    }

    pub fn pending_seek(&self) -> Option<f64> {
        self.inner.slot.lock().pending_seek
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release the element and return to the default state.
    ///
    /// Listeners and handler sets stay registered. The next operation creates
    /// a new element.
    pub fn dispose(&self) {
        let element = {
            let mut slot = self.inner.slot.lock();
            slot.generation += 1;
            slot.pending_seek = None;
            slot.element.take()
        };

        if let Some(element) = element {
            element.detach();
            info!(element = %element.id(), "Media element disposed");
        }

        self.inner.progress.reset_throttle();
        self.inner.store.reset();
    }
}

impl fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (element, pending_seek) = {
            let slot = self.inner.slot.lock();
            (slot.element.clone(), slot.pending_seek)
        };
        f.debug_struct("AudioManager")
            .field("element", &element.map(|e| e.id()))
            .field("pending_seek", &pending_seek)
            .field("state", &self.inner.store.snapshot())
            .field("progress", &self.inner.progress)
            .field("fanout", &self.inner.fanout)
            .finish()
    }
}

// ============================================================================
// Element ownership and event translation
// ============================================================================

impl Inner {
    /// The current element, creating one if needed.
    fn ensure(self: &Arc<Self>) -> Option<Arc<dyn MediaElement>> {
        let generation = {
            let slot = self.slot.lock();
            if let Some(element) = &slot.element {
                return Some(Arc::clone(element));
            }
            slot.generation
        };

        let weak: Weak<Inner> = Arc::downgrade(self);
        let sink = MediaEventSink::new(move |event: MediaEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_media_event(generation, event);
            }
        });

        let element = match self.factory.create(sink) {
            Ok(element) => element,
            Err(e) if e.is_not_available() => {
                trace!("No media element on this host");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to create media element");
                return None;
            }
        };

        let mut slot = self.slot.lock();
        if slot.generation != generation {
            // Disposed while the element was being created.
            drop(slot);
            element.detach();
            return self.ensure();
        }
        if let Some(existing) = &slot.element {
            let existing = Arc::clone(existing);
            drop(slot);
            element.detach();
            return Some(existing);
        }
        slot.element = Some(Arc::clone(&element));
        drop(slot);

        info!(element = %element.id(), "Media element created");
        Some(element)
    }

    /// Element the events of `generation` belong to, if it is still current.
    fn current_element(&self, generation: u64) -> Option<Arc<dyn MediaElement>> {
        let slot = self.slot.lock();
        if slot.generation != generation {
            return None;
        }
        slot.element.clone()
    }

    fn handle_media_event(&self, generation: u64, event: MediaEvent) {
        let Some(element) = self.current_element(generation) else {
            trace!(event = %event, "Ignoring event from a released element");
            return;
        };

        match event {
            MediaEvent::TimeUpdate => {
                let position = finite_seconds(element.current_time());
                self.store
                    .set_state(StatePatch::new().current_time(position));
                self.save_progress(false);
                self.fanout.dispatch(&PlaybackEvent::PositionChanged {
                    position_secs: position,
                });
            }
            MediaEvent::LoadedMetadata => {
                let duration = finite_seconds(element.duration());
                self.store
                    .set_state(StatePatch::new().duration(duration).is_ready(true));
                self.fanout.dispatch(&PlaybackEvent::MetadataLoaded {
                    duration_secs: duration,
                });

                let pending = self.slot.lock().pending_seek.take();
                if let Some(target) = pending {
                    log_failure(element.set_current_time(target.max(0.0)), "resume");
                    let position = finite_seconds(element.current_time());
                    self.store
                        .set_state(StatePatch::new().current_time(position));
                    debug!(position, "Applied deferred seek");
                }
            }
            MediaEvent::Playing => {
                self.store
                    .set_state(StatePatch::new().is_playing(true).is_ready(true));
                self.fanout.dispatch(&PlaybackEvent::Started);
            }
            MediaEvent::Pause => {
                self.store.set_state(StatePatch::new().is_playing(false));
                self.save_progress(true);
                self.fanout.dispatch(&PlaybackEvent::Paused);
            }
            MediaEvent::Ended => {
                self.store.set_state(StatePatch::new().is_playing(false));
                self.save_progress(true);
                self.fanout.dispatch(&PlaybackEvent::Ended);
            }
            MediaEvent::Waiting => self.fanout.dispatch(&PlaybackEvent::Waiting),
            MediaEvent::CanPlay => self.fanout.dispatch(&PlaybackEvent::CanPlay),
            MediaEvent::Error => {
                debug!(element = %element.id(), "Media element reported an error");
                self.store
                    .set_state(StatePatch::new().error(Some(AUDIO_ERROR.to_string())));
                self.fanout.dispatch(&PlaybackEvent::Error {
                    message: AUDIO_ERROR.to_string(),
                });
            }
        }
    }

    fn save_progress(&self, force: bool) {
        let state = self.store.snapshot();
        self.progress
            .save(state.src.as_deref(), state.current_time, force);
    }
}

fn log_failure(result: BridgeResult<()>, operation: &str) {
    if let Err(e) = result {
        debug!(operation, error = %e, "Media element operation failed");
    }
}
