//! Media element bridge traits.
//!
//! The core never talks to an audio engine directly. Hosts hand it a
//! [`MediaElementFactory`] that can produce a single playback primitive (an
//! `HTMLAudioElement` in browsers, a native player elsewhere). The element
//! reports its lifecycle through a [`MediaEventSink`] handed over at creation
//! time; the core reads positions and durations back from the element when an
//! event arrives.

use crate::{error::Result, platform::PlatformSendSync};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle notifications emitted by a media element.
///
/// Variants mirror the HTML media events the core reacts to. Payloads are
/// intentionally absent: receivers query the element for the current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// Playback position changed (`timeupdate`).
    TimeUpdate,
    /// Duration and dimensions are known (`loadedmetadata`).
    LoadedMetadata,
    /// Playback actually started or resumed (`playing`).
    Playing,
    /// Playback paused (`pause`).
    Pause,
    /// Playback reached the end of the media (`ended`).
    Ended,
    /// Playback stalled waiting for data (`waiting`).
    Waiting,
    /// Enough data is buffered to start playing (`canplay`).
    CanPlay,
    /// The element failed to load or decode the media (`error`).
    Error,
}

impl MediaEvent {
    /// DOM event name for this notification.
    pub fn dom_name(&self) -> &'static str {
        match self {
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::LoadedMetadata => "loadedmetadata",
            MediaEvent::Playing => "playing",
            MediaEvent::Pause => "pause",
            MediaEvent::Ended => "ended",
            MediaEvent::Waiting => "waiting",
            MediaEvent::CanPlay => "canplay",
            MediaEvent::Error => "error",
        }
    }

    /// Every event a media element is expected to report.
    pub const ALL: [MediaEvent; 8] = [
        MediaEvent::TimeUpdate,
        MediaEvent::LoadedMetadata,
        MediaEvent::Playing,
        MediaEvent::Pause,
        MediaEvent::Ended,
        MediaEvent::Waiting,
        MediaEvent::CanPlay,
        MediaEvent::Error,
    ];
}

impl fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_name())
    }
}

/// Unique identifier for a media element instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaHandleId(Uuid);

impl MediaHandleId {
    /// Generate a new handle identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MediaHandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaHandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Callback bound used by [`MediaEventSink`].
pub trait MediaEventCallback: Fn(MediaEvent) + PlatformSendSync {}

impl<F> MediaEventCallback for F where F: Fn(MediaEvent) + PlatformSendSync {}

/// Receiver for media element notifications.
///
/// Elements must call [`MediaEventSink::emit`] synchronously from their own
/// event callbacks. The sink may re-enter the element (e.g. to read the
/// current position), so implementations must not hold internal locks while
/// emitting.
#[derive(Clone)]
pub struct MediaEventSink {
    callback: Arc<dyn MediaEventCallback>,
}

impl MediaEventSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: MediaEventCallback + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Deliver an event to the receiver.
    pub fn emit(&self, event: MediaEvent) {
        (self.callback)(event);
    }
}

impl fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MediaEventSink { .. }")
    }
}

/// A single native audio playback primitive.
///
/// Modelled after `HTMLMediaElement`: setters are fire-and-forget and report
/// failures through [`Result`]; readiness and progress are reported via the
/// [`MediaEventSink`] passed to [`MediaElementFactory::create`].
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: PlatformSendSync {
    /// Identifier of this element instance.
    fn id(&self) -> MediaHandleId;

    /// Assign a new media source. Takes effect after [`MediaElement::load`].
    fn set_source(&self, src: &str) -> Result<()>;

    /// Remove the current media source assignment.
    fn clear_source(&self) -> Result<()>;

    /// Reset the element and start loading the assigned source.
    fn load(&self) -> Result<()>;

    /// Request playback. Resolves once playback started or was rejected
    /// (autoplay policy, unsupported media).
    async fn play(&self) -> Result<()>;

    /// Pause playback.
    fn pause(&self) -> Result<()>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Move the playback position (seconds).
    fn set_current_time(&self, seconds: f64) -> Result<()>;

    /// Media duration in seconds. `NaN` or `0.0` while unknown.
    fn duration(&self) -> f64;

    /// Output volume in `[0, 1]`.
    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64) -> Result<()>;

    /// Playback speed multiplier.
    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64) -> Result<()>;

    /// Stop reporting events, pause, drop the source assignment and release
    /// platform resources.
    ///
    /// Called once when the owner disposes the element; the owner does not
    /// touch the element afterwards. Must be idempotent.
    fn detach(&self);
}

/// Creates media elements on demand.
///
/// Hosts without an audio capability (server-side rendering, headless tests)
/// return [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable);
/// callers treat that as "no element" rather than as a failure.
pub trait MediaElementFactory: PlatformSendSync {
    /// Create a fresh element reporting its lifecycle to `sink`.
    fn create(&self, sink: MediaEventSink) -> Result<Arc<dyn MediaElement>>;
}

/// Factory for hosts that cannot play audio at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMediaFactory;

impl MediaElementFactory for UnavailableMediaFactory {
    fn create(&self, _sink: MediaEventSink) -> Result<Arc<dyn MediaElement>> {
        Err(crate::error::BridgeError::NotAvailable(
            "media element".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use std::sync::Mutex;

    #[test]
    fn handle_id_is_unique() {
        let a = MediaHandleId::new();
        let b = MediaHandleId::new();
        assert_ne!(a, b);
        assert_eq!(a, MediaHandleId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn dom_names_match_html_events() {
        assert_eq!(MediaEvent::TimeUpdate.dom_name(), "timeupdate");
        assert_eq!(MediaEvent::LoadedMetadata.to_string(), "loadedmetadata");
        assert_eq!(MediaEvent::ALL.len(), 8);
    }

    #[test]
    fn sink_forwards_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = MediaEventSink::new(move |event| seen_clone.lock().unwrap().push(event));

        sink.emit(MediaEvent::Playing);
        sink.clone().emit(MediaEvent::Pause);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![MediaEvent::Playing, MediaEvent::Pause]
        );
    }

    #[test]
    fn unavailable_factory_reports_not_available() {
        let sink = MediaEventSink::new(|_| {});
        let result = UnavailableMediaFactory.create(sink);
        assert!(matches!(result, Err(BridgeError::NotAvailable(_))));
    }
}
