//! # Event Bus System
//!
//! Broadcasts playback lifecycle events to asynchronous consumers using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The audio manager notifies synchronous handlers directly from media element
//! callbacks. Consumers that live in async tasks (analytics uploaders, log
//! shippers, UI bridges running on another executor) subscribe here instead:
//!
//! - **PlaybackEvent**: serialisable description of one lifecycle transition
//! - **EventBus**: broadcast channel for publishing events
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────┐  forward_to   ┌───────────┐    subscribe    ┌────────────┐
//! │ AudioManager ├──────────────>│ EventBus  ├────────────────>│ Subscriber │
//! └──────────────┘               │ (broadcast│                 └────────────┘
//!                                │  channel) ├────────────────>┌────────────┐
//!                                └───────────┘                 │ Subscriber │
//!                                                              └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlaybackEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(PlaybackEvent::MetadataLoaded { duration_secs: 120.0 }).ok();
//!
//! assert_eq!(
//!     rx.recv().await.unwrap(),
//!     PlaybackEvent::MetadataLoaded { duration_secs: 120.0 }
//! );
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Time updates arrive several times per second, so slow consumers
//!   should expect this and keep going.
//! - **`RecvError::Closed`**: every sender was dropped.
//!
//! Emitting with no subscribers returns `SendError`; publishers treat that as
//! "nobody is listening" and move on.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Playback Events
// ============================================================================

/// Lifecycle events of the shared audio element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback actually started or resumed.
    Started,
    /// Playback paused.
    Paused,
    /// The media played through to its end.
    Ended,
    /// Playback position advanced.
    PositionChanged {
        /// Position in seconds.
        position_secs: f64,
    },
    /// Duration became known.
    MetadataLoaded {
        /// Duration in seconds, `0` for streams without a finite length.
        duration_secs: f64,
    },
    /// Playback stalled waiting for data.
    Waiting,
    /// Enough data is buffered to start playback.
    CanPlay,
    /// The element reported a load or decode failure.
    Error {
        /// Error code recorded in the playback state.
        message: String,
    },
}

impl PlaybackEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started => "Playback started",
            PlaybackEvent::Paused => "Playback paused",
            PlaybackEvent::Ended => "Playback ended",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::MetadataLoaded { .. } => "Media metadata loaded",
            PlaybackEvent::Waiting => "Waiting for data",
            PlaybackEvent::CanPlay => "Ready to play",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlaybackEvent::Error { .. } => EventSeverity::Error,
            PlaybackEvent::Waiting => EventSeverity::Warning,
            PlaybackEvent::Started | PlaybackEvent::Paused | PlaybackEvent::Ended => {
                EventSeverity::Info
            }
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to playback events.
///
/// Cloning the bus yields another sender for the same channel. Every
/// [`subscribe`](EventBus::subscribe) call creates an independent receiver
/// that sees all events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a `tokio::sync::broadcast` requirement).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: PlaybackEvent) -> Result<usize, SendError<PlaybackEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.sender.subscribe()
    }

    /// Convenience for `EventStream::new(self.subscribe())`.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&PlaybackEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventSeverity};
///
/// let bus = EventBus::default();
/// let errors_only = bus
///     .stream()
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<PlaybackEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<PlaybackEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()` and
    /// `try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlaybackEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &PlaybackEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events and `RecvError::Closed` once all senders are gone.
    pub async fn recv(&mut self) -> Result<PlaybackEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlaybackEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
