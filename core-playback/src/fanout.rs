//! Event fan-out
//!
//! A second subscriber set, independent of the state listeners, for side
//! effects such as analytics or "mark lesson complete" on `ended`.

use crate::subscription::{Registry, Subscription};
use bridge_traits::platform::PlatformSendSync;
use core_runtime::events::{EventBus, PlaybackEvent};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

// ============================================================================
// Handler bounds
// ============================================================================

/// Handler for events without a payload.
pub trait NotifyHandler: Fn() + PlatformSendSync {}

impl<F> NotifyHandler for F where F: Fn() + PlatformSendSync {}

/// Handler receiving a position or duration in seconds.
pub trait SecondsHandler: Fn(f64) + PlatformSendSync {}

impl<F> SecondsHandler for F where F: Fn(f64) + PlatformSendSync {}

/// Handler receiving the recorded error code.
pub trait ErrorHandler: Fn(&str) + PlatformSendSync {}

impl<F> ErrorHandler for F where F: Fn(&str) + PlatformSendSync {}

// ============================================================================
// Handler sets
// ============================================================================

/// Optional lifecycle callbacks registered as one unit.
///
/// Only the callbacks that were supplied are invoked.
///
/// ```
/// use core_playback::AudioEventHandlers;
///
/// let handlers = AudioEventHandlers::new()
///     .on_ended(|| println!("lesson complete"))
///     .on_time_update(|secs| println!("at {secs}s"));
/// assert!(handlers.handles_time_updates());
/// ```
#[derive(Clone, Default)]
pub struct AudioEventHandlers {
    on_play: Option<Arc<dyn NotifyHandler>>,
    on_pause: Option<Arc<dyn NotifyHandler>>,
    on_ended: Option<Arc<dyn NotifyHandler>>,
    on_time_update: Option<Arc<dyn SecondsHandler>>,
    on_loaded_metadata: Option<Arc<dyn SecondsHandler>>,
    on_waiting: Option<Arc<dyn NotifyHandler>>,
    on_can_play: Option<Arc<dyn NotifyHandler>>,
    on_error: Option<Arc<dyn ErrorHandler>>,
}

impl AudioEventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_play<F>(mut self, handler: F) -> Self
    where
        F: Fn() + PlatformSendSync + 'static,
    {
        self.on_play = Some(Arc::new(handler));
        self
    }

    pub fn on_pause<F>(mut self, handler: F) -> Self
    where
        F: Fn() + PlatformSendSync + 'static,
    {
        self.on_pause = Some(Arc::new(handler));
        self
    }

    pub fn on_ended<F>(mut self, handler: F) -> Self
    where
        F: Fn() + PlatformSendSync + 'static,
    {
        self.on_ended = Some(Arc::new(handler));
        self
    }

    /// Called with the new position in seconds.
    pub fn on_time_update<F>(mut self, handler: F) -> Self
    where
        F: Fn(f64) + PlatformSendSync + 'static,
    {
        self.on_time_update = Some(Arc::new(handler));
        self
    }

    /// Called with the duration in seconds once metadata is loaded.
    pub fn on_loaded_metadata<F>(mut self, handler: F) -> Self
    where
        F: Fn(f64) + PlatformSendSync + 'static,
    {
        self.on_loaded_metadata = Some(Arc::new(handler));
        self
    }

    pub fn on_waiting<F>(mut self, handler: F) -> Self
    where
        F: Fn() + PlatformSendSync + 'static,
    {
        self.on_waiting = Some(Arc::new(handler));
        self
    }

    pub fn on_can_play<F>(mut self, handler: F) -> Self
    where
        F: Fn() + PlatformSendSync + 'static,
    {
        self.on_can_play = Some(Arc::new(handler));
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + PlatformSendSync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Handler set that republishes every lifecycle event on `bus`.
    ///
    /// Events emitted while the bus has no receivers are dropped.
    pub fn forward_to(bus: EventBus) -> Self {
        let publish = move |event: PlaybackEvent| {
            // Err only means nobody is listening right now.
            let _ = bus.emit(event);
        };

        let p = publish.clone();
        let handlers = Self::new().on_play(move || p(PlaybackEvent::Started));
        let p = publish.clone();
        let handlers = handlers.on_pause(move || p(PlaybackEvent::Paused));
        let p = publish.clone();
        let handlers = handlers.on_ended(move || p(PlaybackEvent::Ended));
        let p = publish.clone();
        let handlers = handlers.on_time_update(move |position_secs| {
            p(PlaybackEvent::PositionChanged { position_secs })
        });
        let p = publish.clone();
        let handlers = handlers.on_loaded_metadata(move |duration_secs| {
            p(PlaybackEvent::MetadataLoaded { duration_secs })
        });
        let p = publish.clone();
        let handlers = handlers.on_waiting(move || p(PlaybackEvent::Waiting));
        let p = publish.clone();
        let handlers = handlers.on_can_play(move || p(PlaybackEvent::CanPlay));
        handlers.on_error(move |message: &str| {
            publish(PlaybackEvent::Error {
                message: message.to_string(),
            })
        })
    }

    pub fn handles_time_updates(&self) -> bool {
        self.on_time_update.is_some()
    }

    /// Invoke the callback matching `event`, if one was supplied.
    pub fn deliver(&self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Started => notify(&self.on_play),
            PlaybackEvent::Paused => notify(&self.on_pause),
            PlaybackEvent::Ended => notify(&self.on_ended),
            PlaybackEvent::PositionChanged { position_secs } => {
                if let Some(handler) = &self.on_time_update {
                    handler(*position_secs);
                }
            }
            PlaybackEvent::MetadataLoaded { duration_secs } => {
                if let Some(handler) = &self.on_loaded_metadata {
                    handler(*duration_secs);
                }
            }
            PlaybackEvent::Waiting => notify(&self.on_waiting),
            PlaybackEvent::CanPlay => notify(&self.on_can_play),
            PlaybackEvent::Error { message } => {
                if let Some(handler) = &self.on_error {
                    handler(message);
                }
            }
        }
    }
}

fn notify(handler: &Option<Arc<dyn NotifyHandler>>) {
    if let Some(handler) = handler {
        handler();
    }
}

impl fmt::Debug for AudioEventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioEventHandlers")
            .field("on_play", &self.on_play.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .field("on_time_update", &self.on_time_update.is_some())
            .field("on_loaded_metadata", &self.on_loaded_metadata.is_some())
            .field("on_waiting", &self.on_waiting.is_some())
            .field("on_can_play", &self.on_can_play.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Registered handler sets, invoked in registration order.
pub struct EventFanout {
    handlers: Arc<Registry<AudioEventHandlers>>,
}

impl EventFanout {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Registry::new()),
        }
    }

    pub fn subscribe(&self, handlers: AudioEventHandlers) -> Subscription {
        self.handlers.insert(Arc::new(handlers))
    }

    /// Deliver `event` to every registered handler set. No lock is held
    /// while handlers run.
    pub fn dispatch(&self, event: &PlaybackEvent) {
        let handlers = self.handlers.entries();
        if !matches!(event, PlaybackEvent::PositionChanged { .. }) {
            trace!(event = event.description(), handlers = handlers.len(), "Dispatching playback event");
        }
        for set in handlers {
            set.deliver(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventFanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFanout")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, AudioEventHandlers) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = Arc::clone(&log);
        let l2 = Arc::clone(&log);
        let l3 = Arc::clone(&log);
        let handlers = AudioEventHandlers::new()
            .on_play(move || l1.lock().push("play".to_string()))
            .on_time_update(move |secs| l2.lock().push(format!("time:{}", secs)))
            .on_error(move |code| l3.lock().push(format!("error:{}", code)));
        (log, handlers)
    }

    #[test]
    fn test_only_supplied_handlers_run() {
        let fanout = EventFanout::new();
        let (log, handlers) = recorder();
        let _subscription = fanout.subscribe(handlers);

        fanout.dispatch(&PlaybackEvent::Started);
        fanout.dispatch(&PlaybackEvent::Paused);
        fanout.dispatch(&PlaybackEvent::Ended);
        fanout.dispatch(&PlaybackEvent::PositionChanged { position_secs: 3.0 });
        fanout.dispatch(&PlaybackEvent::Waiting);
        fanout.dispatch(&PlaybackEvent::Error {
            message: "audio_error".to_string(),
        });

        assert_eq!(
            *log.lock(),
            vec!["play".to_string(), "time:3".to_string(), "error:audio_error".to_string()]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let fanout = EventFanout::new();
        let (first_log, first) = recorder();
        let (second_log, second) = recorder();
        let first_subscription = fanout.subscribe(first);
        let _second_subscription = fanout.subscribe(second);

        fanout.dispatch(&PlaybackEvent::Started);
        assert!(first_subscription.unsubscribe());
        fanout.dispatch(&PlaybackEvent::Started);

        assert_eq!(first_log.lock().len(), 1);
        assert_eq!(second_log.lock().len(), 2);
        assert_eq!(fanout.handler_count(), 1);
    }

    #[test]
    fn test_empty_handler_set_ignores_everything() {
        let fanout = EventFanout::new();
        let _subscription = fanout.subscribe(AudioEventHandlers::new());

        fanout.dispatch(&PlaybackEvent::MetadataLoaded { duration_secs: 10.0 });
        fanout.dispatch(&PlaybackEvent::CanPlay);

        assert_eq!(fanout.handler_count(), 1);
    }

    #[test]
    fn test_forward_to_republishes_on_bus() {
        let bus = EventBus::new(16);
        let mut receiver = bus.subscribe();
        let handlers = AudioEventHandlers::forward_to(bus.clone());

        handlers.deliver(&PlaybackEvent::MetadataLoaded { duration_secs: 120.0 });
        handlers.deliver(&PlaybackEvent::Started);
        handlers.deliver(&PlaybackEvent::Error {
            message: "audio_error".to_string(),
        });

        assert_eq!(
            receiver.try_recv().unwrap(),
            PlaybackEvent::MetadataLoaded { duration_secs: 120.0 }
        );
        assert_eq!(receiver.try_recv().unwrap(), PlaybackEvent::Started);
        assert_eq!(
            receiver.try_recv().unwrap(),
            PlaybackEvent::Error {
                message: "audio_error".to_string()
            }
        );
    }

    #[test]
    fn test_forward_to_without_receivers_is_silent() {
        let handlers = AudioEventHandlers::forward_to(EventBus::default());
        handlers.deliver(&PlaybackEvent::Ended);
    }

    #[test]
    fn test_debug_lists_supplied_handlers() {
        let debug = format!("{:?}", AudioEventHandlers::new().on_ended(|| {}));
        assert!(debug.contains("on_ended: true"));
        assert!(debug.contains("on_play: false"));
    }
}
