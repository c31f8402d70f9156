//! State store
//!
//! Holds the current [`PlaybackState`] snapshot and the listeners that are
//! told about every change. Each mutation publishes a fresh `Arc` snapshot and
//! notifies all listeners synchronously, with no diffing. Listeners run after
//! the internal lock is released, so they may call back into the manager.

use crate::state::{PlaybackState, StatePatch};
use crate::subscription::{Registry, Subscription};
use bridge_traits::platform::PlatformSendSync;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Callback bound for snapshot listeners.
pub trait StateListener: Fn(Arc<PlaybackState>) + PlatformSendSync {}

impl<F> StateListener for F where F: Fn(Arc<PlaybackState>) + PlatformSendSync {}

pub struct StateStore {
    snapshot: Mutex<Arc<PlaybackState>>,
    listeners: Arc<Registry<dyn StateListener>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_state(PlaybackState::default())
    }

    pub fn with_state(state: PlaybackState) -> Self {
        Self {
            snapshot: Mutex::new(Arc::new(state)),
            listeners: Arc::new(Registry::new()),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<PlaybackState> {
        Arc::clone(&self.snapshot.lock())
    }

    /// Merge `patch` into the snapshot and notify.
    pub fn set_state(&self, patch: StatePatch) {
        self.update(|state| patch.apply(state));
    }

    /// Mutate a copy of the snapshot, publish it and notify.
    ///
    /// `mutate` runs under the store lock and must not call back into the
    /// store.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut PlaybackState),
    {
        let next = {
            let mut current = self.snapshot.lock();
            let mut state = PlaybackState::clone(&current);
            mutate(&mut state);
            let next = Arc::new(state);
            *current = Arc::clone(&next);
            next
        };
        self.notify(next);
    }

    /// Swap in a whole new snapshot and notify.
    pub fn replace(&self, state: PlaybackState) {
        let next = Arc::new(state);
        *self.snapshot.lock() = Arc::clone(&next);
        self.notify(next);
    }

    /// Back to [`PlaybackState::default`].
    pub fn reset(&self) {
        self.replace(PlaybackState::default());
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Arc<PlaybackState>) + PlatformSendSync + 'static,
    {
        let listener: Arc<dyn StateListener> = Arc::new(listener);
        self.listeners.insert(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, snapshot: Arc<PlaybackState>) {
        for listener in self.listeners.entries() {
            listener(Arc::clone(&snapshot));
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("snapshot", &self.snapshot())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_notifies_with_new_snapshot() {
        let store = StateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(move |state: Arc<PlaybackState>| {
            sink.lock().push(state.current_time);
        });

        store.update(|state| state.current_time = 4.0);
        store.set_state(StatePatch::new().current_time(9.0));

        assert_eq!(*seen.lock(), vec![4.0, 9.0]);
        assert_eq!(store.snapshot().current_time, 9.0);
    }

    #[test]
    fn test_every_mutation_notifies_even_without_change() {
        let store = StateStore::new();
        let count = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&count);
        let _subscription = store.subscribe(move |_| *counter.lock() += 1);

        store.set_state(StatePatch::new());
        store.reset();

        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let store = StateStore::new();
        let before = store.snapshot();

        store.update(|state| state.is_playing = true);

        assert!(!before.is_playing);
        assert!(store.snapshot().is_playing);
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = StateStore::new();
        let count = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&count);
        let subscription = store.subscribe(move |_| *counter.lock() += 1);
        store.update(|state| state.duration = 1.0);

        assert!(subscription.unsubscribe());
        store.update(|state| state.duration = 2.0);

        assert_eq!(*count.lock(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_mutate_store() {
        let store = Arc::new(StateStore::new());

        let inner = Arc::clone(&store);
        let _subscription = store.subscribe(move |state: Arc<PlaybackState>| {
            if state.is_playing && !state.is_ready {
                inner.update(|s| s.is_ready = true);
            }
        });

        store.update(|state| state.is_playing = true);

        let snapshot = store.snapshot();
        assert!(snapshot.is_playing);
        assert!(snapshot.is_ready);
    }

    #[test]
    fn test_replace_resets_everything() {
        let store = StateStore::with_state(PlaybackState {
            src: Some("a.mp3".into()),
            duration: 10.0,
            ..Default::default()
        });

        store.reset();

        assert_eq!(*store.snapshot(), PlaybackState::default());
    }
}
