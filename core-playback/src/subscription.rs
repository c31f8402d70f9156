//! Observer registrations
//!
//! State listeners and event handlers live in a [`Registry`]; every insert
//! hands back a [`Subscription`] that can remove exactly that entry again.

use bridge_traits::platform::PlatformSendSync;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

trait Unregister: PlatformSendSync {
    fn unregister(&self, id: u64) -> bool;
}

/// Capability to remove one listener or handler registration.
///
/// Dropping a `Subscription` does **not** unregister anything; the entry
/// stays registered until [`unsubscribe`](Subscription::unsubscribe) is called
/// or its owner is dropped.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unregister>,
}

impl Subscription {
    /// Remove the registration. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.unregister(self.id),
            None => false,
        }
    }

    /// Whether the owning registry still exists.
    pub fn is_attached(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Set of registered entries keyed by registration id.
pub(crate) struct Registry<T: ?Sized> {
    entries: Mutex<Vec<(u64, Arc<T>)>>,
    next_id: AtomicU64,
}

impl<T: ?Sized> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current entries, copied out so callers can invoke them without
    /// holding the registry lock.
    pub(crate) fn entries(&self) -> Vec<Arc<T>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, entry)| Arc::clone(entry))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl<T> Registry<T>
where
    T: ?Sized + 'static,
    Registry<T>: PlatformSendSync,
{
    pub(crate) fn insert(self: &Arc<Self>, entry: Arc<T>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, entry));

        let registry: Weak<Self> = Arc::downgrade(self);
        let registry: Weak<dyn Unregister> = registry;
        Subscription { id, registry }
    }
}

impl<T> Unregister for Registry<T>
where
    T: ?Sized,
    Registry<T>: PlatformSendSync,
{
    fn unregister(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_removes_only_its_entry() {
        let registry: Arc<Registry<str>> = Arc::new(Registry::new());
        let first = registry.insert(Arc::from("first"));
        let _second = registry.insert(Arc::from("second"));
        assert_eq!(registry.len(), 2);

        assert!(first.unsubscribe());
        let remaining: Vec<String> = registry.entries().iter().map(|s| s.to_string()).collect();
        assert_eq!(remaining, vec!["second".to_string()]);
    }

    #[test]
    fn test_same_value_registered_twice_is_two_entries() {
        let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
        let shared = Arc::new(7);
        let a = registry.insert(Arc::clone(&shared));
        let b = registry.insert(shared);

        assert!(a.unsubscribe());
        assert_eq!(registry.len(), 1);
        assert!(b.unsubscribe());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_dropping_subscription_keeps_entry() {
        let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
        drop(registry.insert(Arc::new(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
        let subscription = registry.insert(Arc::new(1));
        assert!(subscription.is_attached());

        drop(registry);
        assert!(!subscription.is_attached());
        assert!(!subscription.unsubscribe());
    }
}
