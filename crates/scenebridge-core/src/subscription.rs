// ── Listener registration primitives ──
//
// Both sides of the bridge (scenes and the state store) push
// notifications to registered listeners and hand back an opaque
// `SubscriptionId` that is later used to unregister.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Receiver of push notifications.
///
/// `notify` is called synchronously from the emitting side and must not
/// block; implementations typically forward into a channel.
pub trait Listener<T>: Send + Sync {
    fn notify(&self, value: T);
}

impl<T, F> Listener<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn notify(&self, value: T) {
        self(value);
    }
}

/// Opaque handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Concurrent listener table keyed by a topic (property, path, ...).
///
/// Emission snapshots the matching listeners first and calls them with
/// no map guard held, so a listener may (un)register re-entrantly.
pub struct ListenerRegistry<K, T> {
    next_id: AtomicU64,
    listeners: DashMap<SubscriptionId, (K, Arc<dyn Listener<T>>)>,
}

impl<K, T> ListenerRegistry<K, T>
where
    K: PartialEq + Clone + Send + Sync,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: DashMap::new(),
        }
    }

    pub fn register(&self, topic: K, listener: Arc<dyn Listener<T>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, (topic, listener));
        id
    }

    /// Returns `false` if the id was unknown (already removed).
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver `value` to every listener registered for `topic`.
    /// Returns the number of listeners notified.
    pub fn emit(&self, topic: &K, value: &T) -> usize {
        let targets: Vec<Arc<dyn Listener<T>>> = self
            .listeners
            .iter()
            .filter(|entry| entry.value().0 == *topic)
            .map(|entry| Arc::clone(&entry.value().1))
            .collect();
        for listener in &targets {
            listener.notify(value.clone());
        }
        targets.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<K, T> Default for ListenerRegistry<K, T>
where
    K: PartialEq + Clone + Send + Sync,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emit_reaches_only_matching_topic() {
        let registry: ListenerRegistry<&'static str, u32> = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let other = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        registry.register("a", Arc::new(move |v: u32| sink.lock().unwrap().push(v)));
        let sink = Arc::clone(&other);
        registry.register("b", Arc::new(move |v: u32| sink.lock().unwrap().push(v)));

        assert_eq!(registry.emit(&"a", &7), 1);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
        assert!(other.lock().unwrap().is_empty());
    }

    #[test]
    fn unregister_is_reported_once() {
        let registry: ListenerRegistry<u8, ()> = ListenerRegistry::new();
        let id = registry.register(1, Arc::new(|()| {}));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.emit(&1, &()), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let registry: ListenerRegistry<u8, ()> = ListenerRegistry::new();
        let a = registry.register(1, Arc::new(|()| {}));
        let b = registry.register(1, Arc::new(|()| {}));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }
}
