//! Player Listeners
//!
//! Every seat carries a [`ListenerSet`]. The session notifies it with
//! [`RoomMessage`](crate::network::protocol::RoomMessage) events; the
//! transport (or a test) registers whatever sink it needs.
//!
//! Delivery works on a copy of the registry taken at call time. Listeners
//! may be added or removed from any thread, including from inside a
//! callback, without affecting a delivery pass already under way.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::trace;

/// Receiver of player events.
pub trait PlayerListener<E>: Send + Sync {
    /// Handle one event. Must not block.
    fn on_player_event(&self, event: &E);
}

impl<E, F> PlayerListener<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_player_event(&self, event: &E) {
        self(event)
    }
}

/// Handle returned on registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registry<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn PlayerListener<E>>)>,
}

/// Shared, ordered set of listeners.
///
/// Clones share the same registry.
pub struct ListenerSet<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> ListenerSet<E> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry<E>> {
        // A panicking listener never runs under this lock
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a listener. Delivery follows registration order.
    pub fn add(&self, listener: Arc<dyn PlayerListener<E>>) -> ListenerId {
        let mut registry = self.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, listener));
        id
    }

    /// Unregister a listener. Returns whether it was present.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(entry, _)| *entry != id);
        registry.entries.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// No listener registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener registered at call time.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Arc<dyn PlayerListener<E>>> = self
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener.on_player_event(event);
        }
    }
}

impl<E> Clone for ListenerSet<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for ListenerSet<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

// =============================================================================
// CHANNEL LISTENER
// =============================================================================

/// Forwards events into an unbounded tokio channel.
///
/// Ordering per listener is preserved and delivery never blocks the
/// session.
pub struct ChannelListener<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E: Clone + Send + 'static> ChannelListener<E> {
    /// Create a listener and the receiving end of its channel.
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl<E: Clone + Send + 'static> PlayerListener<E> for ChannelListener<E> {
    fn on_player_event(&self, event: &E) {
        if self.tx.send(event.clone()).is_err() {
            trace!("listener channel closed, event dropped");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_delivery_order() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            set.add(Arc::new(move |event: &u32| {
                seen.lock().unwrap().push(format!("{}{}", tag, event));
            }));
        }

        set.notify(&1);
        set.notify(&2);
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_remove() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let id = set.add(Arc::new(move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        set.notify(&0);
        assert!(set.remove(id));
        assert!(!set.remove(id));
        set.notify(&0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_registration_during_delivery() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let handle = set.clone();
        let late_calls = Arc::new(AtomicUsize::new(0));
        let late = Arc::clone(&late_calls);

        // Registers another listener on every event, and removes itself
        let self_id = Arc::new(Mutex::new(None));
        let own = Arc::clone(&self_id);
        let id = set.add(Arc::new(move |_: &u32| {
            let late = Arc::clone(&late);
            handle.add(Arc::new(move |_: &u32| {
                late.fetch_add(1, Ordering::SeqCst);
            }));
            if let Some(id) = *own.lock().unwrap() {
                handle.remove(id);
            }
        }));
        *self_id.lock().unwrap() = Some(id);

        // The listener added mid-delivery misses the current event
        set.notify(&1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(set.len(), 1);

        set.notify(&2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_channel_listener() {
        let set: ListenerSet<String> = ListenerSet::new();
        let (listener, mut rx) = ChannelListener::<String>::pair();
        set.add(listener);

        set.notify(&"first".to_string());
        set.notify(&"second".to_string());
        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(rx.recv().await.as_deref(), Some("second"));

        drop(rx);
        // Closed channel is not an error for the session
        set.notify(&"dropped".to_string());
    }
}
