//! Listener registry — the set of subscribers to door state broadcasts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use garagedoor_domain::door_state::DoorState;
use garagedoor_domain::id::ListenerId;

use crate::ports::StateListener;

/// Registry of state listeners keyed by [`ListenerId`].
///
/// Ids come from a counter owned by the registry, so an id is never reused
/// and iteration follows registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<ListenerId, Box<dyn StateListener>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return the id to remove it with.
    ///
    /// The listener is not called on registration.
    pub fn add(&self, listener: impl StateListener + 'static) -> ListenerId {
        let id = ListenerId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Box::new(listener));
        id
    }

    /// Remove a listener. Returns `false` when the id was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Deliver `state` to every listener, in registration order.
    ///
    /// Holds the read lock for the whole delivery: a listener must not add or
    /// remove listeners from inside its callback. Returns the number of
    /// listeners invoked.
    pub fn broadcast(&self, state: DoorState) -> usize {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.values() {
            listener.state_changed(state);
        }
        listeners.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(usize, DoorState)>>>);

    impl Recorder {
        fn listener(&self, tag: usize) -> impl Fn(DoorState) + Send + Sync + 'static {
            let log = Arc::clone(&self.0);
            move |state| log.lock().unwrap().push((tag, state))
        }

        fn entries(&self) -> Vec<(usize, DoorState)> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn should_issue_unique_ids() {
        let registry = ListenerRegistry::new();
        let a = registry.add(|_: DoorState| {});
        let b = registry.add(|_: DoorState| {});
        registry.remove(a);
        let c = registry.add(|_: DoorState| {});
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn should_not_call_listener_on_registration() {
        let recorder = Recorder::default();
        let registry = ListenerRegistry::new();
        registry.add(recorder.listener(0));
        assert!(recorder.entries().is_empty());
    }

    #[test]
    fn should_broadcast_to_every_listener_in_registration_order() {
        let recorder = Recorder::default();
        let registry = ListenerRegistry::new();
        for tag in 0..3 {
            registry.add(recorder.listener(tag));
        }

        let delivered = registry.broadcast(DoorState::Open);

        assert_eq!(delivered, 3);
        assert_eq!(
            recorder.entries(),
            vec![
                (0, DoorState::Open),
                (1, DoorState::Open),
                (2, DoorState::Open)
            ]
        );
    }

    #[test]
    fn should_stop_delivering_to_removed_listener() {
        let recorder = Recorder::default();
        let registry = ListenerRegistry::new();
        let first = registry.add(recorder.listener(0));
        registry.add(recorder.listener(1));

        assert!(registry.remove(first));
        registry.broadcast(DoorState::Closed);

        assert_eq!(recorder.entries(), vec![(1, DoorState::Closed)]);
    }

    #[test]
    fn should_ignore_removal_of_unknown_id() {
        let recorder = Recorder::default();
        let registry = ListenerRegistry::new();
        registry.add(recorder.listener(0));

        assert!(!registry.remove(ListenerId::from_raw(999)));
        registry.broadcast(DoorState::Open);

        assert_eq!(registry.len(), 1);
        assert_eq!(recorder.entries().len(), 1);
    }

    #[test]
    fn should_ignore_double_removal() {
        let registry = ListenerRegistry::new();
        let id = registry.add(|_: DoorState| {});
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }
}
