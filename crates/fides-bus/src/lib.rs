//! # fides-bus
//!
//! A small synchronous publish/subscribe utility.
//!
//! Subscribers register under a key (an event kind) or under the wildcard
//! channel, which receives every event regardless of key. Dispatch is
//! synchronous with the emitting call, in registration order, keyed
//! subscribers first.
//!
//! The bus is a *notification* mechanism, not a transactional one: a
//! panicking subscriber is caught, logged, and skipped — it cannot corrupt
//! the bus or the emitter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fides_bus::EventBus;
//!
//! let bus: EventBus<&'static str, String> = EventBus::new();
//! let id = bus.subscribe("greeting", |msg| println!("got {msg}"));
//! bus.emit(&"greeting", &"hello".to_string());
//! bus.unsubscribe(id);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::warn;
use uuid::Uuid;

/// Opaque handle returned by `subscribe`; pass to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// The mutable interior of an `EventBus`.
struct BusState<K, E> {
    /// Keyed subscribers, dispatched when the emitted key matches.
    keyed: HashMap<K, Vec<(SubscriptionId, Handler<E>)>>,
    /// Wildcard subscribers, dispatched for every emitted event.
    wildcard: Vec<(SubscriptionId, Handler<E>)>,
}

/// A keyed + wildcard synchronous event bus.
///
/// `K` is the subscription key (typically a small `Copy` enum), `E` the
/// event payload. All methods take `&self`; interior state is guarded by a
/// `Mutex`, so the bus can be shared across threads.
///
/// Handlers are invoked *outside* the registry lock — a handler may
/// subscribe or unsubscribe reentrantly without deadlocking.
pub struct EventBus<K, E> {
    state: Mutex<BusState<K, E>>,
}

impl<K, E> Default for EventBus<K, E>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> EventBus<K, E>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState {
                keyed: HashMap::new(),
                wildcard: Vec::new(),
            }),
        }
    }

    /// Register `handler` for events emitted under `key`.
    pub fn subscribe<F>(&self, key: K, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let mut state = self.state.lock().expect("bus state lock poisoned");
        state
            .keyed
            .entry(key)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Register `handler` on the wildcard channel: it receives every event.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let mut state = self.state.lock().expect("bus state lock poisoned");
        state.wildcard.push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.lock().expect("bus state lock poisoned");

        for handlers in state.keyed.values_mut() {
            let before = handlers.len();
            handlers.retain(|(sub_id, _)| *sub_id != id);
            if handlers.len() < before {
                return true;
            }
        }

        let before = state.wildcard.len();
        state.wildcard.retain(|(sub_id, _)| *sub_id != id);
        state.wildcard.len() < before
    }

    /// Dispatch `event` to subscribers of `key`, then to wildcard
    /// subscribers.
    ///
    /// Handlers are snapshotted and invoked with the registry lock
    /// released, so a handler may subscribe or unsubscribe reentrantly.
    /// Each handler runs under `catch_unwind`; a panicking handler is
    /// logged at warn level and skipped, and dispatch continues with the
    /// remaining handlers.
    pub fn emit(&self, key: &K, event: &E) {
        let handlers: Vec<(SubscriptionId, Handler<E>)> = {
            let state = self.state.lock().expect("bus state lock poisoned");
            let keyed = state
                .keyed
                .get(key)
                .map(|handlers| handlers.iter().cloned())
                .into_iter()
                .flatten();
            let wildcard = state.wildcard.iter().cloned();
            keyed.chain(wildcard).collect()
        };

        for (id, handler) in handlers {
            let result = catch_unwind(AssertUnwindSafe(|| handler(event)));
            if result.is_err() {
                warn!(subscription = ?id, "event subscriber panicked; skipping");
            }
        }
    }

    /// Total registered subscribers (keyed + wildcard).
    pub fn subscriber_count(&self) -> usize {
        let state = self.state.lock().expect("bus state lock poisoned");
        state.keyed.values().map(Vec::len).sum::<usize>() + state.wildcard.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::EventBus;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Alpha,
        Beta,
    }

    #[test]
    fn keyed_subscriber_receives_matching_events_only() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        bus.subscribe(Kind::Alpha, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&Kind::Alpha, &1);
        bus.emit(&Kind::Beta, &2);
        bus.emit(&Kind::Alpha, &3);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn wildcard_subscriber_receives_every_event() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        bus.subscribe_all(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&Kind::Alpha, &1);
        bus.emit(&Kind::Beta, &2);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn keyed_handlers_run_before_wildcard() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let order_keyed = order.clone();
        bus.subscribe(Kind::Alpha, move |_| {
            order_keyed.lock().unwrap().push("keyed");
        });
        let order_wild = order.clone();
        bus.subscribe_all(move |_| {
            order_wild.lock().unwrap().push("wildcard");
        });

        bus.emit(&Kind::Alpha, &1);

        assert_eq!(*order.lock().unwrap(), vec!["keyed", "wildcard"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        let id = bus.subscribe(Kind::Alpha, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&Kind::Alpha, &1);
        assert!(bus.unsubscribe(id));
        bus.emit(&Kind::Alpha, &2);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!bus.unsubscribe(id), "second unsubscribe must return false");
    }

    #[test]
    fn panicking_subscriber_does_not_poison_the_bus() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Kind::Alpha, |_| {
            panic!("subscriber blew up");
        });
        let seen_clone = seen.clone();
        bus.subscribe(Kind::Alpha, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&Kind::Alpha, &1);
        bus.emit(&Kind::Alpha, &2);

        // The surviving subscriber saw both events; the bus stayed usable.
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn subscriber_count_tracks_registrations() {
        let bus: EventBus<Kind, u32> = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        let a = bus.subscribe(Kind::Alpha, |_| {});
        bus.subscribe(Kind::Beta, |_| {});
        bus.subscribe_all(|_| {});
        assert_eq!(bus.subscriber_count(), 3);
        bus.unsubscribe(a);
        assert_eq!(bus.subscriber_count(), 2);
    }
}
