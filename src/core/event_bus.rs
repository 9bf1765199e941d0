//! Typed pub/sub bus wiring navigation, layout and scroll components.
//!
//! Two delivery modes, both active at once:
//! - subscribe() callbacks fire synchronously inside emit()
//! - every emitted event is also queued; the app drains the queue with
//!   poll() once per frame, after the core pipeline has run
//!
//! Callback order is FIFO within one event type. Ordering between
//! different event types is undefined - nothing here may rely on it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::warn;

/// Queue ceiling; a stalled consumer drops the oldest half instead of
/// growing without bound.
const MAX_QUEUE_SIZE: usize = 256;

/// Marker trait for bus events.
pub trait BusEvent: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + 'static> BusEvent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Queued event, type-erased.
pub type BoxedEvent = Box<dyn BusEvent>;

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type SubscriberMap = HashMap<TypeId, Vec<Callback>>;

/// Pub/sub bus with a deferred queue.
///
/// Cloning is cheap; all clones share the same subscribers and queue.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<SubscriberMap>>,
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type `E`. The callback fires synchronously
    /// from emit(), on the emitting thread.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: BusEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Invoke subscribers for `event` and queue it for the next poll().
    pub fn emit<E: BusEvent>(&self, event: E) {
        if let Some(cbs) = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
        {
            for cb in cbs {
                cb(&event);
            }
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict = queue.len() / 2;
            warn!("event queue full ({} events), evicting oldest {}", queue.len(), evict);
            queue.drain(0..evict);
        }
        queue.push(Box::new(event));
    }

    /// Drain all events emitted since the last poll.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Number of events waiting in the deferred queue.
    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop all subscribers for event type `E`.
    pub fn unsubscribe_all<E: BusEvent>(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<E>());
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_types", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.queue_len())
            .finish()
    }
}

/// Downcast a queued event to a concrete type.
///
/// The deref through `dyn BusEvent` matters: the blanket impl also covers
/// `Box<dyn BusEvent>` itself, and calling as_any() on the box would wrap
/// the box, not the event, making every downcast fail.
#[inline]
pub fn downcast_event<E: BusEvent>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Clone, Debug)]
    struct Ping {
        value: i32,
    }

    #[derive(Clone, Debug)]
    struct Pong;

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<Ping, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });

        bus.emit(Ping { value: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        bus.emit(Ping { value: 5 });
        assert_eq!(counter.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();

        bus.emit(Ping { value: 1 });
        bus.emit(Pong);

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert!(downcast_event::<Ping>(&events[0]).is_some());
        assert!(downcast_event::<Pong>(&events[1]).is_some());

        // Queue is empty after poll
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let bus = EventBus::new();
        let handle = bus.clone();

        handle.emit(Ping { value: 42 });
        let events = bus.poll();
        assert_eq!(events.len(), 1);
        assert_eq!(downcast_event::<Ping>(&events[0]).unwrap().value, 42);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<Ping, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });
        bus.emit(Ping { value: 10 });
        bus.unsubscribe_all::<Ping>();
        bus.emit(Ping { value: 10 });

        // Second emit had no subscriber, but still queued
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(bus.poll().len(), 2);
    }

    #[test]
    fn test_queue_eviction() {
        let bus = EventBus::new();
        for i in 0..(MAX_QUEUE_SIZE as i32 + 10) {
            bus.emit(Ping { value: i });
        }
        // Oldest half evicted once the ceiling was hit
        assert!(bus.queue_len() <= MAX_QUEUE_SIZE);
    }
}
