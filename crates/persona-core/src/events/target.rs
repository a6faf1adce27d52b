//! Flat listener registry

use super::EventLike;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Listener invoked with every dispatched event of the registered type.
pub type EventListener = Arc<dyn Fn(&dyn EventLike) + Send + Sync>;

/// Identifies a registration for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    event_type: String,
    listener: EventListener,
}

/// Something events can be dispatched to.
#[derive(Default)]
pub struct EventTarget {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl EventTarget {
    /// Create a target with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events whose type equals `event_type` exactly.
    pub fn add_event_listener(
        &self,
        event_type: impl Into<String>,
        listener: impl Fn(&dyn EventLike) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration {
            id,
            event_type: event_type.into(),
            listener: Arc::new(listener),
        });
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id);
        listeners.len() != before
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|registration| registration.event_type == event_type)
            .count()
    }

    /// Deliver `event` to matching listeners in registration order.
    ///
    /// Returns `false` when the event is cancelable and a listener called
    /// `prevent_default`, `true` otherwise.
    pub fn dispatch_event(&self, event: &dyn EventLike) -> bool {
        // Snapshot so listeners may add or remove registrations while running.
        let matching: Vec<EventListener> = self
            .listeners
            .lock()
            .iter()
            .filter(|registration| registration.event_type == event.event_type())
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        tracing::trace!(
            event_type = event.event_type(),
            listeners = matching.len(),
            "dispatching event"
        );

        for listener in matching {
            listener(event);
        }

        !(event.cancelable() && event.default_prevented())
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
