//! Global event sources - scroll and touchmove.
//!
//! Handler registry keyed by subscription id. Subscribing hands back a
//! [`Subscription`]; dropping it removes the handler, so a registration
//! never outlives its owner.
//!
//! # Example
//!
//! ```ignore
//! let events = EventHub::new();
//! let subscription = events.subscribe(EventKinds::SCROLL | EventKinds::TOUCH_MOVE, |event| {
//!     println!("{event:?}");
//! });
//!
//! events.emit(GlobalEvent::Scroll);
//! drop(subscription); // unsubscribed
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

// =============================================================================
// TYPES
// =============================================================================

/// A global event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalEvent {
    /// The window scrolled.
    Scroll,
    /// A touch moved on the document.
    TouchMove,
}

bitflags! {
    /// Set of global events a handler listens to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventKinds: u8 {
        const SCROLL = 1 << 0;
        const TOUCH_MOVE = 1 << 1;
    }
}

impl GlobalEvent {
    pub fn kind(self) -> EventKinds {
        match self {
            Self::Scroll => EventKinds::SCROLL,
            Self::TouchMove => EventKinds::TOUCH_MOVE,
        }
    }
}

/// Handler for global events.
pub type EventHandler = Rc<dyn Fn(GlobalEvent)>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

#[derive(Default)]
struct HandlerRegistry {
    handlers: Vec<(usize, EventKinds, EventHandler)>,
    next_id: usize,
}

impl HandlerRegistry {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn contains(&self, id: usize) -> bool {
        self.handlers.iter().any(|(handler_id, _, _)| *handler_id == id)
    }
}

/// A live handler registration. Dropping it unsubscribes.
pub struct Subscription {
    id: usize,
    registry: Weak<RefCell<HandlerRegistry>>,
}

impl Subscription {
    /// Check if the handler is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().contains(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .handlers
                .retain(|(handler_id, _, _)| *handler_id != self.id);
        }
    }
}

/// Shared handle to the global event sources.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Rc<RefCell<HandlerRegistry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the given events.
    pub fn subscribe(&self, kinds: EventKinds, handler: impl Fn(GlobalEvent) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id();
        registry.handlers.push((id, kinds, Rc::new(handler)));
        Subscription { id, registry: Rc::downgrade(&self.registry) }
    }

    /// Dispatch an event to every matching handler.
    ///
    /// Handlers removed by an earlier handler in the same dispatch are
    /// skipped.
    pub fn emit(&self, event: GlobalEvent) {
        let targets: Vec<(usize, EventHandler)> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, kinds, _)| kinds.contains(event.kind()))
            .map(|(id, _, handler)| (*id, handler.clone()))
            .collect();

        for (id, handler) in targets {
            if self.registry.borrow().contains(id) {
                handler(event);
            }
        }
    }

    /// Number of handlers listening to `event`.
    pub fn listener_count(&self, event: GlobalEvent) -> usize {
        self.registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, kinds, _)| kinds.contains(event.kind()))
            .count()
    }
}
