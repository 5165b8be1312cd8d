//! Manager events for layers that render or observe the editor.
//!
//! Listeners run inside the manager operation that raised the event. They
//! may read from the manager, but mutating calls made from a listener fail
//! with [`Error::Reentrant`](crate::Error::Reentrant).

use std::cell::{Cell, RefCell};
use std::fmt;

/// Something observable happened to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    /// The schema was assembled
    SchemaChanged,
    /// The first editor state exists
    StateCreated,
    TransactionApplied { doc_changed: bool },
    /// Options or the extension set changed the plugin list
    PluginsReconfigured,
    ViewAttached,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ManagerEvent)>;

/// Listener list that tolerates subscribing and unsubscribing from inside
/// a listener.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next: Cell<u64>,
    /// Listeners currently taken out for an emit
    emitting: RefCell<Vec<SubscriptionId>>,
    cancelled: RefCell<Vec<SubscriptionId>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(&self, listener: impl FnMut(&ManagerEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next.get());
        self.next.set(self.next.get() + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|(l, _)| *l == id) {
            listeners.remove(index);
            return true;
        }
        let mut cancelled = self.cancelled.borrow_mut();
        if self.emitting.borrow().contains(&id) && !cancelled.contains(&id) {
            cancelled.push(id);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len() + self.emitting.borrow().len() - self.cancelled.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: ManagerEvent) {
        let mut taken = std::mem::take(&mut *self.listeners.borrow_mut());
        if taken.is_empty() {
            return;
        }
        *self.emitting.borrow_mut() = taken.iter().map(|(id, _)| *id).collect();
        tracing::trace!(?event, listeners = taken.len(), "Emitting manager event");

        for (id, listener) in taken.iter_mut() {
            if !self.cancelled.borrow().contains(id) {
                listener(&event);
            }
        }

        let cancelled = std::mem::take(&mut *self.cancelled.borrow_mut());
        taken.retain(|(id, _)| !cancelled.contains(id));
        self.emitting.borrow_mut().clear();
        let mut listeners = self.listeners.borrow_mut();
        // Subscriptions made while emitting go after the existing ones
        taken.append(&mut listeners);
        *listeners = taken;
    }
}
