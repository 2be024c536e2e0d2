//! Inventory change signals
//!
//! Listeners are called synchronously, in registration order, after the
//! mutation that triggered the signal has been fully committed.

use std::fmt;

/// Signal emitted by an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventorySignal {
    /// Something changed; re-read the items
    Updated,
    /// No slot holds a positive quantity anymore
    Empty,
}

/// Receives inventory signals
pub trait InventoryListener: Send {
    fn on_signal(&mut self, signal: InventorySignal);
}

impl<F> InventoryListener for F
where
    F: FnMut(InventorySignal) + Send,
{
    fn on_signal(&mut self, signal: InventorySignal) {
        (*self)(signal)
    }
}

/// Handle returned by [`SignalHub::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the raw ID value
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Listener entry in the hub
struct ListenerEntry {
    id: ListenerId,
    listener: Box<dyn InventoryListener>,
}

/// Ordered list of listeners
#[derive(Default)]
pub struct SignalHub {
    listeners: Vec<ListenerEntry>,
    next_id: u64,
    emitted: u64,
}

impl SignalHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&mut self, listener: impl InventoryListener + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(ListenerEntry {
            id,
            listener: Box::new(listener),
        });
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|entry| entry.id != id);
        self.listeners.len() != before
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|entry| entry.id == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total signals emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Deliver a signal to every listener
    pub fn emit(&mut self, signal: InventorySignal) {
        self.emitted += 1;
        for entry in &mut self.listeners {
            entry.listener.on_signal(signal);
        }
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHub")
            .field("listeners", &self.listeners.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}
