use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use tracing::error;

use super::Event;

/// A subscriber callback. Two listeners are the same listener when they point at the same
/// allocation, so keep the [Arc] around if you intend to unsubscribe later.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Plain name based publish/subscribe. Listeners for a name are kept in registration order.
#[derive(Default)]
pub struct EventEmitter {
    listeners: HashMap<Arc<str>, Vec<Listener>>,
}

impl EventEmitter {
    pub fn on(&mut self, name: &str, listener: Listener) {
        self.listeners
            .entry(Arc::from(name))
            .or_default()
            .push(listener);
    }

    /// Removes the most recently added registration of `listener` under `name`.
    pub fn off(&mut self, name: &str, listener: &Listener) -> bool {
        let Some(registered) = self.listeners.get_mut(name) else {
            return false;
        };
        let Some(position) = registered.iter().rposition(|v| Arc::ptr_eq(v, listener)) else {
            return false;
        };
        registered.remove(position);
        if registered.is_empty() {
            self.listeners.remove(name);
        }
        true
    }

    /// Snapshot of the listeners currently registered under `name`.
    pub fn listeners(&self, name: &str) -> Vec<Listener> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

/// Calls every listener in order. A panicking listener is logged and skipped so that the rest
/// still receive the event.
pub fn deliver(listeners: &[Listener], event: &Event) {
    for listener in listeners {
        if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
            error!("Listener for '{}' panicked", event.name);
        }
    }
}
