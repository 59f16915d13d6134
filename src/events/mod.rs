//! Event names, payloads and the [Dispatcher] that routes subscriptions either to plain
//! publish/subscribe or, for timed names like `away:5000`, also into the [TimedEventRegistry].

pub mod emitter;
pub mod key;
pub mod registry;

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::Status;

use self::{
    emitter::{deliver, EventEmitter, Listener},
    key::EventKey,
    registry::{TimedEventEntry, TimedEventRegistry},
};

pub const STATUS_CHANGE: &str = "status-change";
pub const STATUS_ONLINE: &str = "status:online";
pub const STATUS_AWAY: &str = "status:away";

/// Name of the event emitted right after a transition into `status`.
pub fn status_event_name(status: Status) -> &'static str {
    match status {
        Status::Online => STATUS_ONLINE,
        Status::Away => STATUS_AWAY,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous_status: Status,
    pub current_status: Status,
}

/// What a listener receives. Only `status-change` carries a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub name: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<StatusChange>,
}

impl Event {
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            change: None,
        }
    }

    pub fn status_change(change: StatusChange) -> Self {
        Self {
            name: STATUS_CHANGE.into(),
            change: Some(change),
        }
    }
}

/// An event paired with the listeners it is due for, captured while the dispatcher is
/// borrowed so that delivery can happen after the borrow (or lock) is released.
pub struct Emission {
    event: Event,
    listeners: Vec<Listener>,
}

impl Emission {
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn deliver(&self) {
        deliver(&self.listeners, &self.event);
    }
}

/// Subscribe/unsubscribe/emit facade. Owns the generic emitter and the timed registry and keeps
/// both in step.
#[derive(Default)]
pub struct Dispatcher {
    emitter: EventEmitter,
    timed: TimedEventRegistry,
}

impl Dispatcher {
    pub fn on(&mut self, name: &str, listener: Listener) {
        if let EventKey::Timed { status, threshold } = EventKey::parse(name) {
            debug!("Registering timed event {name}");
            self.timed.register(TimedEventEntry {
                status,
                threshold,
                name: name.into(),
                listener: listener.clone(),
            });
        }
        self.emitter.on(name, listener);
    }

    /// Unsubscribes `listener`. For timed names every timed entry with the same status and
    /// threshold is dropped, even ones registered by other listeners.
    pub fn off(&mut self, name: &str, listener: &Listener) {
        if let EventKey::Timed { status, threshold } = EventKey::parse(name) {
            let removed = self.timed.unregister(status, threshold);
            debug!("Removed {removed} timed entries for {name}");
        }
        self.emitter.off(name, listener);
    }

    /// Captures the listeners currently subscribed to the event's name.
    pub fn prepare(&self, event: Event) -> Emission {
        Emission {
            listeners: self.emitter.listeners(&event.name),
            event,
        }
    }

    /// Timed events that should fire given the user has been in `status` for `elapsed`. One
    /// emission per subscription name, in registration order, carrying the listener of every
    /// matching entry.
    pub fn due_timed_events(&self, status: Status, elapsed: Duration) -> Vec<Emission> {
        let mut due: Vec<Emission> = vec![];
        for entry in self.timed.entries_for_evaluation() {
            if !entry.is_due(status, elapsed) {
                continue;
            }
            match due.iter_mut().find(|v| v.event.name == entry.name) {
                Some(emission) => emission.listeners.push(entry.listener),
                None => due.push(Emission {
                    event: Event::named(entry.name),
                    listeners: vec![entry.listener],
                }),
            }
        }
        due
    }

    pub fn timed_subscription_count(&self) -> usize {
        self.timed.len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.emitter.listener_count(name)
    }

    /// Drops every subscription, plain and timed.
    pub fn clear(&mut self) {
        self.timed.clear();
        self.emitter.clear();
    }
}
