use std::{sync::Arc, time::Duration};

use crate::status::Status;

use super::emitter::Listener;

/// "Fire while continuously in `status` for at least `threshold`".
#[derive(Clone)]
pub struct TimedEventEntry {
    pub status: Status,
    pub threshold: Duration,
    /// The literal name the listener subscribed with; firings are emitted under it.
    pub name: Arc<str>,
    /// Receives the firing. An entry registered twice delivers twice.
    pub listener: Listener,
}

impl TimedEventEntry {
    pub fn is_due(&self, status: Status, elapsed: Duration) -> bool {
        self.status == status && elapsed >= self.threshold
    }
}

#[derive(Default)]
pub struct TimedEventRegistry {
    entries: Vec<TimedEventEntry>,
}

impl TimedEventRegistry {
    /// Appends an entry. Duplicates are kept and fire independently.
    pub fn register(&mut self, entry: TimedEventEntry) {
        self.entries.push(entry);
    }

    /// Removes every entry for `status` and `threshold`, whichever listener it belongs to.
    /// Returns how many entries were dropped.
    pub fn unregister(&mut self, status: Status, threshold: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.status == status && entry.threshold == threshold));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lazy iterator over a snapshot of the current entries. Clone it to walk the snapshot again.
    pub fn entries_for_evaluation(&self) -> impl Iterator<Item = TimedEventEntry> + Clone {
        self.entries.clone().into_iter()
    }
}
