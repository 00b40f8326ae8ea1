//! Pending change events awaiting the next flush.

use crate::event::ChangeEvent;

/// Ordered buffer of events recorded since the last flush.
///
/// # Invariants
///
/// - Insertion order is mutation order
/// - Empty after construction and after every reset
/// - Owned by exactly one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog<T> {
    events: Vec<ChangeEvent<T>>,
}

impl<T> EventLog<T> {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event and returns a reference to it.
    pub fn push(&mut self, event: ChangeEvent<T>) -> &ChangeEvent<T> {
        self.events.push(event);
        let last = self.events.len() - 1;
        &self.events[last]
    }

    /// Returns the pending events in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent<T>> {
        self.events.iter()
    }

    /// Returns the pending events as a slice.
    pub fn as_slice(&self) -> &[ChangeEvent<T>] {
        &self.events
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        Self::new()
    }
}
