//! Dirty tracking for replicated collections.
//!
//! A collection is dirty for one of two reasons: per-element events are
//! waiting in its [`EventLog`], or the whole value was flagged for a full
//! resync. The two are kept side by side in a [`DirtyState`] and queried
//! with the free functions [`is_dirty`] and [`reset`].

use crate::event::ChangeEvent;
use crate::log::EventLog;

/// Combined whole-value flag and per-element event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyState<T> {
    /// Set when the entire value must be resent as a snapshot.
    pub whole_value: bool,
    /// Per-element events recorded since the last flush.
    pub log: EventLog<T>,
}

impl<T> DirtyState<T> {
    /// Creates a clean state.
    pub fn new() -> Self {
        Self {
            whole_value: false,
            log: EventLog::new(),
        }
    }

    /// Appends a per-element event.
    pub fn record(&mut self, event: ChangeEvent<T>) -> &ChangeEvent<T> {
        self.log.push(event)
    }

    /// Flags the whole value for a full snapshot.
    pub fn mark_whole_value(&mut self) {
        self.whole_value = true;
    }
}

impl<T> Default for DirtyState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if the whole-value flag is set or events are pending.
pub fn is_dirty<T>(state: &DirtyState<T>) -> bool {
    state.whole_value || !state.log.is_empty()
}

/// Clears the whole-value flag and empties the log.
pub fn reset<T>(state: &mut DirtyState<T>) {
    state.whole_value = false;
    state.log.clear();
}
