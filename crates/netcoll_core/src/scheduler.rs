//! Flush scheduling.
//!
//! Collections never flush themselves. When they become dirty they ask a
//! [`FlushScheduler`] to include their entity in the next outbound tick,
//! and the tick driver later calls `write_delta` and `reset_dirty`.

use crate::types::EntityId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives requests to flush an entity on the next tick.
pub trait FlushScheduler: Send + Sync {
    /// Requests that `entity` be flushed.
    ///
    /// Repeated requests before the next flush must collapse into one.
    fn request_flush(&self, entity: EntityId);
}

/// Scheduler that collects requests until the driver drains them.
#[derive(Debug, Default)]
pub struct TickScheduler {
    pending: Mutex<Vec<EntityId>>,
    requests: AtomicU64,
}

impl TickScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the entities awaiting a flush, in first-request order.
    pub fn drain(&self) -> Vec<EntityId> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Returns true if `entity` is awaiting a flush.
    pub fn is_pending(&self, entity: EntityId) -> bool {
        self.pending.lock().contains(&entity)
    }

    /// Number of distinct entities awaiting a flush.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Total requests received, including collapsed duplicates.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl FlushScheduler for TickScheduler {
    fn request_flush(&self, entity: EntityId) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.pending.lock();
        if !pending.contains(&entity) {
            pending.push(entity);
        }
    }
}

/// Scheduler that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl FlushScheduler for NoopScheduler {
    fn request_flush(&self, _entity: EntityId) {}
}
