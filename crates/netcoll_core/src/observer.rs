//! Synchronous change notification.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// Ordered list of listeners invoked synchronously on every event.
///
/// Listeners run in registration order. A listener must not mutate the
/// collection that notified it.
pub struct ObserverChannel<E> {
    listeners: Vec<(ObserverId, Listener<E>)>,
    next_id: u64,
    removals: Arc<Mutex<Vec<ObserverId>>>,
}

impl<E> ObserverChannel<E> {
    /// Creates a channel with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            removals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers a listener and returns its handle.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Returns a handle that removes `id` later, even from inside a listener.
    ///
    /// The removal is queued and takes effect once the current
    /// notification round (if any) finishes.
    pub fn unsubscriber(&self, id: ObserverId) -> Unsubscriber {
        Unsubscriber {
            id,
            queue: Arc::clone(&self.removals),
        }
    }

    /// Invokes every listener with `event`.
    pub fn notify(&mut self, event: &E) {
        self.apply_removals();
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
        self.apply_removals();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn apply_removals(&mut self) {
        let queued = std::mem::take(&mut *self.removals.lock());
        if !queued.is_empty() {
            self.listeners.retain(|(id, _)| !queued.contains(id));
        }
    }
}

impl<E> Default for ObserverChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ObserverChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Deferred removal of one listener.
#[derive(Debug, Clone)]
pub struct Unsubscriber {
    id: ObserverId,
    queue: Arc<Mutex<Vec<ObserverId>>>,
}

impl Unsubscriber {
    /// The listener this handle removes.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Queues the removal.
    pub fn unsubscribe(&self) {
        let mut queue = self.queue.lock();
        if !queue.contains(&self.id) {
            queue.push(self.id);
        }
    }
}
