//! Test fixtures and replication helpers.
//!
//! Provides bindings wired to an inspectable scheduler, observers that
//! record every event, and a loopback that plays the role of the tick
//! driver plus transport between two variables.

use netcoll_codec::{DeltaReader, DeltaWriter, ElementCodec};
use netcoll_core::{
    ChangeEvent, ClientId, CoreResult, DeltaReport, EntityBinding, EntityId, FlushScheduler,
    NetworkVariable, ObserverId, ReplicatedArray, ReplicatedList, TickScheduler,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Creates a binding for an entity owned and written by the server.
pub fn server_binding(entity: u64) -> (EntityBinding, Arc<TickScheduler>) {
    client_binding(entity, ClientId::SERVER, ClientId::SERVER)
}

/// Creates a binding for `entity` owned by `owner`, seen from `local`.
pub fn client_binding(
    entity: u64,
    owner: ClientId,
    local: ClientId,
) -> (EntityBinding, Arc<TickScheduler>) {
    let scheduler = Arc::new(TickScheduler::new());
    let binding = EntityBinding::new(
        EntityId::new(entity),
        owner,
        local,
        Arc::clone(&scheduler) as Arc<dyn FlushScheduler>,
    );
    (binding, scheduler)
}

/// Encodes the pending changes of `source` without clearing them.
pub fn encode_delta(source: &dyn NetworkVariable) -> CoreResult<Vec<u8>> {
    let mut writer = DeltaWriter::new();
    source.write_delta(&mut writer)?;
    Ok(writer.into_vec())
}

/// Flushes `source` the way a tick driver would: write, then reset.
pub fn flush(source: &mut dyn NetworkVariable) -> CoreResult<Vec<u8>> {
    let bytes = encode_delta(source)?;
    source.reset_dirty();
    Ok(bytes)
}

/// Flushes `source` and applies the message to `replica`.
pub fn replicate(
    source: &mut dyn NetworkVariable,
    replica: &mut dyn NetworkVariable,
) -> CoreResult<DeltaReport> {
    let bytes = flush(source)?;
    replica.read_delta(&mut DeltaReader::new(&bytes), false)
}

/// Collects every event a variable emits.
#[derive(Debug)]
pub struct EventRecorder<T> {
    events: Rc<RefCell<Vec<ChangeEvent<T>>>>,
    id: ObserverId,
}

impl<T: Clone + 'static> EventRecorder<T> {
    /// Attaches a recorder to a list.
    pub fn attach_list<C: ElementCodec<T>>(list: &mut ReplicatedList<T, C>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let id = list.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self { events, id }
    }

    /// Attaches a recorder to an array.
    pub fn attach_array<C: ElementCodec<T>>(array: &mut ReplicatedArray<T, C>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let id = array.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self { events, id }
    }

    /// Subscription id, for unsubscribing.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Events seen so far.
    pub fn events(&self) -> Vec<ChangeEvent<T>> {
        self.events.borrow().clone()
    }

    /// Number of events seen so far.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns true if nothing was seen.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcoll_core::ReplicationSettings;

    #[test]
    fn replicate_clears_source() {
        let (binding, scheduler) = server_binding(4);
        let mut source: ReplicatedList<u8> =
            ReplicatedList::new(binding.clone(), ReplicationSettings::default());
        let mut replica: ReplicatedList<u8> =
            ReplicatedList::new(binding, ReplicationSettings::default());
        let recorder = EventRecorder::attach_list(&mut replica);

        source.add(1).unwrap();
        assert_eq!(scheduler.drain(), vec![EntityId::new(4)]);

        let report = replicate(&mut source, &mut replica).unwrap();
        assert_eq!(report.applied, 1);
        assert!(!source.is_dirty());
        assert_eq!(recorder.events(), vec![ChangeEvent::Add { index: 0, value: 1 }]);
    }

    #[test]
    fn client_binding_fields() {
        let (binding, _) = client_binding(2, ClientId::new(5), ClientId::new(6));
        assert_eq!(binding.entity, EntityId::new(2));
        assert_eq!(binding.owner, ClientId::new(5));
        assert_eq!(binding.local_client, ClientId::new(6));
    }
}
