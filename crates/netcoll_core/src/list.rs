//! Variable-length replicated list.

use crate::config::ReplicationSettings;
use crate::error::{CoreError, CoreResult};
use crate::event::{ChangeEvent, EventKind};
use crate::observer::{ObserverId, Unsubscriber};
use crate::permission::PermissionPolicy;
use crate::types::{ClientId, EntityId};
use crate::variable::{DeltaReport, EntityBinding, NetworkVariable, ReplicationCore};
use crate::wire::{self, CollectionKind, WireEvent, MAX_COLLECTION_LEN};
use netcoll_codec::{DeltaReader, DeltaWriter, ElementCodec, NativeCodec};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Result of applying one received event.
enum Applied {
    Changed,
    Ignored,
}

/// A replicated list of any length.
///
/// Every mutator checks write permission first, then changes local storage,
/// then records the matching [`ChangeEvent`], notifies observers and asks
/// the scheduler for a flush.
pub struct ReplicatedList<T, C = NativeCodec> {
    items: Vec<T>,
    core: ReplicationCore<T, C>,
}

impl<T, C> ReplicatedList<T, C>
where
    C: ElementCodec<T> + Default,
{
    /// Creates an empty list.
    pub fn new(binding: EntityBinding, settings: ReplicationSettings) -> Self {
        Self {
            items: Vec::new(),
            core: ReplicationCore::new(CollectionKind::List, binding, settings, C::default()),
        }
    }

    /// Creates a list holding `items`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionTooLarge`] if there are more items
    /// than a snapshot can carry.
    pub fn from_items(
        binding: EntityBinding,
        settings: ReplicationSettings,
        items: impl IntoIterator<Item = T>,
    ) -> CoreResult<Self> {
        Self::with_codec(binding, settings, C::default(), items.into_iter().collect())
    }
}

impl<T, C: ElementCodec<T>> ReplicatedList<T, C> {
    /// Creates a list with an explicit element codec.
    pub fn with_codec(
        binding: EntityBinding,
        settings: ReplicationSettings,
        codec: C,
        items: Vec<T>,
    ) -> CoreResult<Self> {
        if items.len() > MAX_COLLECTION_LEN {
            return Err(CoreError::CollectionTooLarge { len: items.len() });
        }
        Ok(Self {
            items,
            core: ReplicationCore::new(CollectionKind::List, binding, settings, codec),
        })
    }

    /// Fails if one more element would not fit in a snapshot.
    fn ensure_room(&self) -> CoreResult<()> {
        if self.items.len() >= MAX_COLLECTION_LEN {
            return Err(CoreError::CollectionTooLarge {
                len: self.items.len() + 1,
            });
        }
        Ok(())
    }

    /// Replaces the permission policy derived from the settings.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn PermissionPolicy>) -> Self {
        self.core.set_policy(policy);
        self
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent<T>) + 'static) -> ObserverId {
        self.core.subscribe(listener)
    }

    /// Removes a change listener.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.core.unsubscribe(id)
    }

    /// Returns a deferred-removal handle usable from inside a listener.
    pub fn unsubscriber(&self, id: ObserverId) -> Unsubscriber {
        self.core.unsubscriber(id)
    }

    /// Events recorded since the last flush.
    pub fn pending_events(&self) -> &[ChangeEvent<T>] {
        self.core.dirty_state().log.as_slice()
    }

    /// True if a full resync is pending.
    pub fn is_full_resync_pending(&self) -> bool {
        self.core.dirty_state().whole_value
    }
}

impl<T, C> ReplicatedList<T, C>
where
    T: Clone + PartialEq,
    C: ElementCodec<T>,
{
    /// Appends `value`.
    ///
    /// Fails with [`CoreError::CollectionTooLarge`] once the list holds
    /// `u16::MAX` elements.
    pub fn add(&mut self, value: T) -> CoreResult<()> {
        self.core.ensure_writable()?;
        self.ensure_room()?;
        self.items.push(value.clone());
        let index = self.items.len() - 1;
        self.core.record(ChangeEvent::Add { index, value });
        Ok(())
    }

    /// Inserts `value` at `index`, shifting later elements right.
    ///
    /// `index == len()` appends.
    pub fn insert(&mut self, index: usize, value: T) -> CoreResult<()> {
        self.core.ensure_writable()?;
        self.ensure_room()?;
        if index > self.items.len() {
            return Err(CoreError::out_of_range(index, self.items.len()));
        }
        self.items.insert(index, value.clone());
        self.core.record(ChangeEvent::Insert { index, value });
        Ok(())
    }

    /// Removes the first element equal to `value`.
    ///
    /// Returns `Ok(false)` without recording anything if no element matches.
    pub fn remove(&mut self, value: &T) -> CoreResult<bool> {
        self.core.ensure_writable()?;
        let Some(index) = self.index_of(value) else {
            trace!(entity = %self.core.entity(), "remove target not present");
            return Ok(false);
        };
        let value = self.items.remove(index);
        self.core.record(ChangeEvent::Remove { index, value });
        Ok(true)
    }

    /// Removes and returns the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> CoreResult<T> {
        self.core.ensure_writable()?;
        if index >= self.items.len() {
            return Err(CoreError::out_of_range(index, self.items.len()));
        }
        let value = self.items.remove(index);
        self.core.record(ChangeEvent::RemoveAt {
            index,
            value: value.clone(),
        });
        Ok(value)
    }

    /// Overwrites the element at `index` and returns the value it held.
    pub fn set(&mut self, index: usize, value: T) -> CoreResult<T> {
        self.core.ensure_writable()?;
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(CoreError::out_of_range(index, len))?;
        let previous_value = std::mem::replace(slot, value.clone());
        self.core.record(ChangeEvent::SetValue {
            index,
            value,
            previous_value: previous_value.clone(),
        });
        Ok(previous_value)
    }

    /// Removes every element.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.core.ensure_writable()?;
        self.items.clear();
        self.core.record(ChangeEvent::Clear);
        Ok(())
    }

    fn apply(&mut self, event: WireEvent<T>, relay: bool) -> CoreResult<Applied> {
        let len = self.items.len();
        match event {
            WireEvent::Add(value) => {
                if let Err(error) = self.ensure_room() {
                    return Err(self.core.desync(error));
                }
                self.items.push(value.clone());
                self.core.applied(ChangeEvent::Add { index: len, value }, relay);
            }
            WireEvent::Insert { index, value } => {
                if index > len {
                    return Err(self
                        .core
                        .desync(CoreError::desync(EventKind::Insert, index, len)));
                }
                if let Err(error) = self.ensure_room() {
                    return Err(self.core.desync(error));
                }
                self.items.insert(index, value.clone());
                self.core.applied(ChangeEvent::Insert { index, value }, relay);
            }
            WireEvent::Remove(value) => {
                let Some(index) = self.index_of(&value) else {
                    trace!(entity = %self.core.entity(), "remove target not present");
                    return Ok(Applied::Ignored);
                };
                let value = self.items.remove(index);
                self.core.applied(ChangeEvent::Remove { index, value }, relay);
            }
            WireEvent::RemoveAt { index } => {
                if index >= len {
                    return Err(self
                        .core
                        .desync(CoreError::desync(EventKind::RemoveAt, index, len)));
                }
                let value = self.items.remove(index);
                self.core.applied(ChangeEvent::RemoveAt { index, value }, relay);
            }
            WireEvent::SetValue { index, value } => {
                let Some(slot) = self.items.get_mut(index) else {
                    return Err(self
                        .core
                        .desync(CoreError::desync(EventKind::SetValue, index, len)));
                };
                let previous_value = std::mem::replace(slot, value.clone());
                self.core.applied(
                    ChangeEvent::SetValue {
                        index,
                        value,
                        previous_value,
                    },
                    relay,
                );
            }
            WireEvent::Clear => {
                self.items.clear();
                self.core.applied(ChangeEvent::Clear, relay);
            }
            WireEvent::Full(items) => {
                self.items = items;
                self.core.applied_full(relay);
            }
        }
        Ok(Applied::Changed)
    }
}

impl<T, C> ReplicatedList<T, C> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterates the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns true if any element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.contains(value)
    }

    /// Returns the index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.iter().position(|item| item == value)
    }
}

impl<'a, T, C> IntoIterator for &'a ReplicatedList<T, C> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T, C> NetworkVariable for ReplicatedList<T, C>
where
    T: Clone + PartialEq,
    C: ElementCodec<T>,
{
    fn entity(&self) -> EntityId {
        self.core.entity()
    }

    fn settings(&self) -> &ReplicationSettings {
        self.core.settings()
    }

    fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    fn set_dirty(&mut self) {
        self.core.set_dirty();
    }

    fn reset_dirty(&mut self) {
        self.core.reset_dirty();
    }

    fn reset_dirty_at(&mut self, tick: u64) {
        self.core.reset_dirty_at(tick);
    }

    fn should_write(&self, tick: u64) -> bool {
        self.core.should_write(tick)
    }

    fn request_flush(&self) {
        self.core.request_flush();
    }

    fn can_write(&self, client: ClientId) -> bool {
        self.core.can_write(client)
    }

    fn can_read(&self, client: ClientId) -> bool {
        self.core.can_read(client)
    }

    fn write_delta(&self, writer: &mut DeltaWriter) -> CoreResult<()> {
        self.core.write_delta(writer, &self.items)
    }

    fn read_delta(&mut self, reader: &mut DeltaReader<'_>, relay: bool) -> CoreResult<DeltaReport> {
        let count = wire::read_event_count(reader)?;
        let mut report = DeltaReport {
            received: usize::from(count),
            ..DeltaReport::default()
        };
        for _ in 0..count {
            let event = wire::read_event(reader, self.core.codec(), CollectionKind::List)?;
            match self.apply(event, relay)? {
                Applied::Changed => report.applied += 1,
                Applied::Ignored => report.ignored += 1,
            }
        }
        self.core.finish_read(&report);
        Ok(report)
    }

    fn write_snapshot(&self, writer: &mut DeltaWriter) -> CoreResult<()> {
        wire::write_snapshot(writer, self.core.codec(), &self.items)
    }

    fn read_snapshot(&mut self, reader: &mut DeltaReader<'_>) -> CoreResult<()> {
        self.items = wire::read_snapshot(reader, self.core.codec())?;
        Ok(())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ReplicatedList<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicatedList")
            .field("items", &self.items)
            .field("core", &self.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use crate::scheduler::{FlushScheduler, TickScheduler};
    use netcoll_codec::CborCodec;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn binding_for(local: ClientId, scheduler: &Arc<TickScheduler>) -> EntityBinding {
        EntityBinding::new(
            EntityId::new(7),
            ClientId::new(2),
            local,
            Arc::clone(scheduler) as Arc<dyn FlushScheduler>,
        )
    }

    fn list(items: &[i32]) -> (ReplicatedList<i32>, Arc<TickScheduler>) {
        let scheduler = Arc::new(TickScheduler::new());
        let list = ReplicatedList::from_items(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::default(),
            items.iter().copied(),
        )
        .unwrap();
        (list, scheduler)
    }

    fn flush<T: Clone + PartialEq, C: ElementCodec<T>>(list: &mut ReplicatedList<T, C>) -> Vec<u8> {
        let mut writer = DeltaWriter::new();
        list.write_delta(&mut writer).unwrap();
        list.reset_dirty();
        writer.into_vec()
    }

    fn recorder(list: &mut ReplicatedList<i32>) -> Rc<RefCell<Vec<ChangeEvent<i32>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        list.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn mutators_record_events() {
        let (mut list, scheduler) = list(&[]);
        list.add(1).unwrap();
        list.add(3).unwrap();
        list.insert(1, 2).unwrap();
        assert_eq!(list.set(0, 10).unwrap(), 1);
        assert_eq!(list.as_slice(), &[10, 2, 3]);
        assert_eq!(
            list.pending_events(),
            &[
                ChangeEvent::Add { index: 0, value: 1 },
                ChangeEvent::Add { index: 1, value: 3 },
                ChangeEvent::Insert { index: 1, value: 2 },
                ChangeEvent::SetValue {
                    index: 0,
                    value: 10,
                    previous_value: 1
                },
            ]
        );
        assert_eq!(scheduler.request_count(), 4);
        assert_eq!(scheduler.drain(), vec![EntityId::new(7)]);
    }

    #[test]
    fn growth_stops_at_snapshot_limit() {
        let scheduler = Arc::new(TickScheduler::new());
        let mut list: ReplicatedList<u8> = ReplicatedList::from_items(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::default(),
            vec![0; MAX_COLLECTION_LEN],
        )
        .unwrap();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        list.subscribe(move |_| *counter.borrow_mut() += 1);

        let too_large = CoreError::CollectionTooLarge {
            len: MAX_COLLECTION_LEN + 1,
        };
        assert_eq!(list.add(1), Err(too_large.clone()));
        assert_eq!(list.insert(0, 1), Err(too_large));
        assert_eq!(list.len(), MAX_COLLECTION_LEN);
        assert!(!list.is_dirty());
        assert_eq!(*seen.borrow(), 0);
        assert_eq!(scheduler.request_count(), 0);

        // Shrinking makes room again, and the full snapshot still fits.
        list.remove_at(0).unwrap();
        list.add(1).unwrap();
        list.set_dirty();
        let mut writer = DeltaWriter::new();
        list.write_delta(&mut writer).unwrap();
    }

    #[test]
    fn oversized_seed_rejected() {
        let scheduler = Arc::new(TickScheduler::new());
        let result: CoreResult<ReplicatedList<u8>> = ReplicatedList::from_items(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::default(),
            vec![0; MAX_COLLECTION_LEN + 1],
        );
        assert_eq!(
            result.err(),
            Some(CoreError::CollectionTooLarge {
                len: MAX_COLLECTION_LEN + 1
            })
        );
    }

    #[test]
    fn received_add_past_snapshot_limit_rejected() {
        let (mut source, _) = list(&[]);
        source.add(9).unwrap();
        let bytes = flush(&mut source);

        let scheduler = Arc::new(TickScheduler::new());
        let mut replica: ReplicatedList<i32> = ReplicatedList::from_items(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::default(),
            vec![0; MAX_COLLECTION_LEN],
        )
        .unwrap();
        assert_eq!(
            replica.read_delta(&mut DeltaReader::new(&bytes), false),
            Err(CoreError::CollectionTooLarge {
                len: MAX_COLLECTION_LEN + 1
            })
        );
        assert_eq!(replica.len(), MAX_COLLECTION_LEN);
    }

    #[test]
    fn insert_at_len_appends() {
        let (mut list, _) = list(&[1]);
        list.insert(1, 2).unwrap();
        assert_eq!(list.as_slice(), &[1, 2]);
        assert_eq!(list.insert(5, 9), Err(CoreError::out_of_range(5, 2)));
    }

    #[test]
    fn remove_at_roundtrip() {
        let (mut source, _) = list(&[1, 2, 3]);
        let (mut replica, _) = list(&[1, 2, 3]);

        assert_eq!(source.remove_at(1).unwrap(), 2);
        assert_eq!(
            source.pending_events(),
            &[ChangeEvent::RemoveAt { index: 1, value: 2 }]
        );
        let bytes = flush(&mut source);
        assert_eq!(bytes, vec![1, 0, 3, 1, 0, 0, 0]);

        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &[1, 3]);
    }

    #[test]
    fn remove_by_value_sends_only_the_value() {
        let (mut source, _) = list(&[1, 2, 3]);
        assert!(source.remove(&2).unwrap());
        assert_eq!(source.as_slice(), &[1, 3]);
        assert_eq!(
            source.pending_events(),
            &[ChangeEvent::Remove { index: 1, value: 2 }]
        );

        let bytes = flush(&mut source);
        assert_eq!(bytes, vec![1, 0, 2, 2, 0, 0, 0]);

        // The receiver resolves the index on its own.
        let (mut replica, _) = list(&[2, 1, 2, 3]);
        let seen = recorder(&mut replica);
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &[1, 2, 3]);
        assert_eq!(
            seen.borrow().as_slice(),
            &[ChangeEvent::Remove { index: 0, value: 2 }]
        );
    }

    #[test]
    fn remove_missing_value_is_silent() {
        let (mut list, scheduler) = list(&[1, 3]);
        let seen = recorder(&mut list);
        assert!(!list.remove(&99).unwrap());
        assert_eq!(list.as_slice(), &[1, 3]);
        assert!(!list.is_dirty());
        assert!(seen.borrow().is_empty());
        assert_eq!(scheduler.request_count(), 0);
    }

    #[test]
    fn received_remove_of_absent_value_is_ignored() {
        let (mut source, _) = list(&[5]);
        source.remove(&5).unwrap();
        let bytes = flush(&mut source);

        let (mut replica, scheduler) = list(&[1, 3]);
        let seen = recorder(&mut replica);
        let report = replica
            .read_delta(&mut DeltaReader::new(&bytes), true)
            .unwrap();

        assert_eq!(report.received, 1);
        assert_eq!(report.applied, 0);
        assert_eq!(report.ignored, 1);
        assert_eq!(replica.as_slice(), &[1, 3]);
        assert!(!replica.is_dirty());
        assert!(seen.borrow().is_empty());
        assert_eq!(scheduler.request_count(), 0);
    }

    #[test]
    fn remove_at_past_end_is_a_desync() {
        let (mut source, _) = list(&[1, 2, 3]);
        source.remove_at(2).unwrap();
        let bytes = flush(&mut source);

        let (mut replica, _) = list(&[1, 2]);
        let err = replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap_err();
        assert_eq!(err, CoreError::desync(EventKind::RemoveAt, 2, 2));
        assert!(err.is_protocol_violation());
        assert_eq!(replica.as_slice(), &[1, 2]);
    }

    #[test]
    fn desync_stops_the_batch() {
        let (mut source, _) = list(&[1, 2, 3]);
        source.add(4).unwrap();
        source.set(3, 40).unwrap();
        source.add(5).unwrap();
        let bytes = flush(&mut source);

        let (mut replica, _) = list(&[]);
        let err = replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap_err();
        assert_eq!(err, CoreError::desync(EventKind::SetValue, 3, 1));
        assert_eq!(replica.as_slice(), &[4]);
    }

    #[test]
    fn insert_order_is_preserved() {
        let (mut source, _) = list(&[]);
        let (mut replica, _) = list(&[]);
        source.insert(0, 1).unwrap();
        source.insert(0, 2).unwrap();
        let bytes = flush(&mut source);
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &[2, 1]);
    }

    #[test]
    fn insert_without_permission_changes_nothing() {
        let scheduler = Arc::new(TickScheduler::new());
        let settings = ReplicationSettings::new().write_permission(Permission::OwnerOnly);
        let mut list: ReplicatedList<i32> = ReplicatedList::from_items(
            binding_for(ClientId::new(5), &scheduler),
            settings,
            [1, 2],
        )
        .unwrap();
        let seen = recorder(&mut list);

        let err = list.insert(0, 9).unwrap_err();
        assert_eq!(
            err,
            CoreError::WriteNotPermitted {
                client: ClientId::new(5),
                entity: EntityId::new(7)
            }
        );
        assert_eq!(list.as_slice(), &[1, 2]);
        assert!(list.pending_events().is_empty());
        assert!(seen.borrow().is_empty());
        assert_eq!(scheduler.request_count(), 0);
    }

    #[test]
    fn owner_may_write() {
        let scheduler = Arc::new(TickScheduler::new());
        let settings = ReplicationSettings::new().write_permission(Permission::OwnerOnly);
        let mut list: ReplicatedList<i32> =
            ReplicatedList::new(binding_for(ClientId::new(2), &scheduler), settings);
        list.add(1).unwrap();
        assert!(list.can_write(ClientId::new(2)));
        assert!(!list.can_write(ClientId::SERVER));
    }

    #[test]
    fn full_replaces_contents_and_clears_pending() {
        let (mut source, _) = list(&[4, 5, 6]);
        source.add(7).unwrap();
        source.set_dirty();
        let bytes = flush(&mut source);
        assert_eq!(bytes, vec![1, 0, 6, 4, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0, 7, 0, 0, 0]);

        let (mut replica, _) = list(&[9]);
        replica.add(8).unwrap();
        let seen = recorder(&mut replica);
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &[4, 5, 6, 7]);
        assert!(!replica.is_dirty());
        assert_eq!(seen.borrow().as_slice(), &[ChangeEvent::Full]);

        // Applying the same snapshot again changes nothing.
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &[4, 5, 6, 7]);
    }

    #[test]
    fn relayed_full_forces_downstream_resync() {
        let (mut source, _) = list(&[1, 2]);
        source.set_dirty();
        let bytes = flush(&mut source);

        let (mut relay, scheduler) = list(&[]);
        relay
            .read_delta(&mut DeltaReader::new(&bytes), true)
            .unwrap();
        assert!(relay.is_full_resync_pending());
        assert!(scheduler.is_pending(EntityId::new(7)));
        assert_eq!(flush(&mut relay), bytes);
    }

    #[test]
    fn receive_uses_configured_relay() {
        let (mut source, _) = list(&[]);
        source.add(1).unwrap();
        let bytes = flush(&mut source);

        let scheduler = Arc::new(TickScheduler::new());
        let mut relay: ReplicatedList<i32> = ReplicatedList::new(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::new().relay_received(true),
        );
        relay.receive(&mut DeltaReader::new(&bytes)).unwrap();
        assert_eq!(
            relay.pending_events(),
            &[ChangeEvent::Add { index: 0, value: 1 }]
        );
    }

    #[test]
    fn clear_roundtrip() {
        let (mut source, _) = list(&[1, 2]);
        let (mut replica, _) = list(&[1, 2]);
        source.clear().unwrap();
        let bytes = flush(&mut source);
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert!(replica.is_empty());
    }

    #[test]
    fn unknown_tag_rejected() {
        let (mut replica, _) = list(&[]);
        let bytes = [1u8, 0, 42];
        assert_eq!(
            replica.read_delta(&mut DeltaReader::new(&bytes), false),
            Err(CoreError::UnknownEventTag(42))
        );
    }

    #[test]
    fn cbor_elements_roundtrip() {
        let scheduler = Arc::new(TickScheduler::new());
        let binding = binding_for(ClientId::SERVER, &scheduler);
        let mut source: ReplicatedList<String, CborCodec> =
            ReplicatedList::new(binding.clone(), ReplicationSettings::default());
        let mut replica: ReplicatedList<String, CborCodec> =
            ReplicatedList::new(binding, ReplicationSettings::default());

        source.add("alpha".to_string()).unwrap();
        source.insert(0, "beta".to_string()).unwrap();
        let bytes = flush(&mut source);
        replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(replica.as_slice(), &["beta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn snapshot_does_not_notify() {
        let (source, _) = list(&[3, 1]);
        let mut writer = DeltaWriter::new();
        source.write_snapshot(&mut writer).unwrap();
        let bytes = writer.into_vec();

        let (mut replica, _) = list(&[]);
        let seen = recorder(&mut replica);
        replica
            .read_snapshot(&mut DeltaReader::new(&bytes))
            .unwrap();
        assert_eq!(replica.as_slice(), &[3, 1]);
        assert!(seen.borrow().is_empty());
        assert!(!replica.is_dirty());
    }

    #[test]
    fn should_write_respects_send_rate() {
        let scheduler = Arc::new(TickScheduler::new());
        let mut list: ReplicatedList<i32> = ReplicatedList::new(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::new().send_rate(crate::config::SendRate::EveryNTicks(3)),
        );
        assert!(!list.should_write(0));
        list.add(1).unwrap();
        assert!(list.should_write(0));
        list.reset_dirty_at(0);
        list.add(2).unwrap();
        assert!(!list.should_write(2));
        assert!(list.should_write(3));
    }

    #[test]
    fn throttled_change_is_rescheduled() {
        let scheduler = Arc::new(TickScheduler::new());
        let mut list: ReplicatedList<i32> = ReplicatedList::new(
            binding_for(ClientId::SERVER, &scheduler),
            ReplicationSettings::new().send_rate(crate::config::SendRate::EveryNTicks(3)),
        );
        list.add(1).unwrap();
        assert_eq!(scheduler.drain(), vec![EntityId::new(7)]);
        list.reset_dirty_at(0);

        // Drained and held back at tick 1.
        list.add(2).unwrap();
        assert_eq!(scheduler.drain(), vec![EntityId::new(7)]);
        assert!(!list.should_write(1));

        // The next change asks again even though nothing was sent.
        list.add(3).unwrap();
        assert_eq!(scheduler.drain(), vec![EntityId::new(7)]);

        // A held-back variable can hand itself back without a change.
        list.request_flush();
        assert!(scheduler.is_pending(EntityId::new(7)));
        assert!(list.should_write(3));
    }

    #[test]
    fn read_accessors_leave_state_alone() {
        let (list, _) = list(&[4, 5, 4]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), Some(&5));
        assert!(list.contains(&4));
        assert_eq!(list.index_of(&4), Some(0));
        assert_eq!(list.index_of(&6), None);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![4, 5, 4]);
        assert!(!list.is_dirty());
    }
}
