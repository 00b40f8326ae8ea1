//! Fixed-length replicated array.

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

/// A replicated array whose length is fixed at construction.
///
/// Supports indexed set and clear. Clearing resets every slot to
/// `T::default()`; the length never changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use netcoll_core::{
///     ClientId, EntityBinding, EntityId, NetworkVariable, ReplicatedArray,
///     ReplicationSettings, TickScheduler,
/// };
/// use netcoll_codec::{DeltaReader, DeltaWriter};
///
/// let scheduler = Arc::new(TickScheduler::new());
/// let binding = EntityBinding::new(EntityId::new(1), ClientId::SERVER, ClientId::SERVER, scheduler);
///
/// let mut slots: ReplicatedArray<i32> =
///     ReplicatedArray::new(binding.clone(), ReplicationSettings::default(), 3).unwrap();
/// slots.set(0, 5).unwrap();
///
/// let mut writer = DeltaWriter::new();
/// slots.write_delta(&mut writer).unwrap();
/// slots.reset_dirty();
///
/// let mut replica: ReplicatedArray<i32> =
///     ReplicatedArray::new(binding, ReplicationSettings::default(), 3).unwrap();
/// let bytes = writer.into_vec();
/// replica.read_delta(&mut DeltaReader::new(&bytes), false).unwrap();
/// assert_eq!(replica.as_slice(), &[5, 0, 0]);
/// ```
pub struct ReplicatedArray<T, C = NativeCodec> {
    slots: Box<[T]>,
    core: ReplicationCore<T, C>,
}

impl<T, C> ReplicatedArray<T, C>
where
    T: Clone + Default,
    C: ElementCodec<T> + Default,
{
    /// Creates an array of `len` default-initialised slots.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] if `len` cannot be carried by a
    /// snapshot (more than `u16::MAX` slots).
    pub fn new(binding: EntityBinding, settings: ReplicationSettings, len: usize) -> CoreResult<Self> {
        Self::with_codec(binding, settings, C::default(), len, std::iter::empty())
    }

    /// Creates an array of `len` slots seeded from `items`.
    ///
    /// Extra items are dropped; missing ones are filled with `T::default()`.
    pub fn from_items(
        binding: EntityBinding,
        settings: ReplicationSettings,
        len: usize,
        items: impl IntoIterator<Item = T>,
    ) -> CoreResult<Self> {
        Self::with_codec(binding, settings, C::default(), len, items)
    }
}

impl<T, C> ReplicatedArray<T, C>
where
    T: Clone + Default,
    C: ElementCodec<T>,
{
    /// Creates an array with an explicit element codec.
    pub fn with_codec(
        binding: EntityBinding,
        settings: ReplicationSettings,
        codec: C,
        len: usize,
        items: impl IntoIterator<Item = T>,
    ) -> CoreResult<Self> {
        if len > MAX_COLLECTION_LEN {
            return Err(CoreError::InvalidSize { size: len });
        }
        let mut slots: Vec<T> = items.into_iter().take(len).collect();
        slots.resize(len, T::default());
        Ok(Self {
            slots: slots.into_boxed_slice(),
            core: ReplicationCore::new(CollectionKind::Array, binding, settings, codec),
        })
    }

    /// Replaces the permission policy derived from the settings.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn PermissionPolicy>) -> Self {
        self.core.set_policy(policy);
        self
    }

    /// Overwrites slot `index` and returns the value it held.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the local client may not write
    /// or `index` is out of range.
    pub fn set(&mut self, index: usize, value: T) -> CoreResult<T> {
        self.core.ensure_writable()?;
        let len = self.slots.len();
        let slot = self
            .slots
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

    /// Resets every slot to `T::default()`.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.core.ensure_writable()?;
        self.reset_slots();
        self.core.record(ChangeEvent::Clear);
        Ok(())
    }

    fn reset_slots(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = T::default();
        }
    }

    fn apply(&mut self, event: WireEvent<T>, relay: bool) -> CoreResult<()> {
        match event {
            WireEvent::SetValue { index, value } => {
                let len = self.slots.len();
                let Some(slot) = self.slots.get_mut(index) else {
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
                self.reset_slots();
                self.core.applied(ChangeEvent::Clear, relay);
            }
            WireEvent::Full(items) => {
                if items.len() != self.slots.len() {
                    return Err(self.core.desync(CoreError::SnapshotLengthMismatch {
                        expected: self.slots.len(),
                        actual: items.len(),
                    }));
                }
                self.slots = items.into_boxed_slice();
                self.core.applied_full(relay);
            }
            other => {
                // read_event already filters by collection kind.
                return Err(CoreError::UnsupportedEvent {
                    kind: other.kind(),
                    collection: CollectionKind::Array.name(),
                });
            }
        }
        Ok(())
    }
}

impl<T, C> ReplicatedArray<T, C> {
    /// Fixed number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the array has zero slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the value in slot `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Returns the slots as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// Iterates the slots in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// Returns true if any slot equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.slots.contains(value)
    }

    /// Returns the first slot equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.slots.iter().position(|slot| slot == value)
    }
}

impl<T, C: ElementCodec<T>> ReplicatedArray<T, C> {
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

impl<'a, T, C> IntoIterator for &'a ReplicatedArray<T, C> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

impl<T, C> NetworkVariable for ReplicatedArray<T, C>
where
    T: Clone + Default,
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
        self.core.write_delta(writer, &self.slots)
    }

    fn read_delta(&mut self, reader: &mut DeltaReader<'_>, relay: bool) -> CoreResult<DeltaReport> {
        let count = wire::read_event_count(reader)?;
        let mut report = DeltaReport {
            received: usize::from(count),
            ..DeltaReport::default()
        };
        for _ in 0..count {
            let event = wire::read_event(reader, self.core.codec(), CollectionKind::Array)?;
            self.apply(event, relay)?;
            report.applied += 1;
        }
        self.core.finish_read(&report);
        Ok(report)
    }

    fn write_snapshot(&self, writer: &mut DeltaWriter) -> CoreResult<()> {
        wire::write_snapshot(writer, self.core.codec(), &self.slots)
    }

    fn read_snapshot(&mut self, reader: &mut DeltaReader<'_>) -> CoreResult<()> {
        let items = wire::read_snapshot(reader, self.core.codec())?;
        if items.len() != self.slots.len() {
            return Err(self.core.desync(CoreError::SnapshotLengthMismatch {
                expected: self.slots.len(),
                actual: items.len(),
            }));
        }
        self.slots = items.into_boxed_slice();
        Ok(())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ReplicatedArray<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicatedArray")
            .field("slots", &self.slots)
            .field("core", &self.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use crate::scheduler::TickScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn binding(scheduler: &Arc<TickScheduler>) -> EntityBinding {
        EntityBinding::new(
            EntityId::new(1),
            ClientId::SERVER,
            ClientId::SERVER,
            Arc::clone(scheduler) as Arc<dyn crate::FlushScheduler>,
        )
    }

    fn array(len: usize) -> (ReplicatedArray<i32>, Arc<TickScheduler>) {
        let scheduler = Arc::new(TickScheduler::new());
        let array = ReplicatedArray::new(binding(&scheduler), ReplicationSettings::default(), len)
            .unwrap();
        (array, scheduler)
    }

    fn flush(array: &mut ReplicatedArray<i32>) -> Vec<u8> {
        let mut writer = DeltaWriter::new();
        array.write_delta(&mut writer).unwrap();
        array.reset_dirty();
        writer.into_vec()
    }

    #[test]
    fn default_initialised() {
        let (array, scheduler) = array(3);
        assert_eq!(array.as_slice(), &[0, 0, 0]);
        assert!(!array.is_dirty());
        assert_eq!(scheduler.request_count(), 0);
    }

    #[test]
    fn from_items_truncates_and_pads() {
        let scheduler = Arc::new(TickScheduler::new());
        let long: ReplicatedArray<i32> = ReplicatedArray::from_items(
            binding(&scheduler),
            ReplicationSettings::default(),
            2,
            vec![1, 2, 3],
        )
        .unwrap();
        assert_eq!(long.as_slice(), &[1, 2]);

        let short: ReplicatedArray<i32> = ReplicatedArray::from_items(
            binding(&scheduler),
            ReplicationSettings::default(),
            3,
            vec![9],
        )
        .unwrap();
        assert_eq!(short.as_slice(), &[9, 0, 0]);
    }

    #[test]
    fn oversized_array_rejected() {
        let scheduler = Arc::new(TickScheduler::new());
        let result: CoreResult<ReplicatedArray<u8>> =
            ReplicatedArray::new(binding(&scheduler), ReplicationSettings::default(), 70_000);
        assert_eq!(result.err(), Some(CoreError::InvalidSize { size: 70_000 }));
    }

    #[test]
    fn set_records_notifies_and_requests_flush() {
        let (mut array, scheduler) = array(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        array.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        assert_eq!(array.set(0, 5).unwrap(), 0);
        array.set(0, 6).unwrap();

        assert_eq!(array.as_slice(), &[6, 0, 0]);
        assert_eq!(array.pending_events().len(), 2);
        assert_eq!(
            seen.borrow()[0],
            ChangeEvent::SetValue {
                index: 0,
                value: 5,
                previous_value: 0
            }
        );
        // Every mutation asks; the scheduler keeps one pending entry.
        assert_eq!(scheduler.request_count(), 2);
        assert_eq!(scheduler.pending_count(), 1);
        assert!(scheduler.is_pending(EntityId::new(1)));
    }

    #[test]
    fn set_out_of_range_changes_nothing() {
        let (mut array, scheduler) = array(2);
        assert_eq!(array.set(2, 1), Err(CoreError::out_of_range(2, 2)));
        assert!(!array.is_dirty());
        assert_eq!(scheduler.request_count(), 0);
    }

    #[test]
    fn clear_resets_slots() {
        let (mut array, _) = array(3);
        array.set(1, 4).unwrap();
        array.clear().unwrap();
        assert_eq!(array.as_slice(), &[0, 0, 0]);
        assert_eq!(array.pending_events().last(), Some(&ChangeEvent::Clear));
    }

    #[test]
    fn write_without_permission_rejected() {
        let scheduler = Arc::new(TickScheduler::new());
        let binding = EntityBinding::new(
            EntityId::new(1),
            ClientId::new(2),
            ClientId::new(3),
            Arc::clone(&scheduler) as Arc<dyn crate::FlushScheduler>,
        );
        let settings = ReplicationSettings::new().write_permission(Permission::OwnerOnly);
        let mut array: ReplicatedArray<i32> = ReplicatedArray::new(binding, settings, 2).unwrap();

        assert!(matches!(
            array.set(0, 1),
            Err(CoreError::WriteNotPermitted { .. })
        ));
        assert!(matches!(
            array.clear(),
            Err(CoreError::WriteNotPermitted { .. })
        ));
        assert_eq!(array.as_slice(), &[0, 0]);
        assert!(!array.is_dirty());
    }

    #[test]
    fn delta_roundtrip_with_previous_value() {
        let (mut source, _) = array(3);
        let (mut replica, _) = array(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        replica.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        source.set(2, 8).unwrap();
        source.set(2, 9).unwrap();
        let bytes = flush(&mut source);

        let report = replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(replica.as_slice(), &[0, 0, 9]);
        assert_eq!(seen.borrow()[1].previous_value(), Some(&8));
        assert!(!replica.is_dirty());
    }

    #[test]
    fn set_beyond_length_is_a_desync() {
        let (mut source, _) = array(4);
        let (mut replica, _) = array(2);
        source.set(1, 1).unwrap();
        source.set(3, 3).unwrap();
        let bytes = flush(&mut source);

        let err = replica
            .read_delta(&mut DeltaReader::new(&bytes), false)
            .unwrap_err();
        assert_eq!(err, CoreError::desync(EventKind::SetValue, 3, 2));
        // Events before the failure stay applied.
        assert_eq!(replica.as_slice(), &[0, 1]);
    }

    #[test]
    fn full_snapshot_must_match_length() {
        let (mut source, _) = array(3);
        let (mut replica, _) = array(2);
        source.set_dirty();
        let bytes = flush(&mut source);

        assert_eq!(
            replica.read_delta(&mut DeltaReader::new(&bytes), false),
            Err(CoreError::SnapshotLengthMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn relay_requeues_applied_events() {
        let (mut source, _) = array(2);
        let (mut relay, relay_scheduler) = array(2);
        source.set(1, 7).unwrap();
        let bytes = flush(&mut source);

        relay
            .read_delta(&mut DeltaReader::new(&bytes), true)
            .unwrap();
        assert_eq!(relay.pending_events().len(), 1);
        assert!(relay_scheduler.is_pending(EntityId::new(1)));

        let forwarded = flush(&mut relay);
        assert_eq!(forwarded, bytes);
    }

    #[test]
    fn snapshot_roundtrip() {
        let (mut source, _) = array(3);
        source.set(0, 1).unwrap();
        source.set(2, 3).unwrap();
        let mut writer = DeltaWriter::new();
        source.write_snapshot(&mut writer).unwrap();

        let (mut replica, _) = array(3);
        let bytes = writer.into_vec();
        replica
            .read_snapshot(&mut DeltaReader::new(&bytes))
            .unwrap();
        assert_eq!(replica.as_slice(), &[1, 0, 3]);
        assert!(!replica.is_dirty());
    }

    #[test]
    fn read_accessors() {
        let (mut array, _) = array(3);
        array.set(1, 4).unwrap();
        assert_eq!(array.len(), 3);
        assert!(!array.is_empty());
        assert_eq!(array.get(1), Some(&4));
        assert_eq!(array.get(3), None);
        assert!(array.contains(&4));
        assert_eq!(array.index_of(&4), Some(1));
        assert_eq!(array.index_of(&5), None);
        assert_eq!(array.iter().sum::<i32>(), 4);
        assert_eq!((&array).into_iter().count(), 3);
    }
}
