//! Behaviour shared by every replicated collection.

use crate::config::ReplicationSettings;
use crate::dirty::{self, DirtyState};
use crate::error::{CoreError, CoreResult};
use crate::event::ChangeEvent;
use crate::observer::{ObserverChannel, ObserverId, Unsubscriber};
use crate::permission::{AccessPolicy, PermissionPolicy};
use crate::scheduler::FlushScheduler;
use crate::types::{ClientId, EntityId};
use crate::wire::{self, CollectionKind};
use netcoll_codec::{DeltaReader, DeltaWriter, ElementCodec};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Ties a variable to its entity and the surrounding network session.
#[derive(Clone)]
pub struct EntityBinding {
    /// Entity the variable belongs to.
    pub entity: EntityId,
    /// Client that owns the entity.
    pub owner: ClientId,
    /// Identity of this process; used for write permission checks.
    pub local_client: ClientId,
    /// Where flush requests go.
    pub scheduler: Arc<dyn FlushScheduler>,
}

impl EntityBinding {
    /// Creates a binding.
    pub fn new(
        entity: EntityId,
        owner: ClientId,
        local_client: ClientId,
        scheduler: Arc<dyn FlushScheduler>,
    ) -> Self {
        Self {
            entity,
            owner,
            local_client,
            scheduler,
        }
    }
}

impl fmt::Debug for EntityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBinding")
            .field("entity", &self.entity)
            .field("owner", &self.owner)
            .field("local_client", &self.local_client)
            .finish_non_exhaustive()
    }
}

/// Outcome of applying one received message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaReport {
    /// Events declared in the message header.
    pub received: usize,
    /// Events that changed local state.
    pub applied: usize,
    /// Events that were valid no-ops (remove of an absent value).
    pub ignored: usize,
}

/// A value kept in sync across the network by delta messages.
///
/// The tick driver owns the schedule: after a variable requests a flush it
/// calls [`write_delta`](NetworkVariable::write_delta) once and then
/// [`reset_dirty`](NetworkVariable::reset_dirty). A variable the driver
/// drains but holds back because [`should_write`](NetworkVariable::should_write)
/// is false must be handed back with
/// [`request_flush`](NetworkVariable::request_flush). Replicas feed each
/// received message to [`read_delta`](NetworkVariable::read_delta).
pub trait NetworkVariable {
    /// Entity the variable belongs to.
    fn entity(&self) -> EntityId;

    /// Replication settings.
    fn settings(&self) -> &ReplicationSettings;

    /// True if events are pending or a full resync was requested.
    fn is_dirty(&self) -> bool;

    /// Requests a full resync on the next flush.
    fn set_dirty(&mut self);

    /// Clears pending events and the resync flag.
    fn reset_dirty(&mut self);

    /// Like [`reset_dirty`](NetworkVariable::reset_dirty), also recording
    /// `tick` as the time of the last send.
    fn reset_dirty_at(&mut self, tick: u64);

    /// True if the variable is dirty and its send rate allows a send at `tick`.
    fn should_write(&self, tick: u64) -> bool;

    /// Asks the scheduler to consider the variable on the next tick.
    fn request_flush(&self);

    /// True if `client` may mutate the variable.
    fn can_write(&self, client: ClientId) -> bool;

    /// True if `client` may receive the variable.
    fn can_read(&self, client: ClientId) -> bool;

    /// Writes pending changes: a single `Full` event if a resync was
    /// requested, otherwise every logged event in order.
    ///
    /// Does not clear any state.
    fn write_delta(&self, writer: &mut DeltaWriter) -> CoreResult<()>;

    /// Applies a message produced by `write_delta`.
    ///
    /// With `relay`, every applied event is queued again so the next flush
    /// forwards it downstream. Stops at the first event that cannot be
    /// applied; events before it stay applied.
    fn read_delta(&mut self, reader: &mut DeltaReader<'_>, relay: bool) -> CoreResult<DeltaReport>;

    /// Applies a message using the configured relay setting.
    fn receive(&mut self, reader: &mut DeltaReader<'_>) -> CoreResult<DeltaReport> {
        let relay = self.settings().relay_received;
        self.read_delta(reader, relay)
    }

    /// Writes the whole contents with no event header.
    fn write_snapshot(&self, writer: &mut DeltaWriter) -> CoreResult<()>;

    /// Replaces the contents from a snapshot. Does not notify or log.
    fn read_snapshot(&mut self, reader: &mut DeltaReader<'_>) -> CoreResult<()>;
}

/// State and plumbing common to arrays and lists.
pub(crate) struct ReplicationCore<T, C> {
    binding: EntityBinding,
    settings: ReplicationSettings,
    policy: Arc<dyn PermissionPolicy>,
    dirty: DirtyState<T>,
    observers: ObserverChannel<ChangeEvent<T>>,
    codec: C,
    last_sent_tick: Option<u64>,
    kind: CollectionKind,
}

impl<T, C: ElementCodec<T>> ReplicationCore<T, C> {
    pub(crate) fn new(
        kind: CollectionKind,
        binding: EntityBinding,
        settings: ReplicationSettings,
        codec: C,
    ) -> Self {
        let policy = Arc::new(AccessPolicy::new(
            settings.write_permission.clone(),
            settings.read_permission.clone(),
            binding.owner,
        ));
        Self {
            binding,
            settings,
            policy,
            dirty: DirtyState::new(),
            observers: ObserverChannel::new(),
            codec,
            last_sent_tick: None,
            kind,
        }
    }

    pub(crate) fn set_policy(&mut self, policy: Arc<dyn PermissionPolicy>) {
        self.policy = policy;
    }

    pub(crate) fn codec(&self) -> &C {
        &self.codec
    }

    pub(crate) fn entity(&self) -> EntityId {
        self.binding.entity
    }

    pub(crate) fn settings(&self) -> &ReplicationSettings {
        &self.settings
    }

    pub(crate) fn dirty_state(&self) -> &DirtyState<T> {
        &self.dirty
    }

    pub(crate) fn can_write(&self, client: ClientId) -> bool {
        self.policy.can_write(client)
    }

    pub(crate) fn can_read(&self, client: ClientId) -> bool {
        self.policy.can_read(client)
    }

    /// Fails unless the local client may write.
    pub(crate) fn ensure_writable(&self) -> CoreResult<()> {
        let client = self.binding.local_client;
        if self.policy.can_write(client) {
            return Ok(());
        }
        warn!(entity = %self.binding.entity, %client, "rejected write without permission");
        Err(CoreError::WriteNotPermitted {
            client,
            entity: self.binding.entity,
        })
    }

    /// Requested on every change; the scheduler collapses repeats per tick.
    pub(crate) fn request_flush(&self) {
        self.binding.scheduler.request_flush(self.binding.entity);
    }

    /// Logs a local mutation, notifies observers and requests a flush.
    pub(crate) fn record(&mut self, event: ChangeEvent<T>) {
        trace!(entity = %self.binding.entity, kind = ?event.kind(), "recorded change");
        let logged = self.dirty.record(event);
        self.observers.notify(logged);
        self.request_flush();
    }

    /// Notifies observers of a received event, relaying it when asked.
    pub(crate) fn applied(&mut self, event: ChangeEvent<T>, relay: bool) {
        if relay {
            let logged = self.dirty.record(event);
            self.observers.notify(logged);
            self.request_flush();
        } else {
            self.observers.notify(&event);
        }
    }

    /// Handles the bookkeeping after a received `Full` replaced storage.
    pub(crate) fn applied_full(&mut self, relay: bool) {
        self.reset_dirty();
        self.observers.notify(&ChangeEvent::Full);
        if relay {
            self.set_dirty();
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        dirty::is_dirty(&self.dirty)
    }

    pub(crate) fn set_dirty(&mut self) {
        self.dirty.mark_whole_value();
        self.request_flush();
    }

    pub(crate) fn reset_dirty(&mut self) {
        dirty::reset(&mut self.dirty);
    }

    pub(crate) fn reset_dirty_at(&mut self, tick: u64) {
        self.reset_dirty();
        self.last_sent_tick = Some(tick);
    }

    pub(crate) fn should_write(&self, tick: u64) -> bool {
        self.is_dirty() && self.settings.send_rate.allows(tick, self.last_sent_tick)
    }

    pub(crate) fn write_delta(&self, writer: &mut DeltaWriter, storage: &[T]) -> CoreResult<()> {
        if self.dirty.whole_value {
            wire::write_full_message(writer, &self.codec, storage)?;
            debug!(
                entity = %self.binding.entity,
                collection = self.kind.name(),
                elements = storage.len(),
                superseded = self.dirty.log.len(),
                "wrote full snapshot"
            );
            return Ok(());
        }
        wire::write_log_message(writer, &self.codec, &self.dirty.log, storage)?;
        debug!(
            entity = %self.binding.entity,
            collection = self.kind.name(),
            events = self.dirty.log.len(),
            "wrote delta"
        );
        Ok(())
    }

    /// Logs a desync before handing the error back.
    pub(crate) fn desync(&self, error: CoreError) -> CoreError {
        warn!(entity = %self.binding.entity, collection = self.kind.name(), %error, "protocol desync");
        error
    }

    pub(crate) fn finish_read(&self, report: &DeltaReport) {
        debug!(
            entity = %self.binding.entity,
            collection = self.kind.name(),
            received = report.received,
            applied = report.applied,
            ignored = report.ignored,
            "applied delta"
        );
    }

    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent<T>) + 'static) -> ObserverId {
        self.observers.subscribe(listener)
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn unsubscriber(&self, id: ObserverId) -> Unsubscriber {
        self.observers.unsubscriber(id)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ReplicationCore<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationCore")
            .field("binding", &self.binding)
            .field("settings", &self.settings)
            .field("dirty", &self.dirty)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
