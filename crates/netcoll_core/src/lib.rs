//! # netcoll Core
//!
//! Delta-replicated collections for tick-driven networking.
//!
//! This crate provides:
//! - [`ReplicatedArray`] (fixed length) and [`ReplicatedList`] (any length)
//! - Per-element change events buffered in a dirty log and flushed as
//!   compact deltas, or as a full snapshot when a resync is forced
//! - Permission gating of local writes through [`PermissionPolicy`]
//! - Flush requests through an injected [`FlushScheduler`]
//! - Synchronous change notification through an [`ObserverChannel`]
//!
//! A tick driver owns the schedule. Each tick it drains the scheduler,
//! calls [`NetworkVariable::write_delta`] for every requested entity, ships
//! the bytes and calls [`NetworkVariable::reset_dirty`]. Replicas apply the
//! bytes with [`NetworkVariable::read_delta`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod array;
mod config;
pub mod dirty;
mod error;
mod event;
mod list;
mod log;
mod observer;
mod permission;
mod scheduler;
mod types;
mod variable;
pub mod wire;

pub use array::ReplicatedArray;
pub use config::{ReplicationSettings, SendRate};
pub use dirty::DirtyState;
pub use error::{CoreError, CoreResult};
pub use event::{ChangeEvent, EventKind};
pub use list::ReplicatedList;
pub use log::EventLog;
pub use observer::{ObserverChannel, ObserverId, Unsubscriber};
pub use permission::{AccessPolicy, Permission, PermissionCallback, PermissionPolicy};
pub use scheduler::{FlushScheduler, NoopScheduler, TickScheduler};
pub use types::{ClientId, EntityId};
pub use variable::{DeltaReport, EntityBinding, NetworkVariable};
pub use wire::{CollectionKind, WireEvent, MAX_COLLECTION_LEN};
