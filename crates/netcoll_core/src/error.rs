//! Error types for netcoll core.

use crate::event::EventKind;
use crate::types::{ClientId, EntityId};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by replicated collections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Element or buffer codec error.
    #[error("codec error: {0}")]
    Codec(#[from] netcoll_codec::CodecError),

    /// The local client lacks write permission on the variable.
    #[error("write not permitted for {client} on {entity}")]
    WriteNotPermitted {
        /// Client that attempted the write.
        client: ClientId,
        /// Entity the variable belongs to.
        entity: EntityId,
    },

    /// A local mutation addressed an index outside the collection.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Collection length at the time of the call.
        len: usize,
    },

    /// A received event addressed an index the local replica does not have.
    ///
    /// Sender and receiver disagree about the collection length. The
    /// message is abandoned at this event.
    #[error("protocol desync: {kind:?} index {index} out of range for length {len}")]
    ProtocolDesync {
        /// Kind of the event being applied.
        kind: EventKind,
        /// Index carried by the event.
        index: usize,
        /// Local length at the time of apply.
        len: usize,
    },

    /// A full snapshot for a fixed-size array carried the wrong element count.
    #[error("snapshot length mismatch: expected {expected} elements, got {actual}")]
    SnapshotLengthMismatch {
        /// The array's fixed length.
        expected: usize,
        /// Element count carried by the snapshot.
        actual: usize,
    },

    /// The event tag is not part of the wire enumeration.
    #[error("unknown event tag: {0}")]
    UnknownEventTag(u8),

    /// The event kind exists but this collection kind does not accept it.
    #[error("{kind:?} events are not supported by {collection} collections")]
    UnsupportedEvent {
        /// Kind of the rejected event.
        kind: EventKind,
        /// Name of the collection kind.
        collection: &'static str,
    },

    /// More pending events than the `u16` event count can carry.
    #[error("too many pending events for one message: {count}")]
    TooManyEvents {
        /// Number of pending events.
        count: usize,
    },

    /// More elements (or a larger index) than the wire format can carry.
    #[error("collection too large for the wire format: {len}")]
    CollectionTooLarge {
        /// The offending length or index.
        len: usize,
    },

    /// A fixed-size array was constructed with an unusable size.
    #[error("invalid array size: {size}")]
    InvalidSize {
        /// The requested size.
        size: usize,
    },
}

impl CoreError {
    /// Creates a protocol desync error.
    pub fn desync(kind: EventKind, index: usize, len: usize) -> Self {
        Self::ProtocolDesync { kind, index, len }
    }

    /// Creates a local index error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Returns true if this error means a received message could not be
    /// applied consistently.
    ///
    /// Such errors are fatal for the replica: the sender and receiver no
    /// longer agree on state and only a full resync can repair it.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            CoreError::Codec(_)
                | CoreError::ProtocolDesync { .. }
                | CoreError::SnapshotLengthMismatch { .. }
                | CoreError::UnknownEventTag(_)
                | CoreError::UnsupportedEvent { .. }
        )
    }
}
