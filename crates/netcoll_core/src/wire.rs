//! Wire encoding of replication messages.
//!
//! ```text
//! message := eventCount:u16, event*
//! event   := tag:u8, payload
//! ```
//!
//! | Kind     | Payload                         |
//! |----------|---------------------------------|
//! | Add      | element                         |
//! | Insert   | index:u32, element              |
//! | Remove   | element (receiver re-searches)  |
//! | RemoveAt | index:u32                       |
//! | SetValue | index:u32, element              |
//! | Clear    | (none)                          |
//! | Full     | count:u16, element*             |
//!
//! Payloads carry no length prefix of their own, so the encoder and
//! decoder for each kind must stay in lock-step. Integers are
//! little-endian.

use crate::error::{CoreError, CoreResult};
use crate::event::{ChangeEvent, EventKind};
use crate::log::EventLog;
use netcoll_codec::{DeltaReader, DeltaWriter, ElementCodec};

/// Largest element count a snapshot can carry.
pub const MAX_COLLECTION_LEN: usize = u16::MAX as usize;

/// The two collection shapes and the event kinds each accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Fixed-length array: `SetValue`, `Clear`, `Full`.
    Array,
    /// Variable-length list: every kind.
    List,
}

impl CollectionKind {
    /// Returns true if this collection kind accepts `kind`.
    pub fn supports(self, kind: EventKind) -> bool {
        match self {
            CollectionKind::Array => matches!(
                kind,
                EventKind::SetValue | EventKind::Clear | EventKind::Full
            ),
            CollectionKind::List => true,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Array => "array",
            CollectionKind::List => "list",
        }
    }
}

/// An event as decoded from the wire, before it is applied.
///
/// Indices found only by applying (the target of a `Remove`) and values
/// only the receiver knows (the value a `SetValue` replaces) are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent<T> {
    /// Append a value.
    Add(T),
    /// Insert a value at an index.
    Insert {
        /// Insertion index.
        index: usize,
        /// The value.
        value: T,
    },
    /// Remove the first element equal to a value.
    Remove(T),
    /// Remove the element at an index.
    RemoveAt {
        /// Index to remove.
        index: usize,
    },
    /// Overwrite the element at an index.
    SetValue {
        /// Index to overwrite.
        index: usize,
        /// The new value.
        value: T,
    },
    /// Clear every element.
    Clear,
    /// Replace the contents with a snapshot.
    Full(Vec<T>),
}

impl<T> WireEvent<T> {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            WireEvent::Add(_) => EventKind::Add,
            WireEvent::Insert { .. } => EventKind::Insert,
            WireEvent::Remove(_) => EventKind::Remove,
            WireEvent::RemoveAt { .. } => EventKind::RemoveAt,
            WireEvent::SetValue { .. } => EventKind::SetValue,
            WireEvent::Clear => EventKind::Clear,
            WireEvent::Full(_) => EventKind::Full,
        }
    }
}

fn write_index(writer: &mut DeltaWriter, index: usize) -> CoreResult<()> {
    let index = u32::try_from(index).map_err(|_| CoreError::CollectionTooLarge { len: index })?;
    writer.write_u32(index);
    Ok(())
}

fn read_index(reader: &mut DeltaReader<'_>) -> CoreResult<usize> {
    Ok(reader.read_u32()? as usize)
}

/// Writes the message header: the number of events that follow.
///
/// # Errors
///
/// Returns [`CoreError::TooManyEvents`] if `count` exceeds `u16::MAX`.
pub fn write_event_count(writer: &mut DeltaWriter, count: usize) -> CoreResult<()> {
    let count = u16::try_from(count).map_err(|_| CoreError::TooManyEvents { count })?;
    writer.write_u16(count);
    Ok(())
}

/// Reads the message header.
pub fn read_event_count(reader: &mut DeltaReader<'_>) -> CoreResult<u16> {
    Ok(reader.read_u16()?)
}

/// Writes a snapshot: `count:u16` followed by every element in order.
///
/// # Errors
///
/// Returns [`CoreError::CollectionTooLarge`] before writing anything if
/// there are more than `u16::MAX` elements.
pub fn write_snapshot<T, C: ElementCodec<T>>(
    writer: &mut DeltaWriter,
    codec: &C,
    items: &[T],
) -> CoreResult<()> {
    let count =
        u16::try_from(items.len()).map_err(|_| CoreError::CollectionTooLarge { len: items.len() })?;
    writer.write_u16(count);
    for item in items {
        codec.encode(writer, item)?;
    }
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`].
pub fn read_snapshot<T, C: ElementCodec<T>>(
    reader: &mut DeltaReader<'_>,
    codec: &C,
) -> CoreResult<Vec<T>> {
    let count = usize::from(reader.read_u16()?);
    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(codec.decode(reader)?);
    }
    Ok(items)
}

/// Writes one event: its tag followed by the kind-specific payload.
///
/// `storage` is only read for `Full`, whose payload is the current
/// contents rather than anything the event carries.
pub fn write_event<T, C: ElementCodec<T>>(
    writer: &mut DeltaWriter,
    codec: &C,
    event: &ChangeEvent<T>,
    storage: &[T],
) -> CoreResult<()> {
    writer.write_u8(event.kind().to_code());
    match event {
        ChangeEvent::Add { value, .. } | ChangeEvent::Remove { value, .. } => {
            codec.encode(writer, value)?;
        }
        ChangeEvent::Insert { index, value, .. } | ChangeEvent::SetValue { index, value, .. } => {
            write_index(writer, *index)?;
            codec.encode(writer, value)?;
        }
        ChangeEvent::RemoveAt { index, .. } => {
            write_index(writer, *index)?;
        }
        ChangeEvent::Clear => {}
        ChangeEvent::Full => {
            write_snapshot(writer, codec, storage)?;
        }
    }
    Ok(())
}

/// Reads one event, rejecting tags `collection` does not accept.
///
/// The tag is validated before any payload is read.
pub fn read_event<T, C: ElementCodec<T>>(
    reader: &mut DeltaReader<'_>,
    codec: &C,
    collection: CollectionKind,
) -> CoreResult<WireEvent<T>> {
    let tag = reader.read_u8()?;
    let kind = EventKind::from_code(tag).ok_or(CoreError::UnknownEventTag(tag))?;
    if !collection.supports(kind) {
        return Err(CoreError::UnsupportedEvent {
            kind,
            collection: collection.name(),
        });
    }

    let event = match kind {
        EventKind::Add => WireEvent::Add(codec.decode(reader)?),
        EventKind::Insert => {
            let index = read_index(reader)?;
            WireEvent::Insert {
                index,
                value: codec.decode(reader)?,
            }
        }
        EventKind::Remove => WireEvent::Remove(codec.decode(reader)?),
        EventKind::RemoveAt => WireEvent::RemoveAt {
            index: read_index(reader)?,
        },
        EventKind::SetValue => {
            let index = read_index(reader)?;
            WireEvent::SetValue {
                index,
                value: codec.decode(reader)?,
            }
        }
        EventKind::Clear => WireEvent::Clear,
        EventKind::Full => WireEvent::Full(read_snapshot(reader, codec)?),
    };
    Ok(event)
}

/// Writes a full-resync message: one `Full` event carrying `storage`.
///
/// On error `writer` is left untouched.
pub fn write_full_message<T, C: ElementCodec<T>>(
    writer: &mut DeltaWriter,
    codec: &C,
    storage: &[T],
) -> CoreResult<()> {
    if storage.len() > MAX_COLLECTION_LEN {
        return Err(CoreError::CollectionTooLarge { len: storage.len() });
    }
    let mut message = DeltaWriter::new();
    write_event_count(&mut message, 1)?;
    write_event(&mut message, codec, &ChangeEvent::Full, storage)?;
    writer.write_raw(message.as_bytes());
    Ok(())
}

/// Writes a delta message: every pending event in insertion order.
///
/// The message is staged in its own buffer, so on error `writer` is left
/// untouched.
pub fn write_log_message<T, C: ElementCodec<T>>(
    writer: &mut DeltaWriter,
    codec: &C,
    log: &EventLog<T>,
    storage: &[T],
) -> CoreResult<()> {
    let mut message = DeltaWriter::new();
    write_event_count(&mut message, log.len())?;
    for event in log.iter() {
        write_event(&mut message, codec, event, storage)?;
    }
    writer.write_raw(message.as_bytes());
    Ok(())
}
