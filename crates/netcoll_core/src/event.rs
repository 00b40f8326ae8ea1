//! Change events produced by collection mutations.

/// Kind of a change event.
///
/// The discriminant doubles as the one-byte wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Element appended to the end of a list.
    Add,
    /// Element inserted into a list at an index.
    Insert,
    /// First element equal to a value removed from a list.
    Remove,
    /// Element at an index removed from a list.
    RemoveAt,
    /// Element at an index overwritten.
    SetValue,
    /// All elements cleared.
    Clear,
    /// Entire contents replaced by a snapshot.
    Full,
}

impl EventKind {
    /// All kinds, in tag order.
    pub const ALL: [EventKind; 7] = [
        EventKind::Add,
        EventKind::Insert,
        EventKind::Remove,
        EventKind::RemoveAt,
        EventKind::SetValue,
        EventKind::Clear,
        EventKind::Full,
    ];

    /// Converts to the wire tag.
    pub fn to_code(self) -> u8 {
        match self {
            EventKind::Add => 0,
            EventKind::Insert => 1,
            EventKind::Remove => 2,
            EventKind::RemoveAt => 3,
            EventKind::SetValue => 4,
            EventKind::Clear => 5,
            EventKind::Full => 6,
        }
    }

    /// Converts from a wire tag.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EventKind::Add),
            1 => Some(EventKind::Insert),
            2 => Some(EventKind::Remove),
            3 => Some(EventKind::RemoveAt),
            4 => Some(EventKind::SetValue),
            5 => Some(EventKind::Clear),
            6 => Some(EventKind::Full),
            _ => None,
        }
    }
}

/// A single mutation of a replicated collection.
///
/// Each variant carries exactly the fields its kind needs. Values are
/// owned copies, so later changes to the collection never alter an
/// event that is already queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T> {
    /// `value` appended at `index` (the new last index).
    Add {
        /// Index the value landed at.
        index: usize,
        /// The appended value.
        value: T,
    },
    /// `value` inserted at `index`; later elements shift right.
    Insert {
        /// Insertion index.
        index: usize,
        /// The inserted value.
        value: T,
    },
    /// First element equal to `value` removed; it was found at `index`.
    Remove {
        /// Index the value was found at.
        index: usize,
        /// The removed value.
        value: T,
    },
    /// Element at `index` removed.
    RemoveAt {
        /// Removed index.
        index: usize,
        /// The removed value.
        value: T,
    },
    /// Element at `index` overwritten.
    SetValue {
        /// Overwritten index.
        index: usize,
        /// The new value.
        value: T,
        /// The value it replaced.
        previous_value: T,
    },
    /// Every element cleared.
    Clear,
    /// Contents replaced by a snapshot.
    Full,
}

impl<T> ChangeEvent<T> {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ChangeEvent::Add { .. } => EventKind::Add,
            ChangeEvent::Insert { .. } => EventKind::Insert,
            ChangeEvent::Remove { .. } => EventKind::Remove,
            ChangeEvent::RemoveAt { .. } => EventKind::RemoveAt,
            ChangeEvent::SetValue { .. } => EventKind::SetValue,
            ChangeEvent::Clear => EventKind::Clear,
            ChangeEvent::Full => EventKind::Full,
        }
    }

    /// Returns the index this event refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            ChangeEvent::Add { index, .. }
            | ChangeEvent::Insert { index, .. }
            | ChangeEvent::Remove { index, .. }
            | ChangeEvent::RemoveAt { index, .. }
            | ChangeEvent::SetValue { index, .. } => Some(*index),
            ChangeEvent::Clear | ChangeEvent::Full => None,
        }
    }

    /// Returns the value carried by this event, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            ChangeEvent::Add { value, .. }
            | ChangeEvent::Insert { value, .. }
            | ChangeEvent::Remove { value, .. }
            | ChangeEvent::RemoveAt { value, .. }
            | ChangeEvent::SetValue { value, .. } => Some(value),
            ChangeEvent::Clear | ChangeEvent::Full => None,
        }
    }

    /// Returns the replaced value of a `SetValue` event.
    pub fn previous_value(&self) -> Option<&T> {
        match self {
            ChangeEvent::SetValue { previous_value, .. } => Some(previous_value),
            _ => None,
        }
    }
}
