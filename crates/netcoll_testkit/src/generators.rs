//! Property-based test generators using proptest.
//!
//! Mutation scripts address elements through `slot` numbers that are
//! folded into the valid index range at apply time, so every generated
//! script is applicable to any list or array.

use netcoll_codec::ElementCodec;
use netcoll_core::{CoreResult, NetworkVariable, ReplicatedArray, ReplicatedList};
use proptest::prelude::*;

/// One local mutation of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    /// Append a value.
    Add(i32),
    /// Insert at a folded index (`0..=len`).
    Insert {
        /// Raw slot, folded into range.
        slot: usize,
        /// The value.
        value: i32,
    },
    /// Remove the first element equal to a value.
    Remove(i32),
    /// Remove at a folded index; skipped on an empty list.
    RemoveAt {
        /// Raw slot, folded into range.
        slot: usize,
    },
    /// Overwrite at a folded index; skipped on an empty list.
    Set {
        /// Raw slot, folded into range.
        slot: usize,
        /// The value.
        value: i32,
    },
    /// Remove everything.
    Clear,
    /// Force a full resync on the next flush.
    ForceResync,
}

/// One local mutation of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayOp {
    /// Overwrite at a folded index.
    Set {
        /// Raw slot, folded into range.
        slot: usize,
        /// The value.
        value: i32,
    },
    /// Reset every slot.
    Clear,
    /// Force a full resync on the next flush.
    ForceResync,
}

/// Strategy for element values.
///
/// The range is small so that remove-by-value often hits.
pub fn value_strategy() -> impl Strategy<Value = i32> {
    -4i32..8
}

/// Strategy for a single list mutation.
pub fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => value_strategy().prop_map(ListOp::Add),
        3 => (any::<usize>(), value_strategy())
            .prop_map(|(slot, value)| ListOp::Insert { slot, value }),
        2 => value_strategy().prop_map(ListOp::Remove),
        2 => any::<usize>().prop_map(|slot| ListOp::RemoveAt { slot }),
        2 => (any::<usize>(), value_strategy())
            .prop_map(|(slot, value)| ListOp::Set { slot, value }),
        1 => Just(ListOp::Clear),
    ]
}

/// Strategy for a list mutation that may also force a resync.
pub fn list_op_with_resync_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        12 => list_op_strategy(),
        1 => Just(ListOp::ForceResync),
    ]
}

/// Strategy for a single array mutation.
pub fn array_op_strategy() -> impl Strategy<Value = ArrayOp> {
    prop_oneof![
        6 => (any::<usize>(), value_strategy())
            .prop_map(|(slot, value)| ArrayOp::Set { slot, value }),
        1 => Just(ArrayOp::Clear),
        1 => Just(ArrayOp::ForceResync),
    ]
}

/// Strategy for list initial contents.
pub fn list_contents_strategy(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(value_strategy(), 0..=max_len)
}

/// Strategy for a sequence of list mutations.
pub fn list_script_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<ListOp>> {
    prop::collection::vec(list_op_with_resync_strategy(), min_ops..max_ops)
}

/// Strategy for a sequence of array mutations.
pub fn array_script_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<ArrayOp>> {
    prop::collection::vec(array_op_strategy(), min_ops..max_ops)
}

/// Applies `op` to a list through its public mutators.
pub fn apply_list_op<C: ElementCodec<i32>>(
    list: &mut ReplicatedList<i32, C>,
    op: &ListOp,
) -> CoreResult<()> {
    let len = list.len();
    match *op {
        ListOp::Add(value) => list.add(value)?,
        ListOp::Insert { slot, value } => list.insert(slot % (len + 1), value)?,
        ListOp::Remove(value) => {
            list.remove(&value)?;
        }
        ListOp::RemoveAt { slot } if len > 0 => {
            list.remove_at(slot % len)?;
        }
        ListOp::Set { slot, value } if len > 0 => {
            list.set(slot % len, value)?;
        }
        ListOp::RemoveAt { .. } | ListOp::Set { .. } => {}
        ListOp::Clear => list.clear()?,
        ListOp::ForceResync => list.set_dirty(),
    }
    Ok(())
}

/// Applies `op` to a plain vector, mirroring [`apply_list_op`].
pub fn apply_list_op_to_model(model: &mut Vec<i32>, op: &ListOp) {
    let len = model.len();
    match *op {
        ListOp::Add(value) => model.push(value),
        ListOp::Insert { slot, value } => model.insert(slot % (len + 1), value),
        ListOp::Remove(value) => {
            if let Some(index) = model.iter().position(|item| *item == value) {
                model.remove(index);
            }
        }
        ListOp::RemoveAt { slot } if len > 0 => {
            model.remove(slot % len);
        }
        ListOp::Set { slot, value } if len > 0 => model[slot % len] = value,
        ListOp::RemoveAt { .. } | ListOp::Set { .. } => {}
        ListOp::Clear => model.clear(),
        ListOp::ForceResync => {}
    }
}

/// Applies `op` to an array through its public mutators.
pub fn apply_array_op<C: ElementCodec<i32>>(
    array: &mut ReplicatedArray<i32, C>,
    op: &ArrayOp,
) -> CoreResult<()> {
    let len = array.len();
    match *op {
        ArrayOp::Set { slot, value } if len > 0 => {
            array.set(slot % len, value)?;
        }
        ArrayOp::Set { .. } => {}
        ArrayOp::Clear => array.clear()?,
        ArrayOp::ForceResync => array.set_dirty(),
    }
    Ok(())
}
