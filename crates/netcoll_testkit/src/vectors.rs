//! Wire-format test vectors.
//!
//! Each vector pins one delta message (hex-encoded) together with the
//! replica contents before and after applying it, or the error applying it
//! must raise. Elements are `i32` under the native codec.

use netcoll_codec::DeltaReader;
use netcoll_core::{CoreError, NetworkVariable, ReplicatedArray, ReplicatedList, ReplicationSettings};
use serde::{Deserialize, Serialize};

/// Collection kind a vector targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorTarget {
    /// Fixed-length array; its length is the length of `before`.
    Array,
    /// Variable-length list.
    List,
}

/// A wire message and its expected effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Collection the message is applied to.
    pub target: VectorTarget,
    /// Replica contents before the message.
    pub before: Vec<i32>,
    /// The message (hex-encoded).
    pub message_hex: String,
    /// Replica contents after the message.
    pub after: Vec<i32>,
    /// Expected error message (if applying should fail).
    pub expected_error: Option<String>,
}

fn vector(
    id: &str,
    description: &str,
    target: VectorTarget,
    before: &[i32],
    message_hex: &str,
    after: &[i32],
) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        target,
        before: before.to_vec(),
        message_hex: message_hex.into(),
        after: after.to_vec(),
        expected_error: None,
    }
}

fn failing(
    id: &str,
    description: &str,
    target: VectorTarget,
    before: &[i32],
    message_hex: &str,
    error: &str,
) -> TestVector {
    TestVector {
        expected_error: Some(error.into()),
        ..vector(id, description, target, before, message_hex, before)
    }
}

/// List message vectors.
pub fn list_vectors() -> Vec<TestVector> {
    use VectorTarget::List;
    vec![
        vector("list_add", "Add 5 to an empty list", List, &[], "0100 00 05000000", &[5]),
        vector(
            "list_insert_front",
            "Insert 9 at index 0",
            List,
            &[1],
            "0100 01 00000000 09000000",
            &[9, 1],
        ),
        vector(
            "list_insert_order",
            "Insert(0, 1) then Insert(0, 2) keeps send order",
            List,
            &[],
            "0200 01 00000000 01000000 01 00000000 02000000",
            &[2, 1],
        ),
        vector(
            "list_remove_value",
            "Remove carries only the value; receiver finds index 1",
            List,
            &[1, 2, 3],
            "0100 02 02000000",
            &[1, 3],
        ),
        vector(
            "list_remove_missing",
            "Remove of an absent value is a no-op",
            List,
            &[1, 3],
            "0100 02 63000000",
            &[1, 3],
        ),
        vector(
            "list_remove_at",
            "RemoveAt index 1",
            List,
            &[1, 2, 3],
            "0100 03 01000000",
            &[1, 3],
        ),
        vector(
            "list_set_value",
            "SetValue index 1 to 7",
            List,
            &[1, 2],
            "0100 04 01000000 07000000",
            &[1, 7],
        ),
        vector("list_clear", "Clear removes every element", List, &[1, 2], "0100 05", &[]),
        vector(
            "list_full",
            "Full replaces the contents",
            List,
            &[9],
            "0100 06 0200 04000000 05000000",
            &[4, 5],
        ),
        vector("list_empty_message", "No events", List, &[1], "0000", &[1]),
        failing(
            "list_remove_at_out_of_range",
            "RemoveAt past the end is a desync",
            List,
            &[1, 2],
            "0100 03 02000000",
            "protocol desync: RemoveAt index 2 out of range for length 2",
        ),
        failing(
            "list_set_out_of_range",
            "SetValue past the end is a desync",
            List,
            &[],
            "0100 04 00000000 01000000",
            "protocol desync: SetValue index 0 out of range for length 0",
        ),
        failing(
            "list_unknown_tag",
            "Tag 42 is not an event kind",
            List,
            &[],
            "0100 2a",
            "unknown event tag: 42",
        ),
    ]
}

/// Array message vectors.
pub fn array_vectors() -> Vec<TestVector> {
    use VectorTarget::Array;
    vec![
        vector(
            "array_set_value",
            "SetValue index 0 to 5",
            Array,
            &[0, 0, 0],
            "0100 04 00000000 05000000",
            &[5, 0, 0],
        ),
        vector("array_clear", "Clear resets every slot", Array, &[1, 2], "0100 05", &[0, 0]),
        vector(
            "array_full",
            "Full re-specifies every slot",
            Array,
            &[0, 0],
            "0100 06 0200 03000000 04000000",
            &[3, 4],
        ),
        failing(
            "array_full_wrong_length",
            "Full with a count other than the fixed length",
            Array,
            &[0, 0],
            "0100 06 0100 03000000",
            "snapshot length mismatch: expected 2 elements, got 1",
        ),
        failing(
            "array_add_rejected",
            "Arrays do not accept list events",
            Array,
            &[0],
            "0100 00 01000000",
            "Add events are not supported by array collections",
        ),
    ]
}

/// Applies a vector's message to a fresh replica seeded with `before`.
///
/// Returns the replica contents on success.
pub fn apply_vector(vector: &TestVector) -> Result<Vec<i32>, CoreError> {
    let (binding, _) = crate::fixtures::server_binding(1);
    let message = hex_decode(&vector.message_hex);
    let mut reader = DeltaReader::new(&message);
    match vector.target {
        VectorTarget::List => {
            let mut list: ReplicatedList<i32> = ReplicatedList::from_items(
                binding,
                ReplicationSettings::default(),
                vector.before.iter().copied(),
            )?;
            list.read_delta(&mut reader, false)?;
            Ok(list.as_slice().to_vec())
        }
        VectorTarget::Array => {
            let mut array: ReplicatedArray<i32> = ReplicatedArray::from_items(
                binding,
                ReplicationSettings::default(),
                vector.before.len(),
                vector.before.iter().copied(),
            )?;
            array.read_delta(&mut reader, false)?;
            Ok(array.as_slice().to_vec())
        }
    }
}

/// Generate all test vectors as JSON for cross-language use.
pub fn all_vectors_json() -> serde_json::Result<String> {
    let vectors = AllTestVectors {
        list: list_vectors(),
        array: array_vectors(),
    };
    serde_json::to_string_pretty(&vectors)
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    list: Vec<TestVector>,
    array: Vec<TestVector>,
}

/// Encodes bytes as lowercase hexadecimal.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal, ignoring whitespace.
///
/// # Panics
///
/// Panics with "Invalid hex" on characters that are not hex digits or on
/// an odd number of digits.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .expect("Invalid hex")
        })
        .collect()
}
