//! # netcoll Codec
//!
//! Binary buffers and element codecs for netcoll replication messages.
//!
//! This crate provides the byte-level plumbing the replicated collections
//! are built on:
//! - [`DeltaWriter`] / [`DeltaReader`]: little-endian buffered writer and
//!   bounds-checked reader
//! - [`ElementCodec`]: the per-element serializer a collection delegates to
//! - [`NativeCodec`]: fixed layouts for primitives, strings, options and vectors
//! - [`CborCodec`]: any `serde` type as a length-prefixed CBOR blob
//!
//! ## Usage
//!
//! ```
//! use netcoll_codec::{DeltaReader, DeltaWriter, ElementCodec, NativeCodec};
//!
//! let mut writer = DeltaWriter::new();
//! NativeCodec.encode(&mut writer, &42u32).unwrap();
//!
//! let bytes = writer.into_vec();
//! let mut reader = DeltaReader::new(&bytes);
//! let value: u32 = NativeCodec.decode(&mut reader).unwrap();
//! assert_eq!(value, 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod element;
mod error;
mod reader;
mod writer;

pub use element::{CborCodec, ElementCodec, NativeCodec, WireElement};
pub use error::{CodecError, CodecResult};
pub use reader::{DeltaReader, MAX_BYTES_LENGTH};
pub use writer::DeltaWriter;
