//! Buffered little-endian writer.

use crate::error::{CodecError, CodecResult};
use bytes::{BufMut, Bytes, BytesMut};

/// Append-only buffer that replication messages are written into.
///
/// All multi-byte integers are written little-endian. Variable-length
/// payloads (byte strings, text) carry a `u32` length prefix.
#[derive(Debug, Default, Clone)]
pub struct DeltaWriter {
    buffer: BytesMut,
}

impl DeltaWriter {
    /// Create a new, empty writer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Create a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Write a `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    /// Write a `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    /// Write a `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64_le(value);
    }

    /// Write an `i8`.
    pub fn write_i8(&mut self, value: i8) {
        self.buffer.put_i8(value);
    }

    /// Write an `i16`.
    pub fn write_i16(&mut self, value: i16) {
        self.buffer.put_i16_le(value);
    }

    /// Write an `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32_le(value);
    }

    /// Write an `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    /// Write an `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.put_f32_le(value);
    }

    /// Write an `f64`.
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.put_f64_le(value);
    }

    /// Write a boolean as a single `0`/`1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.put_u8(u8::from(value));
    }

    /// Write a `u32` length prefix followed by the bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is longer than `u32::MAX`.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| CodecError::SizeLimitExceeded {
            claimed: bytes.len() as u64,
            max_allowed: u64::from(u32::MAX),
        })?;
        self.buffer.put_u32_le(len);
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is longer than `u32::MAX` bytes.
    pub fn write_str(&mut self, text: &str) -> CodecResult<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume this writer and return the frozen bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Consume this writer and return the bytes as a vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}
