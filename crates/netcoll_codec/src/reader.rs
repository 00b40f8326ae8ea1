//! Bounds-checked little-endian reader.

use crate::error::{CodecError, CodecResult};
use bytes::Buf;

/// Maximum allowed length prefix for byte and text payloads.
/// Rejects absurd claims from untrusted input before allocating.
pub const MAX_BYTES_LENGTH: u64 = 16 * 1024 * 1024;

/// Cursor over a received replication message.
///
/// Every read checks the remaining length first, so a truncated
/// message surfaces as [`CodecError::UnexpectedEof`] instead of a panic.
pub struct DeltaReader<'a> {
    data: &'a [u8],
    consumed: usize,
}

impl<'a> DeltaReader<'a> {
    /// Create a new reader for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, consumed: 0 }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes read so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    #[inline]
    fn ensure(&self, needed: usize) -> CodecResult<()> {
        if self.data.len() < needed {
            return Err(CodecError::UnexpectedEof {
                needed,
                remaining: self.data.len(),
            });
        }
        Ok(())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.data.get_u8())
    }

    /// Read a `u16`.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        self.ensure(2)?;
        self.consumed += 2;
        Ok(self.data.get_u16_le())
    }

    /// Read a `u32`.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.data.get_u32_le())
    }

    /// Read a `u64`.
    pub fn read_u64(&mut self) -> CodecResult<u64> {
        self.ensure(8)?;
        self.consumed += 8;
        Ok(self.data.get_u64_le())
    }

    /// Read an `i8`.
    pub fn read_i8(&mut self) -> CodecResult<i8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.data.get_i8())
    }

    /// Read an `i16`.
    pub fn read_i16(&mut self) -> CodecResult<i16> {
        self.ensure(2)?;
        self.consumed += 2;
        Ok(self.data.get_i16_le())
    }

    /// Read an `i32`.
    pub fn read_i32(&mut self) -> CodecResult<i32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.data.get_i32_le())
    }

    /// Read an `i64`.
    pub fn read_i64(&mut self) -> CodecResult<i64> {
        self.ensure(8)?;
        self.consumed += 8;
        Ok(self.data.get_i64_le())
    }

    /// Read an `f32`.
    pub fn read_f32(&mut self) -> CodecResult<f32> {
        self.ensure(4)?;
        self.consumed += 4;
        Ok(self.data.get_f32_le())
    }

    /// Read an `f64`.
    pub fn read_f64(&mut self) -> CodecResult<f64> {
        self.ensure(8)?;
        self.consumed += 8;
        Ok(self.data.get_f64_le())
    }

    /// Read a boolean byte, rejecting anything but `0` or `1`.
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    /// Read exactly `len` raw bytes.
    pub fn read_raw(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        self.consumed += len;
        Ok(head)
    }

    /// Read a `u32` length prefix followed by that many bytes.
    pub fn read_bytes(&mut self) -> CodecResult<&'a [u8]> {
        let len = u64::from(self.read_u32()?);
        if len > MAX_BYTES_LENGTH {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_BYTES_LENGTH,
            });
        }
        self.read_raw(len as usize)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> CodecResult<&'a str> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}
