//! Per-element codecs.
//!
//! A replicated collection never inspects its elements. It hands each
//! value to an [`ElementCodec`] and trusts it to read back exactly the
//! bytes it wrote.

use crate::error::{CodecError, CodecResult};
use crate::reader::DeltaReader;
use crate::writer::DeltaWriter;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes and decodes individual collection elements.
pub trait ElementCodec<T> {
    /// Write `value` to the writer.
    fn encode(&self, writer: &mut DeltaWriter, value: &T) -> CodecResult<()>;

    /// Read one value from the reader.
    ///
    /// Must consume exactly the bytes [`ElementCodec::encode`] produced.
    fn decode(&self, reader: &mut DeltaReader<'_>) -> CodecResult<T>;
}

/// Types with a fixed native binary layout.
pub trait WireElement: Sized {
    /// Write this value.
    fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()>;

    /// Read a value.
    fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self>;
}

macro_rules! wire_primitive {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl WireElement for $ty {
                fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()> {
                    writer.$write(*self);
                    Ok(())
                }

                fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

wire_primitive! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
    bool => write_bool, read_bool;
}

impl WireElement for String {
    fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()> {
        writer.write_str(self)
    }

    fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self> {
        reader.read_str().map(str::to_owned)
    }
}

impl<T: WireElement> WireElement for Option<T> {
    fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()> {
        match self {
            Some(value) => {
                writer.write_bool(true);
                value.write_to(writer)
            }
            None => {
                writer.write_bool(false);
                Ok(())
            }
        }
    }

    fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self> {
        if reader.read_bool()? {
            T::read_from(reader).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<T: WireElement> WireElement for Vec<T> {
    fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()> {
        let len = u32::try_from(self.len())
            .map_err(|_| CodecError::encoding_failed("vector longer than u32::MAX"))?;
        writer.write_u32(len);
        for item in self {
            item.write_to(writer)?;
        }
        Ok(())
    }

    fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self> {
        let len = reader.read_u32()? as usize;
        // Every element takes at least one byte, so a claim longer than
        // the buffer cannot be honest.
        if len > reader.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed: len,
                remaining: reader.remaining(),
            });
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::read_from(reader)?);
        }
        Ok(items)
    }
}

impl<A: WireElement, B: WireElement> WireElement for (A, B) {
    fn write_to(&self, writer: &mut DeltaWriter) -> CodecResult<()> {
        self.0.write_to(writer)?;
        self.1.write_to(writer)
    }

    fn read_from(reader: &mut DeltaReader<'_>) -> CodecResult<Self> {
        Ok((A::read_from(reader)?, B::read_from(reader)?))
    }
}

/// Codec for any [`WireElement`] using its native layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeCodec;

impl<T: WireElement> ElementCodec<T> for NativeCodec {
    fn encode(&self, writer: &mut DeltaWriter, value: &T) -> CodecResult<()> {
        value.write_to(writer)
    }

    fn decode(&self, reader: &mut DeltaReader<'_>) -> CodecResult<T> {
        T::read_from(reader)
    }
}

/// Codec for any `serde` type, written as a length-prefixed CBOR blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborCodec;

impl<T: Serialize + DeserializeOwned> ElementCodec<T> for CborCodec {
    fn encode(&self, writer: &mut DeltaWriter, value: &T) -> CodecResult<()> {
        let mut buffer = Vec::new();
        ciborium::into_writer(value, &mut buffer)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        writer.write_bytes(&buffer)
    }

    fn decode(&self, reader: &mut DeltaReader<'_>) -> CodecResult<T> {
        let bytes = reader.read_bytes()?;
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}
