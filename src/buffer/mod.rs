//! Bit-addressable read and write buffers.
//!
//! [`ReadBuffer`] and [`WriteBuffer`] are the only surface the protocol
//! codecs talk to. Two backends implement them:
//!
//! | Backend | Reader | Writer | Purpose |
//! |---------|--------|--------|---------|
//! | bytes | [`ReadBufferByteBased`] | [`WriteBufferByteBased`] | wire format |
//! | XML | [`XmlReadBuffer`] | [`XmlWriteBuffer`] | golden files, diffs |
//!
//! Every typed call takes the field's logical name. The byte backend only
//! uses it for error paths and tracing; the XML backend turns it into the
//! element name.

pub mod byte_based;
pub mod cursor;
pub mod xml_based;

pub use byte_based::{ReadBufferByteBased, WriteBufferByteBased};
pub use cursor::{BitCursor, BitWriter};
pub use xml_based::{XmlReadBuffer, XmlWriteBuffer};

use crate::error::{CodecError, Result};
use crate::utils::check_bit_length;

/// What a context marker brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// A message or a single sub-message field.
    Element,
    /// A repeated field.
    List,
}

/// Text encodings for string fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString,
)]
pub enum StringEncoding {
    /// UTF-8.
    #[default]
    #[strum(serialize = "UTF-8")]
    Utf8,
    /// 7-bit ASCII.
    #[strum(serialize = "ASCII")]
    Ascii,
    /// UTF-16, big-endian code units.
    #[strum(serialize = "UTF-16BE")]
    Utf16Be,
}

impl StringEncoding {
    /// Encodes `text` without padding.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            StringEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            StringEncoding::Ascii => {
                if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
                    return Err(CodecError::encoding(format!(
                        "character {c:?} is not representable in ASCII"
                    )));
                }
                Ok(text.as_bytes().to_vec())
            }
            StringEncoding::Utf16Be => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect()),
        }
    }

    /// Decodes `bytes`, dropping trailing NUL padding.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let text = match self {
            StringEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| CodecError::encoding(format!("invalid UTF-8: {e}")))?,
            StringEncoding::Ascii => {
                if bytes.iter().any(|b| !b.is_ascii()) {
                    return Err(CodecError::encoding("non-ASCII byte in ASCII string"));
                }
                bytes.iter().map(|b| char::from(*b)).collect()
            }
            StringEncoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(CodecError::encoding("odd byte count for UTF-16BE"));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| CodecError::encoding(format!("invalid UTF-16: {e}")))?
            }
        };
        Ok(text.trim_end_matches('\0').to_string())
    }
}

/// Encodes `text` and NUL-pads it to exactly `bit_length` bits.
pub(crate) fn encode_fixed_string(
    text: &str,
    bit_length: usize,
    encoding: StringEncoding,
) -> Result<Vec<u8>> {
    if bit_length % 8 != 0 {
        return Err(CodecError::invalid_value(format!(
            "string length {bit_length} is not a whole number of bytes"
        )));
    }
    let mut bytes = encoding.encode(text)?;
    let width = bit_length / 8;
    if bytes.len() > width {
        return Err(CodecError::encoding(format!(
            "{} encoded bytes do not fit in {width}",
            bytes.len()
        )));
    }
    bytes.resize(width, 0);
    Ok(bytes)
}

/// Typed, bit-granular reads.
///
/// Scalar widths are given in bits. `read_uint`/`read_int` take 1..=64 bits,
/// `read_big_uint` takes 1..=128 bits. Reading past the end fails with
/// [`CodecError::EndOfData`]; there is no zero fill.
pub trait ReadBuffer {
    /// Position in bits from the start of the buffer.
    fn bit_pos(&self) -> usize;

    /// Position in whole bytes.
    fn pos(&self) -> usize {
        self.bit_pos() / 8
    }

    /// Moves back (or forward) to an absolute bit position.
    fn reset(&mut self, bit_pos: usize);

    /// Returns `true` if at least `bit_length` more bits can be read.
    ///
    /// The XML backend has no byte count and answers whether another element
    /// follows in the current context.
    fn has_more(&self, bit_length: usize) -> bool;

    /// Enters a named context.
    fn pull_context(&mut self, logical_name: &str, kind: ContextKind) -> Result<()>;

    /// Leaves a named context.
    fn close_context(&mut self, logical_name: &str, kind: ContextKind) -> Result<()>;

    /// Reads one bit.
    fn read_bit(&mut self, logical_name: &str) -> Result<bool>;

    /// Reads an unsigned integer of `bit_length` bits.
    fn read_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u64>;

    /// Reads a two's complement integer of `bit_length` bits.
    fn read_int(&mut self, logical_name: &str, bit_length: u8) -> Result<i64>;

    /// Reads an unsigned integer wider than 64 bits.
    fn read_big_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u128>;

    /// Reads an IEEE-754 single.
    fn read_f32(&mut self, logical_name: &str) -> Result<f32>;

    /// Reads an IEEE-754 double.
    fn read_f64(&mut self, logical_name: &str) -> Result<f64>;

    /// Reads `count` bytes.
    fn read_byte_array(&mut self, logical_name: &str, count: usize) -> Result<Vec<u8>>;

    /// Reads a string occupying exactly `bit_length` bits.
    fn read_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        encoding: StringEncoding,
    ) -> Result<String>;

    /// Reads one opaque byte.
    fn read_byte(&mut self, logical_name: &str) -> Result<u8> {
        let bytes = self.read_byte_array(logical_name, 1)?;
        bytes
            .first()
            .copied()
            .ok_or_else(|| CodecError::cast(format!("'{logical_name}' produced no byte")))
    }

    /// Reads an unsigned field of at most 8 bits.
    fn read_u8(&mut self, logical_name: &str, bit_length: u8) -> Result<u8> {
        check_bit_length(bit_length, 8)?;
        Ok(self.read_uint(logical_name, bit_length)? as u8)
    }

    /// Reads an unsigned field of at most 16 bits.
    fn read_u16(&mut self, logical_name: &str, bit_length: u8) -> Result<u16> {
        check_bit_length(bit_length, 16)?;
        Ok(self.read_uint(logical_name, bit_length)? as u16)
    }

    /// Reads an unsigned field of at most 32 bits.
    fn read_u32(&mut self, logical_name: &str, bit_length: u8) -> Result<u32> {
        check_bit_length(bit_length, 32)?;
        Ok(self.read_uint(logical_name, bit_length)? as u32)
    }

    /// Reads an unsigned field of at most 64 bits.
    fn read_u64(&mut self, logical_name: &str, bit_length: u8) -> Result<u64> {
        self.read_uint(logical_name, bit_length)
    }

    /// Reads a signed field of at most 8 bits.
    fn read_i8(&mut self, logical_name: &str, bit_length: u8) -> Result<i8> {
        check_bit_length(bit_length, 8)?;
        Ok(self.read_int(logical_name, bit_length)? as i8)
    }

    /// Reads a signed field of at most 16 bits.
    fn read_i16(&mut self, logical_name: &str, bit_length: u8) -> Result<i16> {
        check_bit_length(bit_length, 16)?;
        Ok(self.read_int(logical_name, bit_length)? as i16)
    }

    /// Reads a signed field of at most 32 bits.
    fn read_i32(&mut self, logical_name: &str, bit_length: u8) -> Result<i32> {
        check_bit_length(bit_length, 32)?;
        Ok(self.read_int(logical_name, bit_length)? as i32)
    }

    /// Reads a signed field of at most 64 bits.
    fn read_i64(&mut self, logical_name: &str, bit_length: u8) -> Result<i64> {
        self.read_int(logical_name, bit_length)
    }
}

/// Typed, bit-granular writes; the mirror of [`ReadBuffer`].
///
/// Writes never run out of room. They fail when a value does not fit its
/// declared width or encoding.
pub trait WriteBuffer {
    /// Position in bits from the start of the buffer.
    fn bit_pos(&self) -> usize;

    /// Position in whole bytes.
    fn pos(&self) -> usize {
        self.bit_pos() / 8
    }

    /// Opens a named context.
    fn push_context(&mut self, logical_name: &str, kind: ContextKind) -> Result<()>;

    /// Closes a named context.
    fn pop_context(&mut self, logical_name: &str, kind: ContextKind) -> Result<()>;

    /// Writes one bit.
    fn write_bit(&mut self, logical_name: &str, value: bool) -> Result<()>;

    /// Writes an unsigned integer of `bit_length` bits.
    fn write_uint(&mut self, logical_name: &str, bit_length: u8, value: u64) -> Result<()>;

    /// Writes a two's complement integer of `bit_length` bits.
    fn write_int(&mut self, logical_name: &str, bit_length: u8, value: i64) -> Result<()>;

    /// Writes an unsigned integer wider than 64 bits.
    fn write_big_uint(&mut self, logical_name: &str, bit_length: u8, value: u128) -> Result<()>;

    /// Writes an IEEE-754 single.
    fn write_f32(&mut self, logical_name: &str, value: f32) -> Result<()>;

    /// Writes an IEEE-754 double.
    fn write_f64(&mut self, logical_name: &str, value: f64) -> Result<()>;

    /// Writes raw bytes.
    fn write_byte_array(&mut self, logical_name: &str, value: &[u8]) -> Result<()>;

    /// Writes a string NUL-padded to exactly `bit_length` bits.
    fn write_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        encoding: StringEncoding,
        value: &str,
    ) -> Result<()>;

    /// Writes an enum value together with its symbolic name.
    ///
    /// Only structured backends keep the name.
    fn write_uint_annotated(
        &mut self,
        logical_name: &str,
        bit_length: u8,
        value: u64,
        _representation: &str,
    ) -> Result<()> {
        self.write_uint(logical_name, bit_length, value)
    }

    /// Writes one opaque byte.
    fn write_byte(&mut self, logical_name: &str, value: u8) -> Result<()> {
        self.write_byte_array(logical_name, &[value])
    }

    /// Writes an unsigned field of at most 8 bits.
    fn write_u8(&mut self, logical_name: &str, bit_length: u8, value: u8) -> Result<()> {
        check_bit_length(bit_length, 8)?;
        self.write_uint(logical_name, bit_length, u64::from(value))
    }

    /// Writes an unsigned field of at most 16 bits.
    fn write_u16(&mut self, logical_name: &str, bit_length: u8, value: u16) -> Result<()> {
        check_bit_length(bit_length, 16)?;
        self.write_uint(logical_name, bit_length, u64::from(value))
    }

    /// Writes an unsigned field of at most 32 bits.
    fn write_u32(&mut self, logical_name: &str, bit_length: u8, value: u32) -> Result<()> {
        check_bit_length(bit_length, 32)?;
        self.write_uint(logical_name, bit_length, u64::from(value))
    }

    /// Writes an unsigned field of at most 64 bits.
    fn write_u64(&mut self, logical_name: &str, bit_length: u8, value: u64) -> Result<()> {
        self.write_uint(logical_name, bit_length, value)
    }

    /// Writes a signed field of at most 8 bits.
    fn write_i8(&mut self, logical_name: &str, bit_length: u8, value: i8) -> Result<()> {
        check_bit_length(bit_length, 8)?;
        self.write_int(logical_name, bit_length, i64::from(value))
    }

    /// Writes a signed field of at most 16 bits.
    fn write_i16(&mut self, logical_name: &str, bit_length: u8, value: i16) -> Result<()> {
        check_bit_length(bit_length, 16)?;
        self.write_int(logical_name, bit_length, i64::from(value))
    }

    /// Writes a signed field of at most 32 bits.
    fn write_i32(&mut self, logical_name: &str, bit_length: u8, value: i32) -> Result<()> {
        check_bit_length(bit_length, 32)?;
        self.write_int(logical_name, bit_length, i64::from(value))
    }

    /// Writes a signed field of at most 64 bits.
    fn write_i64(&mut self, logical_name: &str, bit_length: u8, value: i64) -> Result<()> {
        self.write_int(logical_name, bit_length, value)
    }
}
