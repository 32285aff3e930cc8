//! Byte-backed buffers: the wire format.

use tracing::trace;

use super::cursor::{BitCursor, BitWriter};
use super::{encode_fixed_string, ContextKind, ReadBuffer, StringEncoding, WriteBuffer};
use crate::config::{ByteOrder, CodecConfig, DebugOptions};
use crate::error::{CodecError, Result, ResultExt};
use crate::utils::{check_bit_length, fits_signed, mask, sign_extend};

/// Swaps whole-byte fields wider than one byte when little-endian is selected.
fn apply_byte_order(byte_order: ByteOrder, bit_length: u8, raw: u64) -> u64 {
    match byte_order {
        ByteOrder::LittleEndian if bit_length > 8 && bit_length % 8 == 0 => {
            raw.swap_bytes() >> (64 - u32::from(bit_length))
        }
        _ => raw,
    }
}

/// Reads fields out of a borrowed byte slice.
///
/// # Example
///
/// ```
/// use plc4x_codec::{ReadBuffer, ReadBufferByteBased};
///
/// let mut rb = ReadBufferByteBased::new(&[0x12, 0x03]);
/// assert_eq!(rb.read_u8("mainGroup", 4).unwrap(), 1);
/// assert_eq!(rb.read_u8("middleGroup", 4).unwrap(), 2);
/// assert_eq!(rb.read_u8("subGroup", 8).unwrap(), 3);
/// assert!(!rb.has_more(1));
/// ```
#[derive(Debug, Clone)]
pub struct ReadBufferByteBased<'a> {
    cursor: BitCursor<'a>,
    byte_order: ByteOrder,
    debug: DebugOptions,
}

impl<'a> ReadBufferByteBased<'a> {
    /// Creates a big-endian reader over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, ByteOrder::BigEndian, DebugOptions::default())
    }

    /// Creates a reader with explicit byte order and diagnostics.
    pub fn with_options(data: &'a [u8], byte_order: ByteOrder, debug: DebugOptions) -> Self {
        Self {
            cursor: BitCursor::new(data),
            byte_order,
            debug,
        }
    }

    /// Creates a reader from a [`CodecConfig`].
    pub fn with_config(data: &'a [u8], config: &CodecConfig) -> Self {
        Self::with_options(data, config.byte_order, config.debug)
    }

    /// Byte order applied to multi-byte fields.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Size of the backing data in bytes.
    pub fn total_bytes(&self) -> usize {
        self.cursor.data().len()
    }

    /// Returns the byte `offset` bytes after the current byte position without consuming it.
    pub fn peek_byte(&self, offset: usize) -> Result<u8> {
        let index = self.cursor.position() / 8 + offset;
        self.cursor
            .data()
            .get(index)
            .copied()
            .ok_or(CodecError::EndOfData {
                requested: 8,
                position: index * 8,
                available: 0,
            })
    }

    /// Bytes from the current byte position to the end.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        let data = self.cursor.data();
        &data[(self.cursor.position() / 8).min(data.len())..]
    }

    fn read_raw(&mut self, logical_name: &str, bit_length: u8) -> Result<u64> {
        check_bit_length(bit_length, 64).parsing(logical_name)?;
        let raw = self.cursor.read_bits(bit_length).parsing(logical_name)?;
        Ok(apply_byte_order(self.byte_order, bit_length, raw))
    }

    fn trace_read(&self, logical_name: &str, bit_length: usize, value: &dyn std::fmt::Debug) {
        if self.debug.trace_fields {
            trace!(
                field = logical_name,
                bits = bit_length,
                position = self.cursor.position(),
                "read {:?}",
                value
            );
        }
    }
}

impl ReadBuffer for ReadBufferByteBased<'_> {
    fn bit_pos(&self) -> usize {
        self.cursor.position()
    }

    fn reset(&mut self, bit_pos: usize) {
        self.cursor.set_position(bit_pos);
    }

    fn has_more(&self, bit_length: usize) -> bool {
        self.cursor.remaining_bits() >= bit_length
    }

    fn pull_context(&mut self, _logical_name: &str, _kind: ContextKind) -> Result<()> {
        Ok(())
    }

    fn close_context(&mut self, _logical_name: &str, _kind: ContextKind) -> Result<()> {
        Ok(())
    }

    fn read_bit(&mut self, logical_name: &str) -> Result<bool> {
        let value = self.cursor.read_bits(1).parsing(logical_name)? == 1;
        self.trace_read(logical_name, 1, &value);
        Ok(value)
    }

    fn read_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u64> {
        let value = self.read_raw(logical_name, bit_length)?;
        self.trace_read(logical_name, usize::from(bit_length), &value);
        Ok(value)
    }

    fn read_int(&mut self, logical_name: &str, bit_length: u8) -> Result<i64> {
        let value = sign_extend(self.read_raw(logical_name, bit_length)?, bit_length);
        self.trace_read(logical_name, usize::from(bit_length), &value);
        Ok(value)
    }

    fn read_big_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u128> {
        check_bit_length(bit_length, 128).parsing(logical_name)?;
        if bit_length <= 64 {
            return self.read_uint(logical_name, bit_length).map(u128::from);
        }
        let bits = usize::from(bit_length);
        if !self.has_more(bits) {
            return Err(CodecError::EndOfData {
                requested: bits,
                position: self.cursor.position(),
                available: self.cursor.remaining_bits(),
            })
            .parsing(logical_name);
        }
        let high = self.cursor.read_bits(bit_length - 64).parsing(logical_name)?;
        let low = self.cursor.read_bits(64).parsing(logical_name)?;
        let value = (u128::from(high) << 64) | u128::from(low);
        self.trace_read(logical_name, bits, &value);
        Ok(value)
    }

    fn read_f32(&mut self, logical_name: &str) -> Result<f32> {
        let value = f32::from_bits(self.read_raw(logical_name, 32)? as u32);
        self.trace_read(logical_name, 32, &value);
        Ok(value)
    }

    fn read_f64(&mut self, logical_name: &str) -> Result<f64> {
        let value = f64::from_bits(self.read_raw(logical_name, 64)?);
        self.trace_read(logical_name, 64, &value);
        Ok(value)
    }

    fn read_byte_array(&mut self, logical_name: &str, count: usize) -> Result<Vec<u8>> {
        let value = self.cursor.read_bytes(count).parsing(logical_name)?;
        self.trace_read(logical_name, count * 8, &value);
        Ok(value)
    }

    fn read_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        encoding: StringEncoding,
    ) -> Result<String> {
        if bit_length % 8 != 0 {
            return Err(CodecError::invalid_value(format!(
                "string length {bit_length} is not a whole number of bytes"
            )))
            .parsing(logical_name);
        }
        let bytes = self.cursor.read_bytes(bit_length / 8).parsing(logical_name)?;
        let value = encoding.decode(&bytes).parsing(logical_name)?;
        self.trace_read(logical_name, bit_length, &value);
        Ok(value)
    }
}

/// Writes fields into a growable byte vector.
///
/// # Example
///
/// ```
/// use plc4x_codec::{WriteBuffer, WriteBufferByteBased};
///
/// let mut wb = WriteBufferByteBased::new();
/// wb.write_u8("mainGroup", 4, 1).unwrap();
/// wb.write_u8("middleGroup", 4, 2).unwrap();
/// wb.write_u8("subGroup", 8, 3).unwrap();
/// assert_eq!(wb.bytes(), &[0x12, 0x03]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteBufferByteBased {
    writer: BitWriter,
    byte_order: ByteOrder,
    debug: DebugOptions,
}

impl WriteBufferByteBased {
    /// Creates an empty big-endian writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with explicit byte order and diagnostics.
    pub fn with_options(byte_order: ByteOrder, debug: DebugOptions) -> Self {
        Self {
            writer: BitWriter::new(),
            byte_order,
            debug,
        }
    }

    /// Creates a writer from a [`CodecConfig`].
    pub fn with_config(config: &CodecConfig) -> Self {
        Self::with_options(config.byte_order, config.debug)
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        self.writer.bytes()
    }

    /// Consumes the writer and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }

    fn write_raw(&mut self, logical_name: &str, bit_length: u8, raw: u64) -> Result<()> {
        check_bit_length(bit_length, 64).serializing(logical_name)?;
        if bit_length < 64 && raw >> bit_length != 0 {
            return Err(CodecError::encoding(format!(
                "value {raw} does not fit in {bit_length} bits"
            )))
            .serializing(logical_name);
        }
        let raw = apply_byte_order(self.byte_order, bit_length, raw);
        self.writer
            .write_bits(bit_length, raw)
            .serializing(logical_name)
    }

    fn trace_write(&self, logical_name: &str, bit_length: usize, value: &dyn std::fmt::Debug) {
        if self.debug.trace_fields {
            trace!(
                field = logical_name,
                bits = bit_length,
                position = self.writer.position(),
                "write {:?}",
                value
            );
        }
    }
}

impl WriteBuffer for WriteBufferByteBased {
    fn bit_pos(&self) -> usize {
        self.writer.position()
    }

    fn push_context(&mut self, _logical_name: &str, _kind: ContextKind) -> Result<()> {
        Ok(())
    }

    fn pop_context(&mut self, _logical_name: &str, _kind: ContextKind) -> Result<()> {
        Ok(())
    }

    fn write_bit(&mut self, logical_name: &str, value: bool) -> Result<()> {
        self.trace_write(logical_name, 1, &value);
        self.writer
            .write_bits(1, u64::from(value))
            .serializing(logical_name)
    }

    fn write_uint(&mut self, logical_name: &str, bit_length: u8, value: u64) -> Result<()> {
        self.trace_write(logical_name, usize::from(bit_length), &value);
        self.write_raw(logical_name, bit_length, value)
    }

    fn write_int(&mut self, logical_name: &str, bit_length: u8, value: i64) -> Result<()> {
        check_bit_length(bit_length, 64).serializing(logical_name)?;
        if !fits_signed(value, bit_length) {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {bit_length} signed bits"
            )))
            .serializing(logical_name);
        }
        self.trace_write(logical_name, usize::from(bit_length), &value);
        self.write_raw(logical_name, bit_length, value as u64 & mask(bit_length))
    }

    fn write_big_uint(&mut self, logical_name: &str, bit_length: u8, value: u128) -> Result<()> {
        check_bit_length(bit_length, 128).serializing(logical_name)?;
        if bit_length < 128 && value >> bit_length != 0 {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {bit_length} bits"
            )))
            .serializing(logical_name);
        }
        if bit_length <= 64 {
            return self.write_uint(logical_name, bit_length, value as u64);
        }
        self.trace_write(logical_name, usize::from(bit_length), &value);
        self.writer
            .write_bits(bit_length - 64, (value >> 64) as u64)
            .serializing(logical_name)?;
        self.writer
            .write_bits(64, value as u64)
            .serializing(logical_name)
    }

    fn write_f32(&mut self, logical_name: &str, value: f32) -> Result<()> {
        self.trace_write(logical_name, 32, &value);
        self.write_raw(logical_name, 32, u64::from(value.to_bits()))
    }

    fn write_f64(&mut self, logical_name: &str, value: f64) -> Result<()> {
        self.trace_write(logical_name, 64, &value);
        self.write_raw(logical_name, 64, value.to_bits())
    }

    fn write_byte_array(&mut self, logical_name: &str, value: &[u8]) -> Result<()> {
        self.trace_write(logical_name, value.len() * 8, &value);
        self.writer.write_bytes(value).serializing(logical_name)
    }

    fn write_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        encoding: StringEncoding,
        value: &str,
    ) -> Result<()> {
        let bytes = encode_fixed_string(value, bit_length, encoding).serializing(logical_name)?;
        self.trace_write(logical_name, bit_length, &value);
        self.writer.write_bytes(&bytes).serializing(logical_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_byte_fields_end_aligned() {
        // 1+1+1+1+2+1+1 bits of a cEMI frame control octet
        let mut rb = ReadBufferByteBased::new(&[0b1011_0110]);
        assert!(rb.read_bit("standardFrame").unwrap());
        assert!(!rb.read_bit("polling").unwrap());
        assert!(rb.read_bit("notRepeated").unwrap());
        assert!(rb.read_bit("notAckFrame").unwrap());
        assert_eq!(rb.read_u8("priority", 2).unwrap(), 0b01);
        assert!(rb.read_bit("acknowledgeRequested").unwrap());
        assert!(!rb.read_bit("errorFlag").unwrap());
        assert_eq!(rb.bit_pos(), 8);
        assert_eq!(rb.pos(), 1);
    }

    #[test]
    fn test_four_plus_twelve() {
        let mut rb = ReadBufferByteBased::new(&[0x1F, 0xFE]);
        assert_eq!(rb.read_u8("numberOfElements", 4).unwrap(), 1);
        assert_eq!(rb.read_u16("startIndex", 12).unwrap(), 0xFFE);
        assert_eq!(rb.bit_pos(), 16);
    }

    #[test]
    fn test_signed_six_bits() {
        let mut rb = ReadBufferByteBased::new(&[0b1111_1100]);
        assert_eq!(rb.read_u8("apci", 2).unwrap(), 0b11);
        assert_eq!(rb.read_i8("dataFirstByte", 6).unwrap(), -4);
    }

    #[test]
    fn test_floats_big_and_little_endian() {
        let be = [0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18];
        let mut rb = ReadBufferByteBased::new(&be);
        assert_eq!(rb.read_f64("value").unwrap(), std::f64::consts::PI);

        let mut le = be;
        le.reverse();
        let mut rb =
            ReadBufferByteBased::with_options(&le, ByteOrder::LittleEndian, DebugOptions::default());
        assert_eq!(rb.read_f64("value").unwrap(), std::f64::consts::PI);
    }

    #[test]
    fn test_little_endian_integers() {
        let mut wb = WriteBufferByteBased::with_options(ByteOrder::LittleEndian, DebugOptions::default());
        wb.write_u16("a", 16, 0x1234).unwrap();
        wb.write_u32("b", 32, 0xAABBCCDD).unwrap();
        wb.write_u8("c", 8, 0x7F).unwrap();
        let bytes = wb.into_bytes();
        assert_eq!(bytes, vec![0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA, 0x7F]);

        let mut rb =
            ReadBufferByteBased::with_options(&bytes, ByteOrder::LittleEndian, DebugOptions::default());
        assert_eq!(rb.read_u16("a", 16).unwrap(), 0x1234);
        assert_eq!(rb.read_u32("b", 32).unwrap(), 0xAABBCCDD);
        assert_eq!(rb.read_u8("c", 8).unwrap(), 0x7F);
    }

    #[test]
    fn test_end_of_data_carries_field_name() {
        let mut rb = ReadBufferByteBased::new(&[0x00]);
        let err = rb.read_u16("quantity", 16).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'quantity'"));
        assert!(matches!(err.root_cause(), CodecError::EndOfData { .. }));
    }

    #[test]
    fn test_invalid_bit_length() {
        let mut rb = ReadBufferByteBased::new(&[0; 16]);
        assert!(rb.read_uint("x", 0).is_err());
        assert!(rb.read_uint("x", 65).is_err());
        assert!(rb.read_u8("x", 9).is_err());
        assert_eq!(rb.bit_pos(), 0);
    }

    #[test]
    fn test_huge_byte_array_is_an_error() {
        let mut rb = ReadBufferByteBased::new(&[0; 2]);
        let err = rb.read_byte_array("x", usize::MAX / 4).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'x'"));
        assert_eq!(rb.bit_pos(), 0);
    }

    #[test]
    fn test_big_uint() {
        let mut wb = WriteBufferByteBased::new();
        let value = (0xABu128 << 64) | 0x0102_0304_0506_0708;
        wb.write_big_uint("serial", 72, value).unwrap();
        let bytes = wb.into_bytes();
        assert_eq!(bytes.len(), 9);
        let mut rb = ReadBufferByteBased::new(&bytes);
        assert_eq!(rb.read_big_uint("serial", 72).unwrap(), value);
    }

    #[test]
    fn test_signed_range_checked_on_write() {
        let mut wb = WriteBufferByteBased::new();
        wb.write_int("v", 6, -32).unwrap();
        let err = wb.write_int("v", 6, 32).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::EncodingFailure { .. }));
    }

    #[test]
    fn test_strings() {
        let mut wb = WriteBufferByteBased::new();
        wb.write_string("name", 64, StringEncoding::Ascii, "PLC").unwrap();
        let bytes = wb.into_bytes();
        assert_eq!(bytes, b"PLC\0\0\0\0\0");
        let mut rb = ReadBufferByteBased::new(&bytes);
        assert_eq!(
            rb.read_string("name", 64, StringEncoding::Ascii).unwrap(),
            "PLC"
        );
    }

    #[test]
    fn test_peek_and_reset() {
        let mut rb = ReadBufferByteBased::new(&[0x01, 0x02, 0x03]);
        assert_eq!(rb.peek_byte(2).unwrap(), 0x03);
        assert!(rb.peek_byte(3).is_err());
        rb.read_byte("a").unwrap();
        assert_eq!(rb.remaining_bytes(), &[0x02, 0x03]);
        rb.reset(0);
        assert_eq!(rb.read_byte("a").unwrap(), 0x01);
        assert_eq!(rb.total_bytes(), 3);
    }
}
