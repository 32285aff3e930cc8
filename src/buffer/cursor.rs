//! Bit-granular cursors over byte storage.
//!
//! Bits are packed most-significant first: bit position 0 is the top bit of
//! byte 0, bit position 7 is its lowest bit, bit position 8 is the top bit of
//! byte 1.

use crate::error::{CodecError, Result};
use crate::utils::{byte_count_bits, check_bit_length, fits_unsigned, mask};

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitCursor<'a> {
    /// Creates a cursor at bit position 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Current position in bits.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Moves the cursor to an absolute bit position.
    ///
    /// Positions past the end are accepted; the next read then fails with
    /// `EndOfData`.
    pub fn set_position(&mut self, bit_pos: usize) {
        self.bit_pos = bit_pos;
    }

    /// Total number of bits in the backing data.
    pub fn total_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Bits left between the cursor and the end of the data.
    pub fn remaining_bits(&self) -> usize {
        self.total_bits().saturating_sub(self.bit_pos)
    }

    /// Returns `true` if the cursor sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Skips forward to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = self.bit_pos.div_ceil(8) * 8;
    }

    /// The backing data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn ensure(&self, bits: usize) -> Result<()> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(CodecError::EndOfData {
                requested: bits,
                position: self.bit_pos,
                available,
            });
        }
        Ok(())
    }

    /// Returns the next `count` bits (1..=64) without consuming them.
    pub fn peek_bits(&self, count: u8) -> Result<u64> {
        check_bit_length(count, 64)?;
        let count = usize::from(count);
        self.ensure(count)?;

        let mut value = 0u64;
        let mut pos = self.bit_pos;
        let mut left = count;
        while left > 0 {
            let byte = self.data[pos / 8];
            let available = 8 - pos % 8;
            let take = available.min(left);
            let chunk = (byte >> (available - take)) & (mask(take as u8) as u8);
            value = (value << take) | u64::from(chunk);
            left -= take;
            pos += take;
        }
        Ok(value)
    }

    /// Consumes the next `count` bits (1..=64).
    pub fn read_bits(&mut self, count: u8) -> Result<u64> {
        let value = self.peek_bits(count)?;
        self.bit_pos += usize::from(count);
        Ok(value)
    }

    /// Consumes `count` whole bytes starting at the current (possibly unaligned) position.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let bits = byte_count_bits(count)?;
        self.ensure(bits)?;
        if self.is_aligned() {
            let start = self.bit_pos / 8;
            self.bit_pos += bits;
            return Ok(self.data[start..start + count].to_vec());
        }
        (0..count).map(|_| self.read_bits(8).map(|b| b as u8)).collect()
    }
}

/// Growable write cursor.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_pos: usize,
}

impl BitWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            bit_pos: 0,
        }
    }

    /// Current position in bits.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Appends the low `count` bits (1..=64) of `value`.
    ///
    /// Fails with `EncodingFailure` if `value` does not fit in `count` bits.
    pub fn write_bits(&mut self, count: u8, value: u64) -> Result<()> {
        check_bit_length(count, 64)?;
        if !fits_unsigned(value, count) {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {count} bits"
            )));
        }
        let mut left = usize::from(count);
        while left > 0 {
            let offset = self.bit_pos % 8;
            if offset == 0 {
                self.data.push(0);
            }
            let available = 8 - offset;
            let take = available.min(left);
            let chunk = ((value >> (left - take)) & mask(take as u8)) as u8;
            let index = self.bit_pos / 8;
            self.data[index] |= chunk << (available - take);
            self.bit_pos += take;
            left -= take;
        }
        Ok(())
    }

    /// Appends whole bytes at the current (possibly unaligned) position.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.bit_pos % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_pos += bytes.len() * 8;
            return Ok(());
        }
        for byte in bytes {
            self.write_bits(8, u64::from(*byte))?;
        }
        Ok(())
    }

    /// Written bytes; a trailing partial byte is zero-padded.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the writer and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_across_byte_boundary() {
        // 5 + 11 bits
        let mut cursor = BitCursor::new(&[0b1010_1110, 0b0101_0101]);
        assert_eq!(cursor.read_bits(5).unwrap(), 0b10101);
        assert_eq!(cursor.read_bits(11).unwrap(), 0b110_0101_0101);
        assert!(cursor.is_aligned());
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let cursor = BitCursor::new(&[0xAB]);
        assert_eq!(cursor.peek_bits(4).unwrap(), 0xA);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut cursor = BitCursor::new(&[0xFF]);
        cursor.read_bits(6).unwrap();
        let err = cursor.read_bits(3).unwrap_err();
        match err {
            CodecError::EndOfData {
                requested,
                position,
                available,
            } => {
                assert_eq!(requested, 3);
                assert_eq!(position, 6);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // A failed read leaves the cursor untouched.
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_huge_byte_count_is_an_error() {
        let mut cursor = BitCursor::new(&[0x00, 0x00]);
        assert!(cursor.read_bytes(usize::MAX / 4).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_64_bits() {
        let mut cursor = BitCursor::new(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]);
        assert_eq!(cursor.read_bits(64).unwrap(), 0x0123_4567_89AB_CDEF);
    }

    #[test]
    fn test_unaligned_bytes() {
        let mut cursor = BitCursor::new(&[0x0F, 0xF0]);
        cursor.read_bits(4).unwrap();
        assert_eq!(cursor.read_bytes(1).unwrap(), vec![0xFF]);
        assert_eq!(cursor.remaining_bits(), 4);
    }

    #[test]
    fn test_align_and_rewind() {
        let mut cursor = BitCursor::new(&[0x12, 0x34]);
        cursor.read_bits(3).unwrap();
        cursor.align_to_byte();
        assert_eq!(cursor.position(), 8);
        cursor.set_position(0);
        assert_eq!(cursor.read_bits(8).unwrap(), 0x12);
    }

    #[test]
    fn test_writer_packs_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1).unwrap();
        writer.write_bits(3, 0b010).unwrap();
        writer.write_bits(4, 0xF).unwrap();
        writer.write_bits(12, 0xABC).unwrap();
        assert_eq!(writer.bytes(), &[0b1010_1111, 0xAB, 0xC0]);
        assert_eq!(writer.position(), 20);
    }

    #[test]
    fn test_writer_rejects_oversized_value() {
        let mut writer = BitWriter::new();
        let err = writer.write_bits(3, 8).unwrap_err();
        assert!(matches!(err, CodecError::EncodingFailure { .. }));
        assert!(writer.bytes().is_empty());
    }

    #[test]
    fn test_unaligned_write_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(4, 0x1).unwrap();
        writer.write_bytes(&[0x23, 0x45]).unwrap();
        writer.write_bits(4, 0x6).unwrap();
        assert_eq!(writer.into_bytes(), vec![0x12, 0x34, 0x56]);
    }
}
