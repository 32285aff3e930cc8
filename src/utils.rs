//! Bit arithmetic and text helpers shared by the buffer backends.
//!
//! # Example
//!
//! ```
//! use plc4x_codec::utils::{fits_signed, mask, sign_extend};
//!
//! assert_eq!(mask(3), 0b111);
//! assert_eq!(sign_extend(0b11_1111, 6), -1);
//! assert!(fits_signed(-32, 6));
//! assert!(!fits_signed(32, 6));
//! ```

use crate::error::{CodecError, Result};

/// Returns a mask with the low `bits` bits set.
///
/// `bits` of 64 or more yields `u64::MAX`.
pub fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Interprets the low `bits` bits of `raw` as a two's complement number.
pub fn sign_extend(raw: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let raw = raw & mask(bits);
    if raw & (1u64 << (bits - 1)) != 0 {
        (raw | !mask(bits)) as i64
    } else {
        raw as i64
    }
}

/// Returns `true` if `value` fits in an unsigned field of `bits` bits.
pub fn fits_unsigned(value: u64, bits: u8) -> bool {
    bits >= 64 || value >> bits == 0
}

/// Returns `true` if `value` fits in a two's complement field of `bits` bits.
pub fn fits_signed(value: i64, bits: u8) -> bool {
    if bits >= 64 {
        return true;
    }
    if bits == 0 {
        return false;
    }
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&value)
}

/// Checks that a scalar field width is between 1 and `max` bits.
pub fn check_bit_length(bits: u8, max: u8) -> Result<()> {
    if bits == 0 || bits > max {
        return Err(CodecError::invalid_value(format!(
            "bit length {bits} outside 1..={max}"
        )));
    }
    Ok(())
}

/// Formats bytes as a `0x`-prefixed lowercase hex string.
///
/// # Example
///
/// ```
/// use plc4x_codec::utils::format_hex_bytes;
///
/// assert_eq!(format_hex_bytes(&[0xAF, 0xFE]), "0xaffe");
/// assert_eq!(format_hex_bytes(&[]), "0x");
/// ```
pub fn format_hex_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Converts a byte count into bits, failing instead of overflowing.
///
/// # Example
///
/// ```
/// use plc4x_codec::utils::byte_count_bits;
///
/// assert_eq!(byte_count_bits(3).unwrap(), 24);
/// assert!(byte_count_bits(usize::MAX).is_err());
/// ```
pub fn byte_count_bits(count: usize) -> Result<usize> {
    count
        .checked_mul(8)
        .ok_or_else(|| CodecError::invalid_value(format!("{count} bytes overflow a bit count")))
}

/// Parses a hex string with or without the `0x` prefix.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| CodecError::invalid_value(format!("bad hex '{text}': {e}")))
}

/// Drops characters that cannot appear in XML 1.0 text.
///
/// Tab, CR and LF survive; other control characters and the
/// non-characters `U+FFFE`/`U+FFFF` are removed.
pub fn sanitize_xml_text(text: &str) -> String {
    text.chars()
        .filter(|c| match *c {
            '\t' | '\n' | '\r' => true,
            c if c < ' ' => false,
            '\u{7F}' => false,
            '\u{FFFE}' | '\u{FFFF}' => false,
            _ => true,
        })
        .collect()
}
