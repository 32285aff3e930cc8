//! Bridge from undecoded payload bytes to generic PLC values.
//!
//! Protocol codecs keep application data opaque. Higher layers turn it into
//! values through [`parse_plc_value`], naming the IEC 61131-3 type they
//! expect, or keep it as a [`RawPlcValue`] and index into the bytes.
//!
//! | Type | Bits | Value |
//! |------|------|-------|
//! | `BOOL` | 1 | [`PlcValue::Bool`] |
//! | `BYTE` `WORD` `DWORD` `LWORD` | 8/16/32/64 | [`PlcValue::Unsigned`] |
//! | `USINT` `UINT` `UDINT` `ULINT` | 8/16/32/64 | [`PlcValue::Unsigned`] |
//! | `SINT` `INT` `DINT` `LINT` | 8/16/32/64 | [`PlcValue::Signed`] |
//! | `REAL` `LREAL` | 32/64 | [`PlcValue::Real`] |
//! | `CHAR` | 8 | [`PlcValue::Char`] |
//! | `STRING` | 8 per character | [`PlcValue::String`] |
//! | anything else | 8 per byte | [`PlcValue::Raw`] |
//!
//! # Example
//!
//! ```
//! use plc4x_codec::value::{PlcValue, RawPlcValue};
//!
//! let raw = RawPlcValue::new(vec![0x00, 0x2A, 0xFF, 0xFE]);
//! assert_eq!(raw.decode("INT", 2).unwrap(), PlcValue::List(vec![
//!     PlcValue::Signed(42),
//!     PlcValue::Signed(-2),
//! ]));
//! assert_eq!(raw.get_index(1), Some(PlcValue::Unsigned(0x2A)));
//! ```

use std::fmt;

use crate::buffer::{ReadBuffer, ReadBufferByteBased, StringEncoding};
use crate::error::{CodecError, Result};
use crate::utils::byte_count_bits;

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum PlcValue {
    /// `BOOL`.
    Bool(bool),
    /// Any unsigned integer or bit string type.
    Unsigned(u64),
    /// Any signed integer type.
    Signed(i64),
    /// `REAL` or `LREAL`.
    Real(f64),
    /// `CHAR`.
    Char(char),
    /// `STRING`.
    String(String),
    /// More than one element.
    List(Vec<PlcValue>),
    /// Bytes of a type the bridge does not decode.
    Raw(RawPlcValue),
}

impl PlcValue {
    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlcValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as an unsigned integer, when it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PlcValue::Unsigned(value) => Some(*value),
            PlcValue::Signed(value) => u64::try_from(*value).ok(),
            PlcValue::Bool(value) => Some(u64::from(*value)),
            _ => None,
        }
    }

    /// The value as a signed integer, when it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PlcValue::Signed(value) => Some(*value),
            PlcValue::Unsigned(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// The value as a float. Integers are converted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PlcValue::Real(value) => Some(*value),
            PlcValue::Unsigned(value) => Some(*value as f64),
            PlcValue::Signed(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// The text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlcValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// The elements of a list, or the value itself as a one-element slice.
    pub fn as_list(&self) -> &[PlcValue] {
        match self {
            PlcValue::List(values) => values,
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcValue::Bool(value) => write!(f, "{value}"),
            PlcValue::Unsigned(value) => write!(f, "{value}"),
            PlcValue::Signed(value) => write!(f, "{value}"),
            PlcValue::Real(value) => write!(f, "{value}"),
            PlcValue::Char(value) => write!(f, "{value}"),
            PlcValue::String(value) => write!(f, "{value}"),
            PlcValue::List(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            PlcValue::Raw(raw) => write!(f, "{raw}"),
        }
    }
}

/// Undecoded bytes, addressable per byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawPlcValue {
    data: Vec<u8>,
}

impl RawPlcValue {
    /// Wraps owned bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Reads `count` bytes from `rb` under the given field name.
    pub fn read(rb: &mut dyn ReadBuffer, logical_name: &str, count: usize) -> Result<Self> {
        rb.read_byte_array(logical_name, count).map(Self::new)
    }

    /// The bytes.
    pub fn get_raw(&self) -> &[u8] {
        &self.data
    }

    /// Every byte as an unsigned value.
    pub fn get_list(&self) -> Vec<PlcValue> {
        self.data
            .iter()
            .map(|byte| PlcValue::Unsigned(u64::from(*byte)))
            .collect()
    }

    /// The byte at `index`.
    pub fn get_index(&self, index: usize) -> Option<PlcValue> {
        self.data
            .get(index)
            .map(|byte| PlcValue::Unsigned(u64::from(*byte)))
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes the bytes as `count` elements of `data_type`, big-endian.
    pub fn decode(&self, data_type: &str, count: usize) -> Result<PlcValue> {
        let mut rb = ReadBufferByteBased::new(&self.data);
        parse_plc_value(&mut rb, data_type, count)
    }

    /// Consumes the value, returning the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for RawPlcValue {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl fmt::Display for RawPlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.data))
    }
}

fn parse_element(rb: &mut dyn ReadBuffer, data_type: &str) -> Result<PlcValue> {
    let value = match data_type {
        "BOOL" => PlcValue::Bool(rb.read_bit("value")?),
        "BYTE" | "USINT" => PlcValue::Unsigned(rb.read_uint("value", 8)?),
        "WORD" | "UINT" => PlcValue::Unsigned(rb.read_uint("value", 16)?),
        "DWORD" | "UDINT" => PlcValue::Unsigned(rb.read_uint("value", 32)?),
        "LWORD" | "ULINT" => PlcValue::Unsigned(rb.read_uint("value", 64)?),
        "SINT" => PlcValue::Signed(rb.read_int("value", 8)?),
        "INT" => PlcValue::Signed(rb.read_int("value", 16)?),
        "DINT" => PlcValue::Signed(rb.read_int("value", 32)?),
        "LINT" => PlcValue::Signed(rb.read_int("value", 64)?),
        "REAL" => PlcValue::Real(f64::from(rb.read_f32("value")?)),
        "LREAL" => PlcValue::Real(rb.read_f64("value")?),
        "CHAR" => PlcValue::Char(char::from(rb.read_u8("value", 8)?)),
        other => {
            return Err(CodecError::unsupported("PlcValue", format!("dataType={other}")));
        }
    };
    Ok(value)
}

/// Reads `count` elements of the IEC type `data_type` from `rb`.
///
/// One element yields a scalar, several yield [`PlcValue::List`]. For
/// `STRING` the count is the number of characters and trailing NULs are
/// trimmed. Unknown type names read `count` bytes into a [`RawPlcValue`].
pub fn parse_plc_value(rb: &mut dyn ReadBuffer, data_type: &str, count: usize) -> Result<PlcValue> {
    match data_type {
        "STRING" => rb
            .read_string("value", byte_count_bits(count)?, StringEncoding::Utf8)
            .map(PlcValue::String),
        "BOOL" | "BYTE" | "WORD" | "DWORD" | "LWORD" | "SINT" | "INT" | "DINT" | "LINT"
        | "USINT" | "UINT" | "UDINT" | "ULINT" | "REAL" | "LREAL" | "CHAR" => {
            if count == 1 {
                return parse_element(rb, data_type);
            }
            (0..count)
                .map(|_| parse_element(rb, data_type))
                .collect::<Result<Vec<_>>>()
                .map(PlcValue::List)
        }
        _ => RawPlcValue::read(rb, "value", count).map(PlcValue::Raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_types() {
        let raw = RawPlcValue::new(vec![0xFF, 0xFE]);
        assert_eq!(raw.decode("WORD", 1).unwrap(), PlcValue::Unsigned(0xFFFE));
        assert_eq!(raw.decode("INT", 1).unwrap(), PlcValue::Signed(-2));
        assert_eq!(raw.decode("SINT", 2).unwrap().as_list().len(), 2);
        assert_eq!(raw.decode("BOOL", 1).unwrap(), PlcValue::Bool(true));
    }

    #[test]
    fn test_real() {
        let raw = RawPlcValue::new(1.5f32.to_be_bytes().to_vec());
        assert_eq!(raw.decode("REAL", 1).unwrap().as_f64(), Some(1.5));
    }

    #[test]
    fn test_string_trims_padding() {
        let raw = RawPlcValue::new(b"PLC\0\0".to_vec());
        assert_eq!(raw.decode("STRING", 5).unwrap().as_str(), Some("PLC"));
    }

    #[test]
    fn test_unknown_type_stays_raw() {
        let raw = RawPlcValue::new(vec![0x01, 0x02, 0x03]);
        let value = raw.decode("DATE_AND_TIME", 2).unwrap();
        assert_eq!(value, PlcValue::Raw(RawPlcValue::new(vec![0x01, 0x02])));
        assert_eq!(value.to_string(), "0x0102");
    }

    #[test]
    fn test_short_data() {
        let raw = RawPlcValue::new(vec![0x01]);
        assert!(matches!(
            raw.decode("DINT", 1).unwrap_err().root_cause(),
            CodecError::EndOfData { .. }
        ));
    }

    #[test]
    fn test_huge_count_does_not_panic() {
        let raw = RawPlcValue::new(vec![0x41]);
        assert!(raw.decode("STRING", usize::MAX / 4).is_err());
        assert!(raw.decode("UNKNOWN", usize::MAX / 4).is_err());
    }

    #[test]
    fn test_byte_access() {
        let raw = RawPlcValue::from(vec![0x10, 0x20]);
        assert_eq!(raw.get_raw(), [0x10, 0x20]);
        assert_eq!(raw.get_list(), vec![PlcValue::Unsigned(0x10), PlcValue::Unsigned(0x20)]);
        assert_eq!(raw.get_index(2), None);
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_list_display() {
        let value = PlcValue::List(vec![PlcValue::Bool(true), PlcValue::Signed(-1)]);
        assert_eq!(value.to_string(), "[true, -1]");
    }
}
