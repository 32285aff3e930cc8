//! Field conventions shared by all protocol codecs.
//!
//! | Kind | Parse | Serialize |
//! |------|-------|-----------|
//! | simple | read, wrap errors with the field name | write |
//! | enum | read, map to a closed set | write value and name |
//! | implicit | read and discard (or use as a bound) | recompute from content |
//! | reserved | read, warn on mismatch | write the canonical value |
//! | const | read, fail on mismatch | write the constant |
//! | checksum | read, fail if it differs from the computed value | write the computed value |
//! | optional | read only when the guard holds | write only when present |
//! | count array | read a known number of items | write all items |
//! | length array | read items until a byte budget is spent | write all items |

use std::net::Ipv4Addr;

use tracing::warn;

use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::message::{Message, Parse};
use crate::utils::byte_count_bits;

/// A closed enumeration with a fixed wire width.
pub trait WireEnum: Copy + Sized + 'static {
    /// Type name, used as the XML leaf name.
    const TYPE_NAME: &'static str;
    /// Width on the wire.
    const BIT_LENGTH: u8;

    /// Wire value.
    fn value(self) -> u64;

    /// Maps a wire value back, `None` when outside the set.
    fn from_value(value: u64) -> Option<Self>;

    /// Symbolic name.
    fn name(self) -> &'static str;
}

/// Implements [`WireEnum`] for a fieldless `#[repr]` enum that derives
/// `strum::FromRepr` and `strum::IntoStaticStr`. The wire type name defaults
/// to the Rust name.
macro_rules! wire_enum {
    ($ty:ident, $repr:ty, $bits:expr) => {
        $crate::field::wire_enum!($ty, $repr, $bits, stringify!($ty));
    };
    ($ty:ident, $repr:ty, $bits:expr, $type_name:expr) => {
        impl $crate::field::WireEnum for $ty {
            const TYPE_NAME: &'static str = $type_name;
            const BIT_LENGTH: u8 = $bits;

            fn value(self) -> u64 {
                self as $repr as u64
            }

            fn from_value(value: u64) -> Option<Self> {
                <$repr>::try_from(value).ok().and_then(Self::from_repr)
            }

            fn name(self) -> &'static str {
                self.into()
            }
        }
    };
}
pub(crate) use wire_enum;

/// Reads an enum field: a context named after the field around a leaf named after the type.
pub fn read_enum<E: WireEnum>(rb: &mut dyn ReadBuffer, logical_name: &str) -> Result<E> {
    rb.pull_context(logical_name, ContextKind::Element)
        .parsing(logical_name)?;
    let raw = rb
        .read_uint(E::TYPE_NAME, E::BIT_LENGTH)
        .parsing(logical_name)?;
    let value = E::from_value(raw)
        .ok_or(CodecError::UnknownEnumValue {
            type_name: E::TYPE_NAME,
            value: raw,
        })
        .parsing(logical_name)?;
    rb.close_context(logical_name, ContextKind::Element)
        .parsing(logical_name)?;
    Ok(value)
}

/// Writes an enum field.
pub fn write_enum<E: WireEnum>(wb: &mut dyn WriteBuffer, logical_name: &str, value: E) -> Result<()> {
    wb.push_context(logical_name, ContextKind::Element)
        .serializing(logical_name)?;
    wb.write_uint_annotated(E::TYPE_NAME, E::BIT_LENGTH, value.value(), value.name())
        .serializing(logical_name)?;
    wb.pop_context(logical_name, ContextKind::Element)
        .serializing(logical_name)
}

/// Reads a nested message field.
pub fn read_simple<T: Parse>(rb: &mut dyn ReadBuffer, logical_name: &str, args: T::Args) -> Result<T> {
    rb.pull_context(logical_name, ContextKind::Element)
        .parsing(logical_name)?;
    let value = T::parse(rb, args).parsing(logical_name)?;
    rb.close_context(logical_name, ContextKind::Element)
        .parsing(logical_name)?;
    Ok(value)
}

/// Writes a nested message field.
pub fn write_simple<T: Message + ?Sized>(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    value: &T,
) -> Result<()> {
    wb.push_context(logical_name, ContextKind::Element)
        .serializing(logical_name)?;
    value.serialize(wb).serializing(logical_name)?;
    wb.pop_context(logical_name, ContextKind::Element)
        .serializing(logical_name)
}

/// Enters the context of a discriminated variant, reads its own fields and leaves it.
pub fn read_variant<T>(
    rb: &mut dyn ReadBuffer,
    variant_name: &str,
    read_fields: impl FnOnce(&mut dyn ReadBuffer) -> Result<T>,
) -> Result<T> {
    rb.pull_context(variant_name, ContextKind::Element)?;
    let value = read_fields(rb)?;
    rb.close_context(variant_name, ContextKind::Element)?;
    Ok(value)
}

/// Writes the own fields of a discriminated variant inside its context.
pub fn write_variant(
    wb: &mut dyn WriteBuffer,
    variant_name: &str,
    write_fields: impl FnOnce(&mut dyn WriteBuffer) -> Result<()>,
) -> Result<()> {
    wb.push_context(variant_name, ContextKind::Element)?;
    write_fields(wb)?;
    wb.pop_context(variant_name, ContextKind::Element)
}

/// Reads a byte array of a schema-fixed size.
pub fn read_fixed_bytes<const N: usize>(rb: &mut dyn ReadBuffer, logical_name: &str) -> Result<[u8; N]> {
    let bytes = rb.read_byte_array(logical_name, N)?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            CodecError::cast(format!("expected {N} bytes, got {}", bytes.len()))
        })
        .parsing(logical_name)
}

/// Reads an IPv4 address stored as four bytes.
pub fn read_ipv4(rb: &mut dyn ReadBuffer, logical_name: &str) -> Result<Ipv4Addr> {
    read_fixed_bytes::<4>(rb, logical_name).map(Ipv4Addr::from)
}

/// Writes an IPv4 address as four bytes.
pub fn write_ipv4(wb: &mut dyn WriteBuffer, logical_name: &str, address: Ipv4Addr) -> Result<()> {
    wb.write_byte_array(logical_name, &address.octets())
}

/// Reads a nested message only when `present` holds.
pub fn read_optional<T: Parse>(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    present: bool,
    args: T::Args,
) -> Result<Option<T>> {
    if !present {
        return Ok(None);
    }
    read_simple(rb, logical_name, args).map(Some)
}

/// Writes a nested message guarded by `present`.
///
/// Nothing is written while the guard is false. A true guard with no value
/// cannot be parsed back and is rejected.
pub fn write_optional<T: Message>(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    present: bool,
    value: Option<&T>,
) -> Result<()> {
    match (present, value) {
        (false, _) => Ok(()),
        (true, Some(value)) => write_simple(wb, logical_name, value),
        (true, None) => Err(CodecError::invalid_value("value required by its guard is missing"))
            .serializing(logical_name),
    }
}

/// Bit length of a guarded nested message.
pub fn optional_length_in_bits<T: Message>(present: bool, value: Option<&T>) -> usize {
    match (present, value) {
        (true, Some(value)) => value.length_in_bits(),
        _ => 0,
    }
}

/// Reads a reserved field. A value other than `expected` is logged and dropped.
pub fn read_reserved(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    bit_length: u8,
    expected: u64,
) -> Result<()> {
    let actual = rb.read_uint(logical_name, bit_length)?;
    if actual != expected {
        warn!(
            field = logical_name,
            expected, actual, "reserved field carries an unexpected value"
        );
    }
    Ok(())
}

/// Writes a reserved field with its canonical value.
pub fn write_reserved(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    bit_length: u8,
    value: u64,
) -> Result<()> {
    wb.write_uint(logical_name, bit_length, value)
}

/// Reads a const field. A value other than `expected` fails the parse.
pub fn read_const(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    bit_length: u8,
    expected: u64,
) -> Result<()> {
    let actual = rb.read_uint(logical_name, bit_length)?;
    if actual != expected {
        return Err(CodecError::ConstantMismatch { expected, actual }).parsing(logical_name);
    }
    Ok(())
}

/// Writes a const field.
pub fn write_const(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    bit_length: u8,
    value: u64,
) -> Result<()> {
    wb.write_uint(logical_name, bit_length, value)
}

/// Reads a checksum field and compares it with the value computed over the
/// content it protects.
pub fn read_checksum(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    bit_length: u8,
    expected: u64,
) -> Result<u64> {
    let actual = rb.read_uint(logical_name, bit_length)?;
    if actual != expected {
        return Err(CodecError::ChecksumMismatch { expected, actual }).parsing(logical_name);
    }
    Ok(actual)
}

/// Writes a checksum field.
pub fn write_checksum(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    bit_length: u8,
    value: u64,
) -> Result<()> {
    wb.write_uint(logical_name, bit_length, value)
}

/// Reads exactly `count` items inside a list context.
pub fn read_count_array<T>(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    count: usize,
    mut read_item: impl FnMut(&mut dyn ReadBuffer) -> Result<T>,
) -> Result<Vec<T>> {
    rb.pull_context(logical_name, ContextKind::List)
        .parsing(logical_name)?;
    let mut items = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        items.push(read_item(rb).parsing(logical_name)?);
    }
    rb.close_context(logical_name, ContextKind::List)
        .parsing(logical_name)?;
    Ok(items)
}

/// Reads items until `length` bytes have been consumed.
///
/// An item that ends past the boundary fails with `LengthOverrun`.
pub fn read_length_array<T>(
    rb: &mut dyn ReadBuffer,
    logical_name: &str,
    length: usize,
    mut read_item: impl FnMut(&mut dyn ReadBuffer) -> Result<T>,
) -> Result<Vec<T>> {
    rb.pull_context(logical_name, ContextKind::List)
        .parsing(logical_name)?;
    let end = byte_count_bits(length)
        .and_then(|bits| {
            rb.bit_pos()
                .checked_add(bits)
                .ok_or_else(|| CodecError::invalid_value("array boundary overflows"))
        })
        .parsing(logical_name)?;
    let mut items = Vec::new();
    while rb.bit_pos() < end {
        let before = rb.bit_pos();
        items.push(read_item(rb).parsing(logical_name)?);
        if rb.bit_pos() == before {
            return Err(CodecError::invalid_value("array item consumed no data"))
                .parsing(logical_name);
        }
    }
    if rb.bit_pos() > end {
        return Err(CodecError::LengthOverrun {
            boundary: end / 8,
            position: rb.bit_pos().div_ceil(8),
        })
        .parsing(logical_name);
    }
    rb.close_context(logical_name, ContextKind::List)
        .parsing(logical_name)?;
    Ok(items)
}

/// Writes all items inside a list context.
pub fn write_array<T>(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    items: &[T],
    mut write_item: impl FnMut(&mut dyn WriteBuffer, &T) -> Result<()>,
) -> Result<()> {
    wb.push_context(logical_name, ContextKind::List)
        .serializing(logical_name)?;
    for item in items {
        write_item(wb, item).serializing(logical_name)?;
    }
    wb.pop_context(logical_name, ContextKind::List)
        .serializing(logical_name)
}

/// Total bit length of a list of messages.
pub fn array_length_in_bits<T: Message>(items: &[T]) -> usize {
    items.iter().map(Message::length_in_bits).sum()
}

/// Reads and drops `count` padding bytes.
pub fn read_padding(rb: &mut dyn ReadBuffer, logical_name: &str, count: usize) -> Result<()> {
    read_count_array(rb, logical_name, count, |rb| rb.read_u8("value", 8))?;
    Ok(())
}

/// Writes `count` padding bytes of `value`.
pub fn write_padding(
    wb: &mut dyn WriteBuffer,
    logical_name: &str,
    count: usize,
    value: u8,
) -> Result<()> {
    wb.push_context(logical_name, ContextKind::List)
        .serializing(logical_name)?;
    for _ in 0..count {
        wb.write_u8("value", 8, value).serializing(logical_name)?;
    }
    wb.pop_context(logical_name, ContextKind::List)
        .serializing(logical_name)
}

/// Converts a computed length into the width of an implicit field.
pub fn implicit_length<T: TryFrom<usize>>(logical_name: &str, value: usize) -> Result<T> {
    T::try_from(value)
        .map_err(|_| {
            CodecError::encoding(format!("implicit length {value} does not fit its field"))
        })
        .serializing(logical_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ReadBufferByteBased, WriteBufferByteBased};
    use tracing_test::traced_test;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr, strum::IntoStaticStr)]
    #[repr(u8)]
    #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
    enum Level {
        Low = 0x01,
        High = 0x02,
    }
    wire_enum!(Level, u8, 4);

    #[test]
    fn test_wire_enum_macro() {
        assert_eq!(Level::TYPE_NAME, "Level");
        assert_eq!(Level::High.value(), 2);
        assert_eq!(Level::from_value(1), Some(Level::Low));
        assert_eq!(Level::from_value(3), None);
        assert_eq!(Level::from_value(0x101), None);
        assert_eq!(Level::High.name(), "HIGH");
    }

    #[test]
    fn test_unknown_enum_value() {
        let mut rb = ReadBufferByteBased::new(&[0x30]);
        let err = read_enum::<Level>(&mut rb, "level").unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::UnknownEnumValue { value: 3, .. }
        ));
        assert_eq!(err.field_path().as_deref(), Some("'level'"));
    }

    #[test]
    #[traced_test]
    fn test_reserved_mismatch_only_warns() {
        let mut rb = ReadBufferByteBased::new(&[0x05]);
        read_reserved(&mut rb, "reserved", 8, 0x00).unwrap();
        assert_eq!(rb.pos(), 1);
        assert!(logs_contain("reserved field carries an unexpected value"));
    }

    #[test]
    fn test_const_mismatch_fails() {
        let mut rb = ReadBufferByteBased::new(&[0x11]);
        let err = read_const(&mut rb, "protocolVersion", 8, 0x10).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::ConstantMismatch {
                expected: 0x10,
                actual: 0x11
            }
        ));
    }

    #[test]
    fn test_length_array_stops_at_boundary() {
        let mut rb = ReadBufferByteBased::new(&[0x00, 0x01, 0x00, 0x02, 0xFF]);
        let items = read_length_array(&mut rb, "values", 4, |rb| rb.read_u16("value", 16)).unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(rb.pos(), 4);
    }

    #[test]
    fn test_length_array_overrun() {
        let mut rb = ReadBufferByteBased::new(&[0x00, 0x01, 0x00, 0x02]);
        let err = read_length_array(&mut rb, "values", 3, |rb| rb.read_u16("value", 16)).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::LengthOverrun {
                boundary: 3,
                position: 4
            }
        ));
    }

    #[test]
    fn test_length_array_huge_length() {
        let mut rb = ReadBufferByteBased::new(&[0x00]);
        let err = read_length_array(&mut rb, "values", usize::MAX / 4, |rb| rb.read_u8("value", 8))
            .unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'values'"));
        assert!(matches!(err.root_cause(), CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_length_array() {
        let mut rb = ReadBufferByteBased::new(&[]);
        let items = read_length_array(&mut rb, "values", 0, |rb| rb.read_u8("value", 8)).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_padding() {
        let mut wb = WriteBufferByteBased::new();
        write_padding(&mut wb, "padding", 1, 0x00).unwrap();
        assert_eq!(wb.bytes(), &[0x00]);
        let mut rb = ReadBufferByteBased::new(&[0x00]);
        read_padding(&mut rb, "padding", 1).unwrap();
        assert_eq!(rb.pos(), 1);
    }

    #[test]
    fn test_implicit_length_overflow() {
        assert_eq!(implicit_length::<u8>("byteCount", 255).unwrap(), 255);
        let err = implicit_length::<u8>("byteCount", 256).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::EncodingFailure { .. }));
    }
}
