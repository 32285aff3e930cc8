//! Closed value sets used by COTP and S7.

use strum::{FromRepr, IntoStaticStr};

use crate::field::wire_enum;

/// Maximum TPDU size negotiated in a COTP connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CotpTpduSize {
    #[strum(serialize = "SIZE_128")]
    Size128 = 0x07,
    #[strum(serialize = "SIZE_256")]
    Size256 = 0x08,
    #[strum(serialize = "SIZE_512")]
    Size512 = 0x09,
    #[strum(serialize = "SIZE_1024")]
    Size1024 = 0x0A,
    #[strum(serialize = "SIZE_2048")]
    Size2048 = 0x0B,
    #[strum(serialize = "SIZE_4096")]
    Size4096 = 0x0C,
    #[strum(serialize = "SIZE_8192")]
    Size8192 = 0x0D,
}
wire_enum!(CotpTpduSize, u8, 8, "COTPTpduSize");

impl CotpTpduSize {
    /// Size in bytes.
    pub fn size_in_bytes(self) -> usize {
        1 << (self as u8)
    }
}

/// Transport class requested on connection setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CotpProtocolClass {
    #[strum(serialize = "CLASS_0")]
    Class0 = 0x00,
    #[strum(serialize = "CLASS_1")]
    Class1 = 0x10,
    #[strum(serialize = "CLASS_2")]
    Class2 = 0x20,
    #[strum(serialize = "CLASS_3")]
    Class3 = 0x30,
    #[strum(serialize = "CLASS_4")]
    Class4 = 0x40,
}
wire_enum!(CotpProtocolClass, u8, 8, "COTPProtocolClass");

/// Element type of an any-pointer address.
///
/// Several IEC types share a wire code; the variants carry the distinct codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportSize {
    /// LWORD, LINT, ULINT, WSTRING, LTIME.
    Lword = 0x00,
    /// Single bit.
    Bool = 0x01,
    /// BYTE, SINT, USINT.
    Byte = 0x02,
    /// CHAR, STRING.
    Char = 0x03,
    /// 16-bit word.
    Word = 0x04,
    /// INT, UINT.
    Int = 0x05,
    /// DWORD, TIME_OF_DAY.
    Dword = 0x06,
    /// DINT, UDINT.
    Dint = 0x07,
    /// 32-bit float.
    Real = 0x08,
    /// IEC date.
    Date = 0x09,
    /// IEC time.
    Time = 0x0B,
    /// Date and time of day.
    DateAndTime = 0x0F,
    /// 16-bit character.
    Wchar = 0x13,
    /// 64-bit float.
    Lreal = 0x30,
}
wire_enum!(TransportSize, u8, 8);

impl TransportSize {
    /// Size of one element in bytes, `None` for bit access.
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            TransportSize::Bool => None,
            TransportSize::Byte | TransportSize::Char => Some(1),
            TransportSize::Word
            | TransportSize::Int
            | TransportSize::Date
            | TransportSize::Wchar => Some(2),
            TransportSize::Dword
            | TransportSize::Dint
            | TransportSize::Real
            | TransportSize::Time => Some(4),
            TransportSize::Lword | TransportSize::DateAndTime | TransportSize::Lreal => Some(8),
        }
    }
}

/// Addressed memory area of a PLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryArea {
    /// Counters (C).
    Counters = 0x1C,
    /// Timers (T).
    Timers = 0x1D,
    /// Direct peripheral access (P).
    DirectPeripheralAccess = 0x80,
    /// Process image of the inputs (I).
    Inputs = 0x81,
    /// Process image of the outputs (Q).
    Outputs = 0x82,
    /// Flags (M).
    FlagsMarkers = 0x83,
    /// Data blocks (DB).
    DataBlocks = 0x84,
    /// Instance data blocks (DI).
    InstanceDataBlocks = 0x85,
    /// Local data (L).
    LocalData = 0x86,
}
wire_enum!(MemoryArea, u8, 8);

impl MemoryArea {
    /// Short mnemonic used in address strings.
    pub fn short_name(self) -> &'static str {
        match self {
            MemoryArea::Counters => "C",
            MemoryArea::Timers => "T",
            MemoryArea::DirectPeripheralAccess => "P",
            MemoryArea::Inputs => "I",
            MemoryArea::Outputs => "Q",
            MemoryArea::FlagsMarkers => "M",
            MemoryArea::DataBlocks => "DB",
            MemoryArea::InstanceDataBlocks => "DBI",
            MemoryArea::LocalData => "LD",
        }
    }
}

/// Unit of the data length of a payload item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataTransportSize {
    /// No data.
    Null = 0x00,
    /// Bit access, one byte per bit.
    Bit = 0x03,
    /// Byte, word or double word.
    ByteWordDword = 0x04,
    /// Integer.
    Integer = 0x05,
    /// Double integer.
    Dinteger = 0x06,
    /// Floating point.
    Real = 0x07,
    /// Octet string.
    OctetString = 0x09,
}
wire_enum!(DataTransportSize, u8, 8);

impl DataTransportSize {
    /// Whether the data length of an item is counted in bits.
    pub fn size_in_bits(self) -> bool {
        matches!(
            self,
            DataTransportSize::Bit | DataTransportSize::ByteWordDword | DataTransportSize::Integer
        )
    }
}

/// Per-item return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataTransportErrorCode {
    /// Placeholder used in requests.
    Reserved = 0x00,
    /// Success.
    Ok = 0xFF,
    /// The item may not be accessed.
    AccessDenied = 0x03,
    /// The address is out of range.
    InvalidAddress = 0x05,
    /// The requested type is not supported.
    DataTypeNotSupported = 0x06,
    /// The object does not exist.
    NotFound = 0x0A,
}
wire_enum!(DataTransportErrorCode, u8, 8);
