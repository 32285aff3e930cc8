//! The parse/serialize contract every protocol unit implements.
//!
//! A type implements [`Message`] to describe and write itself and [`Parse`] to
//! read itself back. Both are written once against the buffer traits and run
//! unchanged on the byte and the XML backends.
//!
//! # Example
//!
//! ```
//! use plc4x_codec::knxnetip::KnxAddress;
//! use plc4x_codec::{Message, Parse};
//!
//! let address = KnxAddress::new(1, 2, 3);
//! let bytes = address.to_bytes().unwrap();
//! assert_eq!(bytes, vec![0x12, 0x03]);
//! assert_eq!(address.length_in_bits(), 16);
//!
//! let parsed = KnxAddress::from_bytes(&bytes, ()).unwrap();
//! assert_eq!(parsed, address);
//!
//! let xml = address.to_xml().unwrap();
//! assert_eq!(KnxAddress::from_xml(&xml, ()).unwrap(), address);
//! ```

use crate::buffer::{
    ReadBuffer, ReadBufferByteBased, WriteBuffer, WriteBufferByteBased, XmlReadBuffer,
    XmlWriteBuffer,
};
use crate::config::{CodecConfig, XmlOptions};
use crate::error::Result;

/// A value that knows its wire size and can write itself.
pub trait Message {
    /// Logical type name, used as the XML context name.
    fn type_name(&self) -> &'static str;

    /// Exact number of bits `serialize` writes.
    fn length_in_bits(&self) -> usize;

    /// Number of bytes `serialize` writes, rounded up.
    fn length_in_bytes(&self) -> usize {
        self.length_in_bits().div_ceil(8)
    }

    /// Writes the value, deriving implicit fields from the current content.
    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()>;

    /// Serializes to big-endian wire bytes.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&CodecConfig::default())
    }

    /// Serializes to wire bytes with explicit options.
    fn to_bytes_with(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        let mut wb = WriteBufferByteBased::with_config(config);
        self.serialize(&mut wb)?;
        Ok(wb.into_bytes())
    }

    /// Serializes to the XML rendering.
    fn to_xml(&self) -> Result<String> {
        self.to_xml_with(XmlOptions::default())
    }

    /// Serializes to the XML rendering with explicit options.
    fn to_xml_with(&self, options: XmlOptions) -> Result<String> {
        let mut wb = XmlWriteBuffer::with_options(options);
        self.serialize(&mut wb)?;
        wb.into_xml()
    }
}

/// A value that can be read back from a buffer.
///
/// `Args` carries what the enclosing message knows and the wire does not
/// repeat, such as a direction flag or the byte budget of a nested unit.
pub trait Parse: Sized {
    /// Contextual arguments supplied by the caller.
    type Args: Copy;

    /// Reads one value starting at the buffer's current position.
    fn parse(rb: &mut dyn ReadBuffer, args: Self::Args) -> Result<Self>;

    /// Parses big-endian wire bytes.
    fn from_bytes(bytes: &[u8], args: Self::Args) -> Result<Self> {
        Self::from_bytes_with(bytes, args, &CodecConfig::default())
    }

    /// Parses wire bytes with explicit options.
    fn from_bytes_with(bytes: &[u8], args: Self::Args, config: &CodecConfig) -> Result<Self> {
        let mut rb = ReadBufferByteBased::with_config(bytes, config);
        Self::parse(&mut rb, args)
    }

    /// Parses the XML rendering.
    fn from_xml(xml: &str, args: Self::Args) -> Result<Self> {
        Self::from_xml_with(xml, args, XmlOptions::default())
    }

    /// Parses the XML rendering with explicit options.
    fn from_xml_with(xml: &str, args: Self::Args, options: XmlOptions) -> Result<Self> {
        let mut rb = XmlReadBuffer::with_options(xml, options);
        Self::parse(&mut rb, args)
    }
}
