//! # PLC4X Codec
//!
//! Bit-level wire codecs for industrial protocols: Modbus, KNXnet/IP, S7 over
//! ISO-on-TCP and BACnet/IP.
//!
//! This is a **codec-only** library. It turns bytes into typed messages and
//! typed messages back into bytes. What a message means, when to send it and
//! what to do with the answer is left to the caller.
//!
//! ## Features
//!
//! - **Bit-exact** — fields of any width from 1 to 64 bits, packed MSB first
//! - **Two backends** — the same parse/serialize code runs against bytes or a
//!   debug XML document
//! - **Closed message families** — every protocol is an exhaustive enum
//!   dispatched on its wire discriminator
//! - **Field paths in errors** — failures name the field that broke, e.g.
//!   `error parsing 'cemi'.'dataFrame'.'sourceAddress'`
//! - **No panics** — all errors returned as [`Result<T, CodecError>`]
//!
//! ## Quick Start
//!
//! ```
//! use plc4x_codec::modbus::{ModbusPdu, ModbusTcpAdu};
//! use plc4x_codec::{Message, Parse};
//!
//! let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x6B, 0x00, 0x03];
//! let adu = ModbusTcpAdu::from_bytes(&bytes, false)?;
//!
//! assert_eq!(adu.unit_identifier, 0x11);
//! assert_eq!(
//!     adu.pdu,
//!     ModbusPdu::ReadHoldingRegistersRequest { starting_address: 0x6B, quantity: 3 }
//! );
//! assert_eq!(adu.to_bytes()?, bytes);
//! # Ok::<(), plc4x_codec::CodecError>(())
//! ```
//!
//! ## Protocols
//!
//! | Module | Entry point | Carries |
//! |--------|-------------|---------|
//! | [`modbus`] | [`ModbusTcpAdu`](modbus::ModbusTcpAdu), [`ModbusRtuAdu`](modbus::ModbusRtuAdu), [`ModbusAsciiAdu`](modbus::ModbusAsciiAdu) | [`ModbusPdu`](modbus::ModbusPdu) |
//! | [`knxnetip`] | [`KnxNetIpMessage`](knxnetip::KnxNetIpMessage) | [`Cemi`](knxnetip::Cemi) |
//! | [`s7`] | [`TpktPacket`](s7::TpktPacket) | [`CotpPacket`](s7::CotpPacket), [`S7Message`](s7::S7Message) |
//! | [`bacnetip`] | [`Bvlc`](bacnetip::Bvlc) | [`Npdu`](bacnetip::Npdu) |
//!
//! ## XML Debug Backend
//!
//! Every message renders to an XML document that mirrors its field tree, and
//! parses back from it:
//!
//! ```
//! use plc4x_codec::knxnetip::KnxAddress;
//! use plc4x_codec::{Message, Parse};
//!
//! let address = KnxAddress { main_group: 1, middle_group: 2, sub_group: 3 };
//! let xml = address.to_xml()?;
//! assert!(xml.contains(r#"<mainGroup dataType="uint" bitLength="4">1</mainGroup>"#));
//! assert_eq!(KnxAddress::from_xml(&xml, ())?, address);
//! # Ok::<(), plc4x_codec::CodecError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use plc4x_codec::knxnetip::KnxNetIpMessage;
//! use plc4x_codec::{CodecError, Parse};
//!
//! // protocolVersion must be 0x10
//! let err = KnxNetIpMessage::from_bytes(&[0x06, 0x11, 0x02, 0x01, 0x00, 0x06], ()).unwrap_err();
//! match err.root_cause() {
//!     CodecError::ConstantMismatch { expected, actual } => {
//!         assert_eq!((*expected, *actual), (0x10, 0x11));
//!     }
//!     other => panic!("unexpected error: {other}"),
//! }
//! assert_eq!(err.field_path().as_deref(), Some("'protocolVersion'"));
//! ```
//!
//! ## Configuration
//!
//! ```
//! use plc4x_codec::modbus::ModbusPdu;
//! use plc4x_codec::{ByteOrder, CodecConfig, Message};
//!
//! let config = CodecConfig::new().with_byte_order(ByteOrder::LittleEndian);
//! let pdu = ModbusPdu::ReadCoilsRequest { starting_address: 0x0102, quantity: 1 };
//! assert_eq!(pdu.to_bytes_with(&config)?, [0x01, 0x02, 0x01, 0x01, 0x00]);
//! # Ok::<(), plc4x_codec::CodecError>(())
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Parsing and serializing are synchronous and work on bytes already in memory
//! 2. No global state: options travel in a [`CodecConfig`]
//! 3. Reserved fields are lenient and log a warning, constants are strict
//! 4. Unknown discriminators fail with [`CodecError::UnsupportedVariant`]

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bacnetip;
pub mod buffer;
pub mod config;
pub mod error;
pub mod field;
pub mod knxnetip;
pub mod message;
pub mod modbus;
pub mod s7;
pub mod transport;
pub mod utils;
pub mod value;

// Public re-exports
pub use buffer::{
    ContextKind, ReadBuffer, ReadBufferByteBased, StringEncoding, WriteBuffer,
    WriteBufferByteBased, XmlReadBuffer, XmlWriteBuffer,
};
pub use config::{ByteOrder, CodecConfig, DebugOptions, XmlOptions};
pub use error::{CodecError, Direction, Result, ResultExt};
pub use field::WireEnum;
pub use message::{Message, Parse};
pub use transport::{Transport, UdpTransport, DEFAULT_MAX_DATAGRAM_SIZE, DEFAULT_TIMEOUT};
pub use value::{parse_plc_value, PlcValue, RawPlcValue};
