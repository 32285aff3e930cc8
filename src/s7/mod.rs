//! Siemens S7 over ISO-on-TCP: TPKT, COTP and the S7 messages they carry.
//!
//! ```
//! use plc4x_codec::s7::{
//!     CotpPacket, CotpParameter, CotpTpduSize, S7Message, S7Parameter, TpktPacket,
//! };
//! use plc4x_codec::{Message, Parse};
//!
//! let setup = TpktPacket {
//!     payload: CotpPacket::data(
//!         0,
//!         vec![CotpParameter::TpduSize { tpdu_size: CotpTpduSize::Size1024 }],
//!         S7Message::request(
//!             1,
//!             S7Parameter::SetupCommunication {
//!                 max_amq_caller: 8,
//!                 max_amq_callee: 8,
//!                 pdu_length: 960,
//!             },
//!             None,
//!         ),
//!     ),
//! };
//! let bytes = setup.to_bytes().unwrap();
//! assert_eq!(&bytes[..4], [0x03, 0x00, 0x00, 0x1C]);
//! assert_eq!(TpktPacket::from_bytes(&bytes, ()).unwrap(), setup);
//! ```

pub mod message;
pub mod tpkt;
pub mod types;

pub use message::{
    S7Address, S7Message, S7MessageType, S7Parameter, S7Payload, S7PayloadArgs,
    S7VarPayloadDataItem, S7VarPayloadStatusItem, S7VarRequestParameterItem, S7_PROTOCOL_ID,
};
pub use tpkt::{CotpPacket, CotpParameter, CotpTpdu, TpktPacket, TPKT_PROTOCOL_ID};
pub use types::{
    CotpProtocolClass, CotpTpduSize, DataTransportErrorCode, DataTransportSize, MemoryArea,
    TransportSize,
};
