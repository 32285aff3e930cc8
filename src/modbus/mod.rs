//! Modbus: the function code PDU and its TCP, RTU and ASCII framings.
//!
//! ```
//! use plc4x_codec::modbus::{ModbusPdu, ModbusTcpAdu};
//! use plc4x_codec::{Message, Parse};
//!
//! let request = ModbusTcpAdu {
//!     transaction_identifier: 7,
//!     unit_identifier: 1,
//!     pdu: ModbusPdu::ReadCoilsRequest { starting_address: 0, quantity: 8 },
//! };
//! let bytes = request.to_bytes().unwrap();
//! assert_eq!(bytes, [0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x08]);
//! assert_eq!(ModbusTcpAdu::from_bytes(&bytes, false).unwrap(), request);
//! ```

pub mod adu;
pub mod pdu;
pub mod types;

pub use adu::{ascii_lrc, rtu_crc, ModbusAsciiAdu, ModbusRtuAdu, ModbusTcpAdu};
pub use pdu::ModbusPdu;
pub use types::{
    ModbusDeviceInformationConformityLevel, ModbusDeviceInformationLevel,
    ModbusDeviceInformationMoreFollows, ModbusDeviceInformationObject, ModbusErrorCode,
    ReadFileRecordRequestItem, ReadFileRecordResponseItem, WriteFileRecordItem,
    WriteFileRecordRequestItem, WriteFileRecordResponseItem,
};
