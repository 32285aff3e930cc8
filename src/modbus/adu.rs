//! Application data units: a [`ModbusPdu`] framed for TCP, RTU or ASCII lines.

use crc::{Crc, CRC_16_MODBUS};

use super::pdu::ModbusPdu;
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::Result;
use crate::field::{
    implicit_length, read_checksum, read_const, read_simple, write_checksum, write_const,
    write_simple,
};
use crate::message::{Message, Parse};

/// Protocol identifier of Modbus in the MBAP header.
pub const MODBUS_PROTOCOL_IDENTIFIER: u16 = 0x0000;

const MODBUS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// CRC-16/MODBUS over the unit address and the serialized PDU.
pub fn rtu_crc(address: u8, pdu: &ModbusPdu) -> Result<u16> {
    let pdu = pdu.to_bytes()?;
    let mut digest = MODBUS_CRC.digest();
    digest.update(&[address]);
    digest.update(&pdu);
    Ok(digest.finalize())
}

/// Longitudinal redundancy check over the unit address and the serialized PDU.
pub fn ascii_lrc(address: u8, pdu: &ModbusPdu) -> Result<u8> {
    let pdu = pdu.to_bytes()?;
    let sum = pdu.iter().fold(address, |sum, byte| sum.wrapping_add(*byte));
    Ok(sum.wrapping_neg())
}

/// Modbus TCP frame with its MBAP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusTcpAdu {
    /// Pairs a response with its request.
    pub transaction_identifier: u16,
    /// Addressed unit behind a gateway.
    pub unit_identifier: u8,
    /// Payload.
    pub pdu: ModbusPdu,
}

impl Message for ModbusTcpAdu {
    fn type_name(&self) -> &'static str {
        "ModbusTcpADU"
    }

    fn length_in_bits(&self) -> usize {
        16 + 16 + 16 + 8 + self.pdu.length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ModbusTcpADU", ContextKind::Element)?;
        wb.write_u16("transactionIdentifier", 16, self.transaction_identifier)?;
        write_const(
            wb,
            "protocolIdentifier",
            16,
            u64::from(MODBUS_PROTOCOL_IDENTIFIER),
        )?;
        let length: u16 = implicit_length("length", self.pdu.length_in_bytes() + 1)?;
        wb.write_u16("length", 16, length)?;
        wb.write_u8("unitIdentifier", 8, self.unit_identifier)?;
        write_simple(wb, "pdu", &self.pdu)?;
        wb.pop_context("ModbusTcpADU", ContextKind::Element)
    }
}

impl Parse for ModbusTcpAdu {
    /// `true` when reading a response.
    type Args = bool;

    fn parse(rb: &mut dyn ReadBuffer, response: bool) -> Result<Self> {
        rb.pull_context("ModbusTcpADU", ContextKind::Element)?;
        let transaction_identifier = rb.read_u16("transactionIdentifier", 16)?;
        read_const(
            rb,
            "protocolIdentifier",
            16,
            u64::from(MODBUS_PROTOCOL_IDENTIFIER),
        )?;
        let _length = rb.read_u16("length", 16)?;
        let unit_identifier = rb.read_u8("unitIdentifier", 8)?;
        let pdu = read_simple(rb, "pdu", response)?;
        rb.close_context("ModbusTcpADU", ContextKind::Element)?;
        Ok(Self {
            transaction_identifier,
            unit_identifier,
            pdu,
        })
    }
}

/// Modbus RTU frame: address, PDU and a CRC sent low byte first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusRtuAdu {
    /// Slave address.
    pub address: u8,
    /// Payload.
    pub pdu: ModbusPdu,
}

impl Message for ModbusRtuAdu {
    fn type_name(&self) -> &'static str {
        "ModbusRtuADU"
    }

    fn length_in_bits(&self) -> usize {
        8 + self.pdu.length_in_bits() + 16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ModbusRtuADU", ContextKind::Element)?;
        wb.write_u8("address", 8, self.address)?;
        write_simple(wb, "pdu", &self.pdu)?;
        let crc = rtu_crc(self.address, &self.pdu)?;
        write_checksum(wb, "crc", 16, u64::from(crc.swap_bytes()))?;
        wb.pop_context("ModbusRtuADU", ContextKind::Element)
    }
}

impl Parse for ModbusRtuAdu {
    /// `true` when reading a response.
    type Args = bool;

    fn parse(rb: &mut dyn ReadBuffer, response: bool) -> Result<Self> {
        rb.pull_context("ModbusRtuADU", ContextKind::Element)?;
        let address = rb.read_u8("address", 8)?;
        let pdu = read_simple(rb, "pdu", response)?;
        let expected = rtu_crc(address, &pdu)?;
        read_checksum(rb, "crc", 16, u64::from(expected.swap_bytes()))?;
        rb.close_context("ModbusRtuADU", ContextKind::Element)?;
        Ok(Self { address, pdu })
    }
}

/// Modbus ASCII frame content: address, PDU and an LRC byte.
///
/// The hex character encoding and the `:`/CRLF delimiters of the serial
/// line are left to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusAsciiAdu {
    /// Slave address.
    pub address: u8,
    /// Payload.
    pub pdu: ModbusPdu,
}

impl Message for ModbusAsciiAdu {
    fn type_name(&self) -> &'static str {
        "ModbusAsciiADU"
    }

    fn length_in_bits(&self) -> usize {
        8 + self.pdu.length_in_bits() + 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ModbusAsciiADU", ContextKind::Element)?;
        wb.write_u8("address", 8, self.address)?;
        write_simple(wb, "pdu", &self.pdu)?;
        let lrc = ascii_lrc(self.address, &self.pdu)?;
        write_checksum(wb, "crc", 8, u64::from(lrc))?;
        wb.pop_context("ModbusAsciiADU", ContextKind::Element)
    }
}

impl Parse for ModbusAsciiAdu {
    /// `true` when reading a response.
    type Args = bool;

    fn parse(rb: &mut dyn ReadBuffer, response: bool) -> Result<Self> {
        rb.pull_context("ModbusAsciiADU", ContextKind::Element)?;
        let address = rb.read_u8("address", 8)?;
        let pdu = read_simple(rb, "pdu", response)?;
        let expected = ascii_lrc(address, &pdu)?;
        read_checksum(rb, "crc", 8, u64::from(expected))?;
        rb.close_context("ModbusAsciiADU", ContextKind::Element)?;
        Ok(Self { address, pdu })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use pretty_assertions::assert_eq;

    fn read_ten_registers() -> ModbusPdu {
        ModbusPdu::ReadHoldingRegistersRequest {
            starting_address: 0x0000,
            quantity: 0x000A,
        }
    }

    #[test]
    fn test_crc_known_vector() {
        assert_eq!(rtu_crc(0x01, &read_ten_registers()).unwrap(), 0xCDC5);
    }

    #[test]
    fn test_rtu_frame() {
        let adu = ModbusRtuAdu {
            address: 0x01,
            pdu: read_ten_registers(),
        };
        let bytes = adu.to_bytes().unwrap();
        assert_eq!(bytes, vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD]);
        assert_eq!(ModbusRtuAdu::from_bytes(&bytes, false).unwrap(), adu);
    }

    #[test]
    fn test_rtu_bad_crc() {
        let bytes = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00];
        let err = ModbusRtuAdu::from_bytes(&bytes, false).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'crc'"));
        assert!(matches!(
            err.root_cause(),
            CodecError::ChecksumMismatch {
                expected: 0xC5CD,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_ascii_lrc() {
        let adu = ModbusAsciiAdu {
            address: 0x01,
            pdu: read_ten_registers(),
        };
        let bytes = adu.to_bytes().unwrap();
        assert_eq!(bytes.last(), Some(&0xF2));
        assert_eq!(ModbusAsciiAdu::from_bytes(&bytes, false).unwrap(), adu);
    }

    #[test]
    fn test_tcp_frame() {
        let bytes = hex::decode("000100000006ff0300000001").unwrap();
        let adu = ModbusTcpAdu::from_bytes(&bytes, false).unwrap();
        assert_eq!(adu.transaction_identifier, 1);
        assert_eq!(adu.unit_identifier, 0xFF);
        assert_eq!(
            adu.pdu,
            ModbusPdu::ReadHoldingRegistersRequest {
                starting_address: 0,
                quantity: 1
            }
        );
        assert_eq!(adu.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_tcp_protocol_identifier_is_const() {
        let bytes = hex::decode("000100010006ff0300000001").unwrap();
        let err = ModbusTcpAdu::from_bytes(&bytes, false).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::ConstantMismatch { .. }));
    }

    #[test]
    fn test_nested_error_path() {
        let bytes = hex::decode("000100000006ff03000000").unwrap();
        let err = ModbusTcpAdu::from_bytes(&bytes, false).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'pdu'.'quantity'"));
        assert!(err.to_string().starts_with("error parsing 'pdu'.'quantity'"));
    }
}
