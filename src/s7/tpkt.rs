//! ISO-on-TCP framing: the TPKT header (RFC 1006) and the COTP TPDUs (ISO 8073)
//! that carry S7 messages.

use super::message::S7Message;
use super::types::{CotpProtocolClass, CotpTpduSize};
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    array_length_in_bits, implicit_length, read_const, read_enum, read_length_array,
    read_reserved, read_simple, read_variant, write_array, write_const, write_enum,
    write_reserved, write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// Version byte of the TPKT header.
pub const TPKT_PROTOCOL_ID: u8 = 0x03;

/// Size of the TPKT header in bytes.
pub const TPKT_HEADER_LENGTH: usize = 4;

/// A TPKT frame around one COTP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpktPacket {
    /// The framed TPDU.
    pub payload: CotpPacket,
}

impl Message for TpktPacket {
    fn type_name(&self) -> &'static str {
        "TPKTPacket"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 16 + self.payload.length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("TPKTPacket", ContextKind::Element)?;
        write_const(wb, "protocolId", 8, u64::from(TPKT_PROTOCOL_ID))?;
        write_reserved(wb, "reserved", 8, 0x00)?;
        let len: u16 = implicit_length("len", self.length_in_bytes())?;
        wb.write_u16("len", 16, len)?;
        write_simple(wb, "payload", &self.payload)?;
        wb.pop_context("TPKTPacket", ContextKind::Element)
    }
}

impl Parse for TpktPacket {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("TPKTPacket", ContextKind::Element)?;
        read_const(rb, "protocolId", 8, u64::from(TPKT_PROTOCOL_ID))?;
        read_reserved(rb, "reserved", 8, 0x00)?;
        let len = rb.read_u16("len", 16)?;
        let cotp_len = usize::from(len)
            .checked_sub(TPKT_HEADER_LENGTH)
            .ok_or_else(|| {
                CodecError::invalid_value(format!("length {len} is shorter than the header"))
            })
            .parsing("len")?;
        let payload = read_simple(rb, "payload", cotp_len)?;
        rb.close_context("TPKTPacket", ContextKind::Element)?;
        Ok(Self { payload })
    }
}

/// Fixed part of a COTP TPDU, switched on the TPDU code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CotpTpdu {
    /// `0xF0` data transfer.
    Data {
        /// Last data unit of a sequence.
        eot: bool,
        /// Sequence number, 7 bits.
        tpdu_ref: u8,
    },
    /// `0xE0` connection request.
    ConnectionRequest {
        /// Connection reference of the receiver.
        destination_reference: u16,
        /// Connection reference of the sender.
        source_reference: u16,
        /// Requested transport class.
        protocol_class: CotpProtocolClass,
    },
    /// `0xD0` connection confirm.
    ConnectionResponse {
        /// Connection reference of the receiver.
        destination_reference: u16,
        /// Connection reference of the sender.
        source_reference: u16,
        /// Granted transport class.
        protocol_class: CotpProtocolClass,
    },
    /// `0x80` disconnect request.
    DisconnectRequest {
        /// Connection reference of the receiver.
        destination_reference: u16,
        /// Connection reference of the sender.
        source_reference: u16,
        /// Transport class.
        protocol_class: CotpProtocolClass,
    },
    /// `0xC0` disconnect confirm.
    DisconnectResponse {
        /// Connection reference of the receiver.
        destination_reference: u16,
        /// Connection reference of the sender.
        source_reference: u16,
    },
    /// `0x70` protocol error.
    TpduError {
        /// Connection reference of the receiver.
        destination_reference: u16,
        /// Why the peer rejected the TPDU.
        reject_cause: u8,
    },
}

impl CotpTpdu {
    /// Wire discriminator.
    pub fn tpdu_code(&self) -> u8 {
        match self {
            CotpTpdu::Data { .. } => 0xF0,
            CotpTpdu::ConnectionRequest { .. } => 0xE0,
            CotpTpdu::ConnectionResponse { .. } => 0xD0,
            CotpTpdu::DisconnectRequest { .. } => 0x80,
            CotpTpdu::DisconnectResponse { .. } => 0xC0,
            CotpTpdu::TpduError { .. } => 0x70,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            CotpTpdu::Data { .. } => "COTPPacketData",
            CotpTpdu::ConnectionRequest { .. } => "COTPPacketConnectionRequest",
            CotpTpdu::ConnectionResponse { .. } => "COTPPacketConnectionResponse",
            CotpTpdu::DisconnectRequest { .. } => "COTPPacketDisconnectRequest",
            CotpTpdu::DisconnectResponse { .. } => "COTPPacketDisconnectResponse",
            CotpTpdu::TpduError { .. } => "COTPPacketTpduError",
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            CotpTpdu::Data { .. } => 1 + 7,
            CotpTpdu::ConnectionRequest { .. }
            | CotpTpdu::ConnectionResponse { .. }
            | CotpTpdu::DisconnectRequest { .. } => 16 + 16 + 8,
            CotpTpdu::DisconnectResponse { .. } => 16 + 16,
            CotpTpdu::TpduError { .. } => 16 + 8,
        }
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        match *self {
            CotpTpdu::Data { eot, tpdu_ref } => {
                wb.write_bit("eot", eot)?;
                wb.write_u8("tpduRef", 7, tpdu_ref)
            }
            CotpTpdu::ConnectionRequest {
                destination_reference,
                source_reference,
                protocol_class,
            }
            | CotpTpdu::ConnectionResponse {
                destination_reference,
                source_reference,
                protocol_class,
            }
            | CotpTpdu::DisconnectRequest {
                destination_reference,
                source_reference,
                protocol_class,
            } => {
                wb.write_u16("destinationReference", 16, destination_reference)?;
                wb.write_u16("sourceReference", 16, source_reference)?;
                write_enum(wb, "protocolClass", protocol_class)
            }
            CotpTpdu::DisconnectResponse {
                destination_reference,
                source_reference,
            } => {
                wb.write_u16("destinationReference", 16, destination_reference)?;
                wb.write_u16("sourceReference", 16, source_reference)
            }
            CotpTpdu::TpduError {
                destination_reference,
                reject_cause,
            } => {
                wb.write_u16("destinationReference", 16, destination_reference)?;
                wb.write_u8("rejectCause", 8, reject_cause)
            }
        }
    }

    fn parse_fields(rb: &mut dyn ReadBuffer, tpdu_code: u8) -> Result<Self> {
        match tpdu_code {
            0xF0 => read_variant(rb, "COTPPacketData", |rb| {
                Ok(CotpTpdu::Data {
                    eot: rb.read_bit("eot")?,
                    tpdu_ref: rb.read_u8("tpduRef", 7)?,
                })
            }),
            0xE0 => read_variant(rb, "COTPPacketConnectionRequest", |rb| {
                Ok(CotpTpdu::ConnectionRequest {
                    destination_reference: rb.read_u16("destinationReference", 16)?,
                    source_reference: rb.read_u16("sourceReference", 16)?,
                    protocol_class: read_enum(rb, "protocolClass")?,
                })
            }),
            0xD0 => read_variant(rb, "COTPPacketConnectionResponse", |rb| {
                Ok(CotpTpdu::ConnectionResponse {
                    destination_reference: rb.read_u16("destinationReference", 16)?,
                    source_reference: rb.read_u16("sourceReference", 16)?,
                    protocol_class: read_enum(rb, "protocolClass")?,
                })
            }),
            0x80 => read_variant(rb, "COTPPacketDisconnectRequest", |rb| {
                Ok(CotpTpdu::DisconnectRequest {
                    destination_reference: rb.read_u16("destinationReference", 16)?,
                    source_reference: rb.read_u16("sourceReference", 16)?,
                    protocol_class: read_enum(rb, "protocolClass")?,
                })
            }),
            0xC0 => read_variant(rb, "COTPPacketDisconnectResponse", |rb| {
                Ok(CotpTpdu::DisconnectResponse {
                    destination_reference: rb.read_u16("destinationReference", 16)?,
                    source_reference: rb.read_u16("sourceReference", 16)?,
                })
            }),
            0x70 => read_variant(rb, "COTPPacketTpduError", |rb| {
                Ok(CotpTpdu::TpduError {
                    destination_reference: rb.read_u16("destinationReference", 16)?,
                    reject_cause: rb.read_u8("rejectCause", 8)?,
                })
            }),
            other => Err(CodecError::unsupported(
                "COTPPacket",
                format!("tpduCode=0x{other:02X}"),
            )),
        }
    }
}

/// A COTP packet: fixed part, variable-part parameters and an optional S7 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CotpPacket {
    /// Fixed part.
    pub tpdu: CotpTpdu,
    /// Variable part of the header.
    pub parameters: Vec<CotpParameter>,
    /// User data, present while the TPKT length leaves bytes after the header.
    pub payload: Option<S7Message>,
}

impl CotpPacket {
    /// A data TPDU carrying `payload`.
    pub fn data(tpdu_ref: u8, parameters: Vec<CotpParameter>, payload: S7Message) -> Self {
        Self {
            tpdu: CotpTpdu::Data {
                eot: false,
                tpdu_ref,
            },
            parameters,
            payload: Some(payload),
        }
    }

    fn header_length_in_bits(&self) -> usize {
        8 + 8 + self.tpdu.own_length_in_bits() + array_length_in_bits(&self.parameters)
    }
}

impl Message for CotpPacket {
    fn type_name(&self) -> &'static str {
        "COTPPacket"
    }

    fn length_in_bits(&self) -> usize {
        self.header_length_in_bits() + self.payload.as_ref().map_or(0, Message::length_in_bits)
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("COTPPacket", ContextKind::Element)?;
        // The header length does not count its own octet.
        let header_length: u8 =
            implicit_length("headerLength", self.header_length_in_bits() / 8 - 1)?;
        wb.write_u8("headerLength", 8, header_length)?;
        wb.write_u8("tpduCode", 8, self.tpdu.tpdu_code())?;
        write_variant(wb, self.tpdu.variant_name(), |wb| self.tpdu.serialize_fields(wb))?;
        write_array(wb, "parameters", &self.parameters, |wb, parameter| {
            parameter.serialize(wb)
        })?;
        if let Some(payload) = &self.payload {
            write_simple(wb, "payload", payload)?;
        }
        wb.pop_context("COTPPacket", ContextKind::Element)
    }
}

impl Parse for CotpPacket {
    /// Bytes of the packet as announced by the TPKT header.
    type Args = usize;

    fn parse(rb: &mut dyn ReadBuffer, cotp_len: usize) -> Result<Self> {
        rb.pull_context("COTPPacket", ContextKind::Element)?;
        let start = rb.pos();
        let header_length = rb.read_u8("headerLength", 8)?;
        let tpdu_code = rb.read_u8("tpduCode", 8)?;
        let tpdu = CotpTpdu::parse_fields(rb, tpdu_code)?;
        let header_end = start + usize::from(header_length) + 1;
        let parameters_length = header_end
            .checked_sub(rb.pos())
            .ok_or(CodecError::LengthOverrun {
                boundary: header_end,
                position: rb.pos(),
            })
            .parsing("parameters")?;
        let parameters = read_length_array(rb, "parameters", parameters_length, |rb| {
            CotpParameter::parse(rb, ())
        })?;
        let payload = if rb.pos() - start < cotp_len {
            Some(read_simple(rb, "payload", ())?)
        } else {
            None
        };
        rb.close_context("COTPPacket", ContextKind::Element)?;
        Ok(Self {
            tpdu,
            parameters,
            payload,
        })
    }
}

/// A parameter of the variable part of a COTP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CotpParameter {
    /// `0xC0` maximum TPDU size.
    TpduSize {
        /// Negotiated size.
        tpdu_size: CotpTpduSize,
    },
    /// `0xC1` TSAP of the caller.
    CallingTsap {
        /// Transport service access point.
        tsap_id: u16,
    },
    /// `0xC2` TSAP of the called side.
    CalledTsap {
        /// Transport service access point.
        tsap_id: u16,
    },
    /// `0xC3` checksum of the TPDU.
    Checksum {
        /// Checksum value.
        crc: u8,
    },
    /// `0xE0` free text attached to a disconnect.
    DisconnectAdditionalInformation {
        /// Raw text.
        data: Vec<u8>,
    },
}

impl CotpParameter {
    /// Wire discriminator.
    pub fn parameter_type(&self) -> u8 {
        match self {
            CotpParameter::TpduSize { .. } => 0xC0,
            CotpParameter::CallingTsap { .. } => 0xC1,
            CotpParameter::CalledTsap { .. } => 0xC2,
            CotpParameter::Checksum { .. } => 0xC3,
            CotpParameter::DisconnectAdditionalInformation { .. } => 0xE0,
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            CotpParameter::TpduSize { .. } | CotpParameter::Checksum { .. } => 8,
            CotpParameter::CallingTsap { .. } | CotpParameter::CalledTsap { .. } => 16,
            CotpParameter::DisconnectAdditionalInformation { data } => data.len() * 8,
        }
    }
}

impl Message for CotpParameter {
    fn type_name(&self) -> &'static str {
        "COTPParameter"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + self.own_length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("COTPParameter", ContextKind::Element)?;
        wb.write_u8("parameterType", 8, self.parameter_type())?;
        let parameter_length: u8 =
            implicit_length("parameterLength", self.own_length_in_bits() / 8)?;
        wb.write_u8("parameterLength", 8, parameter_length)?;
        match self {
            CotpParameter::TpduSize { tpdu_size } => {
                write_variant(wb, "COTPParameterTpduSize", |wb| {
                    write_enum(wb, "tpduSize", *tpdu_size)
                })?
            }
            CotpParameter::CallingTsap { tsap_id } => {
                write_variant(wb, "COTPParameterCallingTsap", |wb| {
                    wb.write_u16("tsapId", 16, *tsap_id)
                })?
            }
            CotpParameter::CalledTsap { tsap_id } => {
                write_variant(wb, "COTPParameterCalledTsap", |wb| {
                    wb.write_u16("tsapId", 16, *tsap_id)
                })?
            }
            CotpParameter::Checksum { crc } => write_variant(wb, "COTPParameterChecksum", |wb| {
                wb.write_u8("crc", 8, *crc)
            })?,
            CotpParameter::DisconnectAdditionalInformation { data } => write_variant(
                wb,
                "COTPParameterDisconnectAdditionalInformation",
                |wb| wb.write_byte_array("data", data),
            )?,
        }
        wb.pop_context("COTPParameter", ContextKind::Element)
    }
}

impl Parse for CotpParameter {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("COTPParameter", ContextKind::Element)?;
        let parameter_type = rb.read_u8("parameterType", 8)?;
        let parameter_length = rb.read_u8("parameterLength", 8)?;
        let value = match parameter_type {
            0xC0 => read_variant(rb, "COTPParameterTpduSize", |rb| {
                Ok(CotpParameter::TpduSize {
                    tpdu_size: read_enum(rb, "tpduSize")?,
                })
            })?,
            0xC1 => read_variant(rb, "COTPParameterCallingTsap", |rb| {
                Ok(CotpParameter::CallingTsap {
                    tsap_id: rb.read_u16("tsapId", 16)?,
                })
            })?,
            0xC2 => read_variant(rb, "COTPParameterCalledTsap", |rb| {
                Ok(CotpParameter::CalledTsap {
                    tsap_id: rb.read_u16("tsapId", 16)?,
                })
            })?,
            0xC3 => read_variant(rb, "COTPParameterChecksum", |rb| {
                Ok(CotpParameter::Checksum {
                    crc: rb.read_u8("crc", 8)?,
                })
            })?,
            0xE0 => read_variant(rb, "COTPParameterDisconnectAdditionalInformation", |rb| {
                Ok(CotpParameter::DisconnectAdditionalInformation {
                    data: rb.read_byte_array("data", usize::from(parameter_length))?,
                })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "COTPParameter",
                    format!("parameterType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("COTPParameter", ContextKind::Element)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s7::message::{
        S7Address, S7MessageType, S7Parameter, S7Payload, S7VarPayloadDataItem,
        S7VarRequestParameterItem,
    };
    use crate::s7::types::{DataTransportErrorCode, DataTransportSize, MemoryArea, TransportSize};
    use pretty_assertions::assert_eq;

    const READ_VAR_RESPONSE: &str =
        "0300001e05f00dc0010c32030000000b0002000600000401ff0300010100";

    fn read_var_response() -> TpktPacket {
        TpktPacket {
            payload: CotpPacket::data(
                13,
                vec![CotpParameter::TpduSize {
                    tpdu_size: CotpTpduSize::Size4096,
                }],
                S7Message {
                    tpdu_reference: 11,
                    message_type: S7MessageType::ResponseData {
                        error_class: 0,
                        error_code: 0,
                    },
                    parameter: Some(S7Parameter::ReadVarResponse { num_items: 1 }),
                    payload: Some(S7Payload::ReadVarResponse {
                        items: vec![S7VarPayloadDataItem {
                            return_code: DataTransportErrorCode::Ok,
                            transport_size: DataTransportSize::Bit,
                            data: vec![0x01],
                        }],
                    }),
                },
            ),
        }
    }

    fn write_var_request() -> TpktPacket {
        let address = S7Address {
            transport_size: TransportSize::Byte,
            number_of_elements: 64,
            db_number: 13,
            area: MemoryArea::Inputs,
            byte_address: 0,
            bit_address: 0,
        };
        TpktPacket {
            payload: CotpPacket::data(
                13,
                vec![CotpParameter::TpduSize {
                    tpdu_size: CotpTpduSize::Size4096,
                }],
                S7Message::request(
                    13,
                    S7Parameter::WriteVarRequest {
                        items: vec![S7VarRequestParameterItem::Address { address }],
                    },
                    Some(S7Payload::WriteVarRequest {
                        items: vec![S7VarPayloadDataItem {
                            return_code: DataTransportErrorCode::Ok,
                            transport_size: DataTransportSize::ByteWordDword,
                            data: [0xAF, 0xFE].repeat(32),
                        }],
                    }),
                ),
            ),
        }
    }

    #[test]
    fn test_read_var_response_frame() {
        let bytes = hex::decode(READ_VAR_RESPONSE).unwrap();
        let packet = read_var_response();
        assert_eq!(packet.length_in_bytes(), 30);
        assert_eq!(packet.to_bytes().unwrap(), bytes);
        assert_eq!(TpktPacket::from_bytes(&bytes, ()).unwrap(), packet);
    }

    #[test]
    fn test_write_var_request_frame() {
        let mut expected = hex::decode(concat!(
            "0300006605f00dc0010c",
            "32010000000d000e0044",
            "0501120a10020040000d81000000",
            "ff040200",
        ))
        .unwrap();
        expected.extend([0xAF, 0xFE].repeat(32));
        let packet = write_var_request();
        assert_eq!(packet.to_bytes().unwrap(), expected);
        assert_eq!(TpktPacket::from_bytes(&expected, ()).unwrap(), packet);
    }

    #[test]
    fn test_xml_layout() {
        let xml = read_var_response().to_xml().unwrap();
        assert!(xml.contains("<len dataType=\"uint\" bitLength=\"16\">30</len>"));
        assert!(xml.contains("stringRepresentation=\"SIZE_4096\""));
        assert!(xml.contains("<COTPPacketData>"));
        assert_eq!(TpktPacket::from_xml(&xml, ()).unwrap(), read_var_response());
    }

    #[test]
    fn test_connection_request_without_payload() {
        let packet = TpktPacket {
            payload: CotpPacket {
                tpdu: CotpTpdu::ConnectionRequest {
                    destination_reference: 0x0000,
                    source_reference: 0x000F,
                    protocol_class: CotpProtocolClass::Class0,
                },
                parameters: vec![
                    CotpParameter::CalledTsap { tsap_id: 0x0102 },
                    CotpParameter::CallingTsap { tsap_id: 0x0111 },
                    CotpParameter::TpduSize {
                        tpdu_size: CotpTpduSize::Size1024,
                    },
                ],
                payload: None,
            },
        };
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(
            bytes,
            hex::decode("0300001611e00000000f00c2020102c1020111c0010a").unwrap()
        );
        assert_eq!(TpktPacket::from_bytes(&bytes, ()).unwrap(), packet);
    }

    #[test]
    fn test_disconnect_information() {
        let parameter = CotpParameter::DisconnectAdditionalInformation {
            data: b"bye".to_vec(),
        };
        let bytes = parameter.to_bytes().unwrap();
        assert_eq!(bytes, [0xE0, 0x03, b'b', b'y', b'e']);
        assert_eq!(CotpParameter::from_bytes(&bytes, ()).unwrap(), parameter);
    }

    #[test]
    fn test_header_length_shorter_than_fixed_part() {
        let bytes = hex::decode("0300000a01e00000000f00").unwrap();
        let err = TpktPacket::from_bytes(&bytes, ()).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'payload'.'parameters'"));
        assert!(matches!(err.root_cause(), CodecError::LengthOverrun { .. }));
    }

    #[test]
    fn test_unknown_tpdu_code() {
        let bytes = hex::decode("0300000702110000").unwrap();
        let err = TpktPacket::from_bytes(&bytes, ()).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::UnsupportedVariant { type_name: "COTPPacket", .. }
        ));
    }
}
