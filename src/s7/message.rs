//! S7 communication: the message header, its parameters and its payloads.

use super::types::{DataTransportErrorCode, DataTransportSize, MemoryArea, TransportSize};
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    array_length_in_bits, implicit_length, read_const, read_count_array, read_enum,
    read_optional, read_padding, read_reserved, read_simple, read_variant, write_array,
    write_const, write_enum, write_padding, write_reserved, write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// Protocol id opening every S7 message.
pub const S7_PROTOCOL_ID: u8 = 0x32;

/// Role of a message and the header fields that come with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S7MessageType {
    /// `0x01` job request.
    Request,
    /// `0x02` acknowledgement without data.
    Response {
        /// Error class, `0` on success.
        error_class: u8,
        /// Error code within the class.
        error_code: u8,
    },
    /// `0x03` acknowledgement with data.
    ResponseData {
        /// Error class, `0` on success.
        error_class: u8,
        /// Error code within the class.
        error_code: u8,
    },
    /// `0x07` user data.
    UserData,
}

impl S7MessageType {
    /// Wire discriminator.
    pub fn message_type(&self) -> u8 {
        match self {
            S7MessageType::Request => 0x01,
            S7MessageType::Response { .. } => 0x02,
            S7MessageType::ResponseData { .. } => 0x03,
            S7MessageType::UserData => 0x07,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            S7MessageType::Request => "S7MessageRequest",
            S7MessageType::Response { .. } => "S7MessageResponse",
            S7MessageType::ResponseData { .. } => "S7MessageResponseData",
            S7MessageType::UserData => "S7MessageUserData",
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            S7MessageType::Response { .. } | S7MessageType::ResponseData { .. } => 16,
            S7MessageType::Request | S7MessageType::UserData => 0,
        }
    }
}

/// An S7 message as carried in a COTP data TPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S7Message {
    /// Pairs a response with its request.
    pub tpdu_reference: u16,
    /// Role and header extension.
    pub message_type: S7MessageType,
    /// Parameter block, absent when its length is zero.
    pub parameter: Option<S7Parameter>,
    /// Payload block, absent when its length is zero.
    pub payload: Option<S7Payload>,
}

impl S7Message {
    /// A job request.
    pub fn request(
        tpdu_reference: u16,
        parameter: S7Parameter,
        payload: Option<S7Payload>,
    ) -> Self {
        Self {
            tpdu_reference,
            message_type: S7MessageType::Request,
            parameter: Some(parameter),
            payload,
        }
    }

    /// Whether the peer reported an error in the header.
    pub fn is_error(&self) -> bool {
        match self.message_type {
            S7MessageType::Response {
                error_class,
                error_code,
            }
            | S7MessageType::ResponseData {
                error_class,
                error_code,
            } => error_class != 0 || error_code != 0,
            S7MessageType::Request | S7MessageType::UserData => false,
        }
    }
}

impl Message for S7Message {
    fn type_name(&self) -> &'static str {
        "S7Message"
    }

    fn length_in_bits(&self) -> usize {
        let parameter = self.parameter.as_ref().map_or(0, Message::length_in_bits);
        let payload = self.payload.as_ref().map_or(0, Message::length_in_bits);
        8 + 8 + 16 + 16 + 16 + 16 + self.message_type.own_length_in_bits() + parameter + payload
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7Message", ContextKind::Element)?;
        write_const(wb, "protocolId", 8, u64::from(S7_PROTOCOL_ID))?;
        wb.write_u8("messageType", 8, self.message_type.message_type())?;
        write_reserved(wb, "reserved", 16, 0x0000)?;
        wb.write_u16("tpduReference", 16, self.tpdu_reference)?;
        let parameter_length: u16 = implicit_length(
            "parameterLength",
            self.parameter.as_ref().map_or(0, Message::length_in_bytes),
        )?;
        wb.write_u16("parameterLength", 16, parameter_length)?;
        let payload_length: u16 = implicit_length(
            "payloadLength",
            self.payload.as_ref().map_or(0, Message::length_in_bytes),
        )?;
        wb.write_u16("payloadLength", 16, payload_length)?;
        write_variant(wb, self.message_type.variant_name(), |wb| {
            match self.message_type {
                S7MessageType::Response {
                    error_class,
                    error_code,
                }
                | S7MessageType::ResponseData {
                    error_class,
                    error_code,
                } => {
                    wb.write_u8("errorClass", 8, error_class)?;
                    wb.write_u8("errorCode", 8, error_code)
                }
                S7MessageType::Request | S7MessageType::UserData => Ok(()),
            }
        })?;
        if let Some(parameter) = &self.parameter {
            write_simple(wb, "parameter", parameter)?;
        }
        if let Some(payload) = &self.payload {
            write_simple(wb, "payload", payload)?;
        }
        wb.pop_context("S7Message", ContextKind::Element)
    }
}

impl Parse for S7Message {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("S7Message", ContextKind::Element)?;
        read_const(rb, "protocolId", 8, u64::from(S7_PROTOCOL_ID))?;
        let message_type = rb.read_u8("messageType", 8)?;
        read_reserved(rb, "reserved", 16, 0x0000)?;
        let tpdu_reference = rb.read_u16("tpduReference", 16)?;
        let parameter_length = rb.read_u16("parameterLength", 16)?;
        let payload_length = rb.read_u16("payloadLength", 16)?;
        let message_type = match message_type {
            0x01 => read_variant(rb, "S7MessageRequest", |_| Ok(S7MessageType::Request))?,
            0x02 => read_variant(rb, "S7MessageResponse", |rb| {
                Ok(S7MessageType::Response {
                    error_class: rb.read_u8("errorClass", 8)?,
                    error_code: rb.read_u8("errorCode", 8)?,
                })
            })?,
            0x03 => read_variant(rb, "S7MessageResponseData", |rb| {
                Ok(S7MessageType::ResponseData {
                    error_class: rb.read_u8("errorClass", 8)?,
                    error_code: rb.read_u8("errorCode", 8)?,
                })
            })?,
            0x07 => read_variant(rb, "S7MessageUserData", |_| Ok(S7MessageType::UserData))?,
            other => {
                return Err(CodecError::unsupported(
                    "S7Message",
                    format!("messageType=0x{other:02X}"),
                ))
            }
        };
        let type_code = message_type.message_type();
        let parameter: Option<S7Parameter> =
            read_optional(rb, "parameter", parameter_length > 0, type_code)?;
        let payload = match (&parameter, payload_length > 0) {
            (_, false) => None,
            (Some(parameter), true) => Some(read_simple(
                rb,
                "payload",
                S7PayloadArgs {
                    message_type: type_code,
                    parameter_type: parameter.parameter_type(),
                    num_items: parameter.num_items(),
                },
            )?),
            (None, true) => {
                return Err(CodecError::invalid_value("payload without a parameter block"))
                    .parsing("payload")
            }
        };
        rb.close_context("S7Message", ContextKind::Element)?;
        Ok(Self {
            tpdu_reference,
            message_type,
            parameter,
            payload,
        })
    }
}

/// Parameter block, switched on the parameter type and the message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S7Parameter {
    /// `0xF0` negotiation of the job queue depth and the PDU size.
    SetupCommunication {
        /// Parallel jobs the caller accepts.
        max_amq_caller: u16,
        /// Parallel jobs the callee accepts.
        max_amq_callee: u16,
        /// Negotiated PDU size.
        pdu_length: u16,
    },
    /// `0x04` in a request: the addresses to read.
    ReadVarRequest {
        /// Requested items.
        items: Vec<S7VarRequestParameterItem>,
    },
    /// `0x04` in a response: how many items follow in the payload.
    ReadVarResponse {
        /// Item count of the payload.
        num_items: u8,
    },
    /// `0x05` in a request: the addresses to write.
    WriteVarRequest {
        /// Addressed items.
        items: Vec<S7VarRequestParameterItem>,
    },
    /// `0x05` in a response: how many status items follow in the payload.
    WriteVarResponse {
        /// Item count of the payload.
        num_items: u8,
    },
}

impl S7Parameter {
    /// Wire discriminator.
    pub fn parameter_type(&self) -> u8 {
        match self {
            S7Parameter::SetupCommunication { .. } => 0xF0,
            S7Parameter::ReadVarRequest { .. } | S7Parameter::ReadVarResponse { .. } => 0x04,
            S7Parameter::WriteVarRequest { .. } | S7Parameter::WriteVarResponse { .. } => 0x05,
        }
    }

    /// Number of payload items this parameter announces.
    pub fn num_items(&self) -> usize {
        match self {
            S7Parameter::SetupCommunication { .. } => 0,
            S7Parameter::ReadVarRequest { items } | S7Parameter::WriteVarRequest { items } => {
                items.len()
            }
            S7Parameter::ReadVarResponse { num_items }
            | S7Parameter::WriteVarResponse { num_items } => usize::from(*num_items),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            S7Parameter::SetupCommunication { .. } => "S7ParameterSetupCommunication",
            S7Parameter::ReadVarRequest { .. } => "S7ParameterReadVarRequest",
            S7Parameter::ReadVarResponse { .. } => "S7ParameterReadVarResponse",
            S7Parameter::WriteVarRequest { .. } => "S7ParameterWriteVarRequest",
            S7Parameter::WriteVarResponse { .. } => "S7ParameterWriteVarResponse",
        }
    }
}

fn write_request_items(wb: &mut dyn WriteBuffer, items: &[S7VarRequestParameterItem]) -> Result<()> {
    let num_items: u8 = implicit_length("numItems", items.len())?;
    wb.write_u8("numItems", 8, num_items)?;
    write_array(wb, "items", items, |wb, item| item.serialize(wb))
}

fn read_request_items(rb: &mut dyn ReadBuffer) -> Result<Vec<S7VarRequestParameterItem>> {
    let num_items = rb.read_u8("numItems", 8)?;
    read_count_array(rb, "items", usize::from(num_items), |rb| {
        S7VarRequestParameterItem::parse(rb, ())
    })
}

impl Message for S7Parameter {
    fn type_name(&self) -> &'static str {
        "S7Parameter"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            S7Parameter::SetupCommunication { .. } => 8 + 16 + 16 + 16,
            S7Parameter::ReadVarRequest { items } | S7Parameter::WriteVarRequest { items } => {
                8 + array_length_in_bits(items)
            }
            S7Parameter::ReadVarResponse { .. } | S7Parameter::WriteVarResponse { .. } => 8,
        };
        8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7Parameter", ContextKind::Element)?;
        wb.write_u8("parameterType", 8, self.parameter_type())?;
        write_variant(wb, self.variant_name(), |wb| match self {
            S7Parameter::SetupCommunication {
                max_amq_caller,
                max_amq_callee,
                pdu_length,
            } => {
                write_reserved(wb, "reserved", 8, 0x00)?;
                wb.write_u16("maxAmqCaller", 16, *max_amq_caller)?;
                wb.write_u16("maxAmqCallee", 16, *max_amq_callee)?;
                wb.write_u16("pduLength", 16, *pdu_length)
            }
            S7Parameter::ReadVarRequest { items } | S7Parameter::WriteVarRequest { items } => {
                write_request_items(wb, items)
            }
            S7Parameter::ReadVarResponse { num_items }
            | S7Parameter::WriteVarResponse { num_items } => {
                wb.write_u8("numItems", 8, *num_items)
            }
        })?;
        wb.pop_context("S7Parameter", ContextKind::Element)
    }
}

impl Parse for S7Parameter {
    /// Message type of the enclosing message.
    type Args = u8;

    fn parse(rb: &mut dyn ReadBuffer, message_type: u8) -> Result<Self> {
        rb.pull_context("S7Parameter", ContextKind::Element)?;
        let parameter_type = rb.read_u8("parameterType", 8)?;
        let value = match (parameter_type, message_type) {
            (0xF0, _) => read_variant(rb, "S7ParameterSetupCommunication", |rb| {
                read_reserved(rb, "reserved", 8, 0x00)?;
                Ok(S7Parameter::SetupCommunication {
                    max_amq_caller: rb.read_u16("maxAmqCaller", 16)?,
                    max_amq_callee: rb.read_u16("maxAmqCallee", 16)?,
                    pdu_length: rb.read_u16("pduLength", 16)?,
                })
            })?,
            (0x04, 0x01) => read_variant(rb, "S7ParameterReadVarRequest", |rb| {
                Ok(S7Parameter::ReadVarRequest {
                    items: read_request_items(rb)?,
                })
            })?,
            (0x04, 0x03) => read_variant(rb, "S7ParameterReadVarResponse", |rb| {
                Ok(S7Parameter::ReadVarResponse {
                    num_items: rb.read_u8("numItems", 8)?,
                })
            })?,
            (0x05, 0x01) => read_variant(rb, "S7ParameterWriteVarRequest", |rb| {
                Ok(S7Parameter::WriteVarRequest {
                    items: read_request_items(rb)?,
                })
            })?,
            (0x05, 0x03) => read_variant(rb, "S7ParameterWriteVarResponse", |rb| {
                Ok(S7Parameter::WriteVarResponse {
                    num_items: rb.read_u8("numItems", 8)?,
                })
            })?,
            (parameter_type, message_type) => {
                return Err(CodecError::unsupported(
                    "S7Parameter",
                    format!("parameterType=0x{parameter_type:02X}, messageType=0x{message_type:02X}"),
                ))
            }
        };
        rb.close_context("S7Parameter", ContextKind::Element)?;
        Ok(value)
    }
}

/// One addressed item of a read or write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S7VarRequestParameterItem {
    /// `0x12` item addressed by an [`S7Address`].
    Address {
        /// Target of the access.
        address: S7Address,
    },
}

impl Message for S7VarRequestParameterItem {
    fn type_name(&self) -> &'static str {
        "S7VarRequestParameterItem"
    }

    fn length_in_bits(&self) -> usize {
        let S7VarRequestParameterItem::Address { address } = self;
        8 + 8 + address.length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        let S7VarRequestParameterItem::Address { address } = self;
        wb.push_context("S7VarRequestParameterItem", ContextKind::Element)?;
        wb.write_u8("itemType", 8, 0x12)?;
        write_variant(wb, "S7VarRequestParameterItemAddress", |wb| {
            let item_length: u8 = implicit_length("itemLength", address.length_in_bytes())?;
            wb.write_u8("itemLength", 8, item_length)?;
            write_simple(wb, "address", address)
        })?;
        wb.pop_context("S7VarRequestParameterItem", ContextKind::Element)
    }
}

impl Parse for S7VarRequestParameterItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("S7VarRequestParameterItem", ContextKind::Element)?;
        let item_type = rb.read_u8("itemType", 8)?;
        let value = match item_type {
            0x12 => read_variant(rb, "S7VarRequestParameterItemAddress", |rb| {
                let _item_length = rb.read_u8("itemLength", 8)?;
                Ok(S7VarRequestParameterItem::Address {
                    address: read_simple(rb, "address", ())?,
                })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "S7VarRequestParameterItem",
                    format!("itemType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("S7VarRequestParameterItem", ContextKind::Element)?;
        Ok(value)
    }
}

/// Any-pointer address: area, data block, byte and bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct S7Address {
    /// Element type.
    pub transport_size: TransportSize,
    /// Element count.
    pub number_of_elements: u16,
    /// Data block number, `0` outside data blocks.
    pub db_number: u16,
    /// Memory area.
    pub area: MemoryArea,
    /// Byte offset in the area.
    pub byte_address: u16,
    /// Bit offset in the byte, `0..=7`.
    pub bit_address: u8,
}

impl std::fmt::Display for S7Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.area {
            MemoryArea::DataBlocks | MemoryArea::InstanceDataBlocks => write!(
                f,
                "%{}{}.DBX{}.{}",
                self.area.short_name(),
                self.db_number,
                self.byte_address,
                self.bit_address
            ),
            area => write!(
                f,
                "%{}{}.{}",
                area.short_name(),
                self.byte_address,
                self.bit_address
            ),
        }
    }
}

impl Message for S7Address {
    fn type_name(&self) -> &'static str {
        "S7Address"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 16 + 16 + 8 + 5 + 16 + 3
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7Address", ContextKind::Element)?;
        wb.write_u8("addressType", 8, 0x10)?;
        write_variant(wb, "S7AddressAny", |wb| {
            write_enum(wb, "transportSize", self.transport_size)?;
            wb.write_u16("numberOfElements", 16, self.number_of_elements)?;
            wb.write_u16("dbNumber", 16, self.db_number)?;
            write_enum(wb, "area", self.area)?;
            write_reserved(wb, "reserved", 5, 0x00)?;
            wb.write_u16("byteAddress", 16, self.byte_address)?;
            wb.write_u8("bitAddress", 3, self.bit_address)
        })?;
        wb.pop_context("S7Address", ContextKind::Element)
    }
}

impl Parse for S7Address {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("S7Address", ContextKind::Element)?;
        let address_type = rb.read_u8("addressType", 8)?;
        if address_type != 0x10 {
            return Err(CodecError::unsupported(
                "S7Address",
                format!("addressType=0x{address_type:02X}"),
            ));
        }
        let value = read_variant(rb, "S7AddressAny", |rb| {
            let transport_size = read_enum(rb, "transportSize")?;
            let number_of_elements = rb.read_u16("numberOfElements", 16)?;
            let db_number = rb.read_u16("dbNumber", 16)?;
            let area = read_enum(rb, "area")?;
            read_reserved(rb, "reserved", 5, 0x00)?;
            Ok(S7Address {
                transport_size,
                number_of_elements,
                db_number,
                area,
                byte_address: rb.read_u16("byteAddress", 16)?,
                bit_address: rb.read_u8("bitAddress", 3)?,
            })
        })?;
        rb.close_context("S7Address", ContextKind::Element)?;
        Ok(value)
    }
}

/// Arguments a payload needs from the header and the parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S7PayloadArgs {
    /// Message type of the enclosing message.
    pub message_type: u8,
    /// Parameter type of the parameter block.
    pub parameter_type: u8,
    /// Item count announced by the parameter block.
    pub num_items: usize,
}

/// Payload block, switched like the parameter block that precedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S7Payload {
    /// Values read, one item per requested address.
    ReadVarResponse {
        /// Data items.
        items: Vec<S7VarPayloadDataItem>,
    },
    /// Values to write, one item per addressed item.
    WriteVarRequest {
        /// Data items.
        items: Vec<S7VarPayloadDataItem>,
    },
    /// Outcome of a write, one status per addressed item.
    WriteVarResponse {
        /// Status items.
        items: Vec<S7VarPayloadStatusItem>,
    },
}

impl S7Payload {
    fn variant_name(&self) -> &'static str {
        match self {
            S7Payload::ReadVarResponse { .. } => "S7PayloadReadVarResponse",
            S7Payload::WriteVarRequest { .. } => "S7PayloadWriteVarRequest",
            S7Payload::WriteVarResponse { .. } => "S7PayloadWriteVarResponse",
        }
    }
}

impl Message for S7Payload {
    fn type_name(&self) -> &'static str {
        "S7Payload"
    }

    fn length_in_bits(&self) -> usize {
        match self {
            S7Payload::ReadVarResponse { items } | S7Payload::WriteVarRequest { items } => {
                array_length_in_bits(items)
            }
            S7Payload::WriteVarResponse { items } => array_length_in_bits(items),
        }
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7Payload", ContextKind::Element)?;
        write_variant(wb, self.variant_name(), |wb| match self {
            S7Payload::ReadVarResponse { items } | S7Payload::WriteVarRequest { items } => {
                write_array(wb, "items", items, |wb, item| item.serialize(wb))
            }
            S7Payload::WriteVarResponse { items } => {
                write_array(wb, "items", items, |wb, item| item.serialize(wb))
            }
        })?;
        wb.pop_context("S7Payload", ContextKind::Element)
    }
}

impl Parse for S7Payload {
    type Args = S7PayloadArgs;

    fn parse(rb: &mut dyn ReadBuffer, args: S7PayloadArgs) -> Result<Self> {
        rb.pull_context("S7Payload", ContextKind::Element)?;
        let value = match (args.parameter_type, args.message_type) {
            (0x04, 0x03) => read_variant(rb, "S7PayloadReadVarResponse", |rb| {
                Ok(S7Payload::ReadVarResponse {
                    items: read_count_array(rb, "items", args.num_items, |rb| {
                        S7VarPayloadDataItem::parse(rb, ())
                    })?,
                })
            })?,
            (0x05, 0x01) => read_variant(rb, "S7PayloadWriteVarRequest", |rb| {
                Ok(S7Payload::WriteVarRequest {
                    items: read_count_array(rb, "items", args.num_items, |rb| {
                        S7VarPayloadDataItem::parse(rb, ())
                    })?,
                })
            })?,
            (0x05, 0x03) => read_variant(rb, "S7PayloadWriteVarResponse", |rb| {
                Ok(S7Payload::WriteVarResponse {
                    items: read_count_array(rb, "items", args.num_items, |rb| {
                        S7VarPayloadStatusItem::parse(rb, ())
                    })?,
                })
            })?,
            (parameter_type, message_type) => {
                return Err(CodecError::unsupported(
                    "S7Payload",
                    format!("parameterType=0x{parameter_type:02X}, messageType=0x{message_type:02X}"),
                ))
            }
        };
        rb.close_context("S7Payload", ContextKind::Element)?;
        Ok(value)
    }
}

/// One value of a read response or a write request.
///
/// Items with an odd number of data bytes are followed by one padding byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S7VarPayloadDataItem {
    /// Outcome for this item, [`DataTransportErrorCode::Ok`] in requests.
    pub return_code: DataTransportErrorCode,
    /// Unit of the data length.
    pub transport_size: DataTransportSize,
    /// Raw value.
    pub data: Vec<u8>,
}

impl S7VarPayloadDataItem {
    fn data_length(&self) -> usize {
        match self.transport_size {
            DataTransportSize::Bit => self.data.len(),
            size if size.size_in_bits() => self.data.len() * 8,
            _ => self.data.len(),
        }
    }

    fn data_count(transport_size: DataTransportSize, data_length: usize) -> usize {
        match transport_size {
            DataTransportSize::Bit => data_length,
            size if size.size_in_bits() => data_length.div_ceil(8),
            _ => data_length,
        }
    }

    fn padding(&self) -> usize {
        self.data.len() % 2
    }
}

impl Message for S7VarPayloadDataItem {
    fn type_name(&self) -> &'static str {
        "S7VarPayloadDataItem"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 16 + self.data.len() * 8 + self.padding() * 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7VarPayloadDataItem", ContextKind::Element)?;
        write_enum(wb, "returnCode", self.return_code)?;
        write_enum(wb, "transportSize", self.transport_size)?;
        let data_length: u16 = implicit_length("dataLength", self.data_length())?;
        wb.write_u16("dataLength", 16, data_length)?;
        wb.write_byte_array("data", &self.data)?;
        write_padding(wb, "padding", self.padding(), 0x00)?;
        wb.pop_context("S7VarPayloadDataItem", ContextKind::Element)
    }
}

impl Parse for S7VarPayloadDataItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("S7VarPayloadDataItem", ContextKind::Element)?;
        let return_code = read_enum(rb, "returnCode")?;
        let transport_size = read_enum(rb, "transportSize")?;
        let data_length = rb.read_u16("dataLength", 16)?;
        let count = Self::data_count(transport_size, usize::from(data_length));
        let data = rb.read_byte_array("data", count)?;
        read_padding(rb, "padding", count % 2)?;
        rb.close_context("S7VarPayloadDataItem", ContextKind::Element)?;
        Ok(Self {
            return_code,
            transport_size,
            data,
        })
    }
}

/// Outcome of one item of a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct S7VarPayloadStatusItem {
    /// Outcome.
    pub return_code: DataTransportErrorCode,
}

impl Message for S7VarPayloadStatusItem {
    fn type_name(&self) -> &'static str {
        "S7VarPayloadStatusItem"
    }

    fn length_in_bits(&self) -> usize {
        8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("S7VarPayloadStatusItem", ContextKind::Element)?;
        write_enum(wb, "returnCode", self.return_code)?;
        wb.pop_context("S7VarPayloadStatusItem", ContextKind::Element)
    }
}

impl Parse for S7VarPayloadStatusItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("S7VarPayloadStatusItem", ContextKind::Element)?;
        let return_code = read_enum(rb, "returnCode")?;
        rb.close_context("S7VarPayloadStatusItem", ContextKind::Element)?;
        Ok(Self { return_code })
    }
}
