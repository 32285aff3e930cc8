//! The Modbus protocol data unit.
//!
//! Its first octet is an error bit and a seven bit function code. Requests
//! and responses of the same function share the code, so the parser also
//! needs to know which direction it is reading.

use super::types::{
    ModbusDeviceInformationConformityLevel, ModbusDeviceInformationLevel,
    ModbusDeviceInformationMoreFollows, ModbusDeviceInformationObject, ModbusErrorCode,
    ReadFileRecordRequestItem, ReadFileRecordResponseItem, WriteFileRecordRequestItem,
    WriteFileRecordResponseItem,
};
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    array_length_in_bits, implicit_length, read_const, read_count_array, read_enum,
    read_length_array, read_variant, write_array, write_const, write_enum, write_variant,
};
use crate::message::{Message, Parse};

/// MEI type of the encapsulated device identification transport.
pub const MEI_TYPE_DEVICE_IDENTIFICATION: u8 = 0x0E;

/// A Modbus PDU, keyed by error flag, function code and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ModbusPdu {
    /// Exception response for any function.
    Error {
        function_flag: u8,
        exception_code: ModbusErrorCode,
    },
    ReadDiscreteInputsRequest {
        starting_address: u16,
        quantity: u16,
    },
    ReadDiscreteInputsResponse {
        value: Vec<u8>,
    },
    ReadCoilsRequest {
        starting_address: u16,
        quantity: u16,
    },
    ReadCoilsResponse {
        value: Vec<u8>,
    },
    WriteSingleCoilRequest {
        address: u16,
        value: u16,
    },
    WriteSingleCoilResponse {
        address: u16,
        value: u16,
    },
    WriteMultipleCoilsRequest {
        starting_address: u16,
        quantity: u16,
        value: Vec<u8>,
    },
    WriteMultipleCoilsResponse {
        starting_address: u16,
        quantity: u16,
    },
    ReadInputRegistersRequest {
        starting_address: u16,
        quantity: u16,
    },
    ReadInputRegistersResponse {
        value: Vec<u8>,
    },
    ReadHoldingRegistersRequest {
        starting_address: u16,
        quantity: u16,
    },
    ReadHoldingRegistersResponse {
        value: Vec<u8>,
    },
    WriteSingleRegisterRequest {
        address: u16,
        value: u16,
    },
    WriteSingleRegisterResponse {
        address: u16,
        value: u16,
    },
    WriteMultipleHoldingRegistersRequest {
        starting_address: u16,
        quantity: u16,
        value: Vec<u8>,
    },
    WriteMultipleHoldingRegistersResponse {
        starting_address: u16,
        quantity: u16,
    },
    ReadWriteMultipleHoldingRegistersRequest {
        read_starting_address: u16,
        read_quantity: u16,
        write_starting_address: u16,
        write_quantity: u16,
        value: Vec<u8>,
    },
    ReadWriteMultipleHoldingRegistersResponse {
        value: Vec<u8>,
    },
    MaskWriteHoldingRegisterRequest {
        reference_address: u16,
        and_mask: u16,
        or_mask: u16,
    },
    MaskWriteHoldingRegisterResponse {
        reference_address: u16,
        and_mask: u16,
        or_mask: u16,
    },
    ReadFifoQueueRequest {
        fifo_pointer_address: u16,
    },
    ReadFifoQueueResponse {
        fifo_value: Vec<u16>,
    },
    ReadFileRecordRequest {
        items: Vec<ReadFileRecordRequestItem>,
    },
    ReadFileRecordResponse {
        items: Vec<ReadFileRecordResponseItem>,
    },
    WriteFileRecordRequest {
        items: Vec<WriteFileRecordRequestItem>,
    },
    WriteFileRecordResponse {
        items: Vec<WriteFileRecordResponseItem>,
    },
    ReadExceptionStatusRequest,
    ReadExceptionStatusResponse {
        value: u8,
    },
    DiagnosticRequest {
        sub_function: u16,
        data: u16,
    },
    DiagnosticResponse {
        sub_function: u16,
        data: u16,
    },
    GetComEventCounterRequest,
    GetComEventCounterResponse {
        status: u16,
        event_count: u16,
    },
    GetComEventLogRequest,
    GetComEventLogResponse {
        status: u16,
        event_count: u16,
        message_count: u16,
        events: Vec<u8>,
    },
    ReportServerIdRequest,
    ReportServerIdResponse {
        value: Vec<u8>,
    },
    ReadDeviceIdentificationRequest {
        level: ModbusDeviceInformationLevel,
        object_id: u8,
    },
    ReadDeviceIdentificationResponse {
        level: ModbusDeviceInformationLevel,
        individual_access: bool,
        conformity_level: ModbusDeviceInformationConformityLevel,
        more_follows: ModbusDeviceInformationMoreFollows,
        next_object_id: u8,
        objects: Vec<ModbusDeviceInformationObject>,
    },
}

use self::ModbusPdu as Pdu;

impl ModbusPdu {
    /// Error bit of the first octet.
    pub fn error_flag(&self) -> bool {
        matches!(self, Pdu::Error { .. })
    }

    /// Function code, seven bits.
    pub fn function_flag(&self) -> u8 {
        self.descriptor().0
    }

    /// Direction of the unit, `None` for exception responses, which are
    /// recognised by their error bit alone.
    pub fn response(&self) -> Option<bool> {
        match self {
            Pdu::Error { .. } => None,
            _ => Some(self.variant_name().ends_with("Response")),
        }
    }

    fn variant_name(&self) -> &'static str {
        self.descriptor().1
    }

    fn descriptor(&self) -> (u8, &'static str) {
        match self {
            Pdu::Error { function_flag, .. } => (*function_flag, "ModbusPDUError"),
            Pdu::ReadDiscreteInputsRequest { .. } => (0x02, "ModbusPDUReadDiscreteInputsRequest"),
            Pdu::ReadDiscreteInputsResponse { .. } => {
                (0x02, "ModbusPDUReadDiscreteInputsResponse")
            }
            Pdu::ReadCoilsRequest { .. } => (0x01, "ModbusPDUReadCoilsRequest"),
            Pdu::ReadCoilsResponse { .. } => (0x01, "ModbusPDUReadCoilsResponse"),
            Pdu::WriteSingleCoilRequest { .. } => (0x05, "ModbusPDUWriteSingleCoilRequest"),
            Pdu::WriteSingleCoilResponse { .. } => (0x05, "ModbusPDUWriteSingleCoilResponse"),
            Pdu::WriteMultipleCoilsRequest { .. } => (0x0F, "ModbusPDUWriteMultipleCoilsRequest"),
            Pdu::WriteMultipleCoilsResponse { .. } => {
                (0x0F, "ModbusPDUWriteMultipleCoilsResponse")
            }
            Pdu::ReadInputRegistersRequest { .. } => (0x04, "ModbusPDUReadInputRegistersRequest"),
            Pdu::ReadInputRegistersResponse { .. } => {
                (0x04, "ModbusPDUReadInputRegistersResponse")
            }
            Pdu::ReadHoldingRegistersRequest { .. } => {
                (0x03, "ModbusPDUReadHoldingRegistersRequest")
            }
            Pdu::ReadHoldingRegistersResponse { .. } => {
                (0x03, "ModbusPDUReadHoldingRegistersResponse")
            }
            Pdu::WriteSingleRegisterRequest { .. } => {
                (0x06, "ModbusPDUWriteSingleRegisterRequest")
            }
            Pdu::WriteSingleRegisterResponse { .. } => {
                (0x06, "ModbusPDUWriteSingleRegisterResponse")
            }
            Pdu::WriteMultipleHoldingRegistersRequest { .. } => {
                (0x10, "ModbusPDUWriteMultipleHoldingRegistersRequest")
            }
            Pdu::WriteMultipleHoldingRegistersResponse { .. } => {
                (0x10, "ModbusPDUWriteMultipleHoldingRegistersResponse")
            }
            Pdu::ReadWriteMultipleHoldingRegistersRequest { .. } => {
                (0x17, "ModbusPDUReadWriteMultipleHoldingRegistersRequest")
            }
            Pdu::ReadWriteMultipleHoldingRegistersResponse { .. } => {
                (0x17, "ModbusPDUReadWriteMultipleHoldingRegistersResponse")
            }
            Pdu::MaskWriteHoldingRegisterRequest { .. } => {
                (0x16, "ModbusPDUMaskWriteHoldingRegisterRequest")
            }
            Pdu::MaskWriteHoldingRegisterResponse { .. } => {
                (0x16, "ModbusPDUMaskWriteHoldingRegisterResponse")
            }
            Pdu::ReadFifoQueueRequest { .. } => (0x18, "ModbusPDUReadFifoQueueRequest"),
            Pdu::ReadFifoQueueResponse { .. } => (0x18, "ModbusPDUReadFifoQueueResponse"),
            Pdu::ReadFileRecordRequest { .. } => (0x14, "ModbusPDUReadFileRecordRequest"),
            Pdu::ReadFileRecordResponse { .. } => (0x14, "ModbusPDUReadFileRecordResponse"),
            Pdu::WriteFileRecordRequest { .. } => (0x15, "ModbusPDUWriteFileRecordRequest"),
            Pdu::WriteFileRecordResponse { .. } => (0x15, "ModbusPDUWriteFileRecordResponse"),
            Pdu::ReadExceptionStatusRequest => (0x07, "ModbusPDUReadExceptionStatusRequest"),
            Pdu::ReadExceptionStatusResponse { .. } => {
                (0x07, "ModbusPDUReadExceptionStatusResponse")
            }
            Pdu::DiagnosticRequest { .. } => (0x08, "ModbusPDUDiagnosticRequest"),
            Pdu::DiagnosticResponse { .. } => (0x08, "ModbusPDUDiagnosticResponse"),
            Pdu::GetComEventCounterRequest => (0x0B, "ModbusPDUGetComEventCounterRequest"),
            Pdu::GetComEventCounterResponse { .. } => {
                (0x0B, "ModbusPDUGetComEventCounterResponse")
            }
            Pdu::GetComEventLogRequest => (0x0C, "ModbusPDUGetComEventLogRequest"),
            Pdu::GetComEventLogResponse { .. } => (0x0C, "ModbusPDUGetComEventLogResponse"),
            Pdu::ReportServerIdRequest => (0x11, "ModbusPDUReportServerIdRequest"),
            Pdu::ReportServerIdResponse { .. } => (0x11, "ModbusPDUReportServerIdResponse"),
            Pdu::ReadDeviceIdentificationRequest { .. } => {
                (0x2B, "ModbusPDUReadDeviceIdentificationRequest")
            }
            Pdu::ReadDeviceIdentificationResponse { .. } => {
                (0x2B, "ModbusPDUReadDeviceIdentificationResponse")
            }
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            Pdu::Error { .. } => 8,
            Pdu::ReadDiscreteInputsRequest { .. }
            | Pdu::ReadCoilsRequest { .. }
            | Pdu::WriteSingleCoilRequest { .. }
            | Pdu::WriteSingleCoilResponse { .. }
            | Pdu::WriteMultipleCoilsResponse { .. }
            | Pdu::ReadInputRegistersRequest { .. }
            | Pdu::ReadHoldingRegistersRequest { .. }
            | Pdu::WriteSingleRegisterRequest { .. }
            | Pdu::WriteSingleRegisterResponse { .. }
            | Pdu::WriteMultipleHoldingRegistersResponse { .. }
            | Pdu::DiagnosticRequest { .. }
            | Pdu::DiagnosticResponse { .. }
            | Pdu::GetComEventCounterResponse { .. } => 32,
            Pdu::ReadDiscreteInputsResponse { value }
            | Pdu::ReadCoilsResponse { value }
            | Pdu::ReadInputRegistersResponse { value }
            | Pdu::ReadHoldingRegistersResponse { value }
            | Pdu::ReadWriteMultipleHoldingRegistersResponse { value }
            | Pdu::ReportServerIdResponse { value } => 8 + value.len() * 8,
            Pdu::WriteMultipleCoilsRequest { value, .. }
            | Pdu::WriteMultipleHoldingRegistersRequest { value, .. } => 32 + 8 + value.len() * 8,
            Pdu::ReadWriteMultipleHoldingRegistersRequest { value, .. } => {
                64 + 8 + value.len() * 8
            }
            Pdu::MaskWriteHoldingRegisterRequest { .. }
            | Pdu::MaskWriteHoldingRegisterResponse { .. } => 48,
            Pdu::ReadFifoQueueRequest { .. } => 16,
            Pdu::ReadFifoQueueResponse { fifo_value } => 16 + 16 + fifo_value.len() * 16,
            Pdu::ReadFileRecordRequest { items } => 8 + array_length_in_bits(items),
            Pdu::ReadFileRecordResponse { items } => 8 + array_length_in_bits(items),
            Pdu::WriteFileRecordRequest { items } => 8 + array_length_in_bits(items),
            Pdu::WriteFileRecordResponse { items } => 8 + array_length_in_bits(items),
            Pdu::ReadExceptionStatusRequest
            | Pdu::GetComEventCounterRequest
            | Pdu::GetComEventLogRequest
            | Pdu::ReportServerIdRequest => 0,
            Pdu::ReadExceptionStatusResponse { .. } => 8,
            Pdu::GetComEventLogResponse { events, .. } => 8 + 48 + events.len() * 8,
            Pdu::ReadDeviceIdentificationRequest { .. } => 24,
            Pdu::ReadDeviceIdentificationResponse { objects, .. } => {
                8 + 8 + 1 + 7 + 8 + 8 + 8 + array_length_in_bits(objects)
            }
        }
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        match self {
            Pdu::Error { exception_code, .. } => write_enum(wb, "exceptionCode", *exception_code),
            Pdu::ReadDiscreteInputsRequest {
                starting_address,
                quantity,
            }
            | Pdu::ReadCoilsRequest {
                starting_address,
                quantity,
            }
            | Pdu::WriteMultipleCoilsResponse {
                starting_address,
                quantity,
            }
            | Pdu::ReadInputRegistersRequest {
                starting_address,
                quantity,
            }
            | Pdu::ReadHoldingRegistersRequest {
                starting_address,
                quantity,
            }
            | Pdu::WriteMultipleHoldingRegistersResponse {
                starting_address,
                quantity,
            } => {
                wb.write_u16("startingAddress", 16, *starting_address)?;
                wb.write_u16("quantity", 16, *quantity)
            }
            Pdu::ReadDiscreteInputsResponse { value }
            | Pdu::ReadCoilsResponse { value }
            | Pdu::ReadInputRegistersResponse { value }
            | Pdu::ReadHoldingRegistersResponse { value }
            | Pdu::ReadWriteMultipleHoldingRegistersResponse { value }
            | Pdu::ReportServerIdResponse { value } => write_counted_bytes(wb, value),
            Pdu::WriteSingleCoilRequest { address, value }
            | Pdu::WriteSingleCoilResponse { address, value }
            | Pdu::WriteSingleRegisterRequest { address, value }
            | Pdu::WriteSingleRegisterResponse { address, value } => {
                wb.write_u16("address", 16, *address)?;
                wb.write_u16("value", 16, *value)
            }
            Pdu::WriteMultipleCoilsRequest {
                starting_address,
                quantity,
                value,
            }
            | Pdu::WriteMultipleHoldingRegistersRequest {
                starting_address,
                quantity,
                value,
            } => {
                wb.write_u16("startingAddress", 16, *starting_address)?;
                wb.write_u16("quantity", 16, *quantity)?;
                write_counted_bytes(wb, value)
            }
            Pdu::ReadWriteMultipleHoldingRegistersRequest {
                read_starting_address,
                read_quantity,
                write_starting_address,
                write_quantity,
                value,
            } => {
                wb.write_u16("readStartingAddress", 16, *read_starting_address)?;
                wb.write_u16("readQuantity", 16, *read_quantity)?;
                wb.write_u16("writeStartingAddress", 16, *write_starting_address)?;
                wb.write_u16("writeQuantity", 16, *write_quantity)?;
                write_counted_bytes(wb, value)
            }
            Pdu::MaskWriteHoldingRegisterRequest {
                reference_address,
                and_mask,
                or_mask,
            }
            | Pdu::MaskWriteHoldingRegisterResponse {
                reference_address,
                and_mask,
                or_mask,
            } => {
                wb.write_u16("referenceAddress", 16, *reference_address)?;
                wb.write_u16("andMask", 16, *and_mask)?;
                wb.write_u16("orMask", 16, *or_mask)
            }
            Pdu::ReadFifoQueueRequest {
                fifo_pointer_address,
            } => wb.write_u16("fifoPointerAddress", 16, *fifo_pointer_address),
            Pdu::ReadFifoQueueResponse { fifo_value } => {
                let byte_count: u16 = implicit_length("byteCount", fifo_value.len() * 2 + 2)?;
                wb.write_u16("byteCount", 16, byte_count)?;
                let fifo_count: u16 = implicit_length("fifoCount", fifo_value.len())?;
                wb.write_u16("fifoCount", 16, fifo_count)?;
                write_array(wb, "fifoValue", fifo_value, |wb, value| {
                    wb.write_u16("value", 16, *value)
                })
            }
            Pdu::ReadFileRecordRequest { items } => write_item_list(wb, items),
            Pdu::ReadFileRecordResponse { items } => write_item_list(wb, items),
            Pdu::WriteFileRecordRequest { items } => write_item_list(wb, items),
            Pdu::WriteFileRecordResponse { items } => write_item_list(wb, items),
            Pdu::ReadExceptionStatusRequest
            | Pdu::GetComEventCounterRequest
            | Pdu::GetComEventLogRequest
            | Pdu::ReportServerIdRequest => Ok(()),
            Pdu::ReadExceptionStatusResponse { value } => wb.write_u8("value", 8, *value),
            Pdu::DiagnosticRequest { sub_function, data }
            | Pdu::DiagnosticResponse { sub_function, data } => {
                wb.write_u16("subFunction", 16, *sub_function)?;
                wb.write_u16("data", 16, *data)
            }
            Pdu::GetComEventCounterResponse {
                status,
                event_count,
            } => {
                wb.write_u16("status", 16, *status)?;
                wb.write_u16("eventCount", 16, *event_count)
            }
            Pdu::GetComEventLogResponse {
                status,
                event_count,
                message_count,
                events,
            } => {
                let byte_count: u8 = implicit_length("byteCount", events.len() + 6)?;
                wb.write_u8("byteCount", 8, byte_count)?;
                wb.write_u16("status", 16, *status)?;
                wb.write_u16("eventCount", 16, *event_count)?;
                wb.write_u16("messageCount", 16, *message_count)?;
                wb.write_byte_array("events", events)
            }
            Pdu::ReadDeviceIdentificationRequest { level, object_id } => {
                write_const(wb, "meiType", 8, u64::from(MEI_TYPE_DEVICE_IDENTIFICATION))?;
                write_enum(wb, "level", *level)?;
                wb.write_u8("objectId", 8, *object_id)
            }
            Pdu::ReadDeviceIdentificationResponse {
                level,
                individual_access,
                conformity_level,
                more_follows,
                next_object_id,
                objects,
            } => {
                write_const(wb, "meiType", 8, u64::from(MEI_TYPE_DEVICE_IDENTIFICATION))?;
                write_enum(wb, "level", *level)?;
                wb.write_bit("individualAccess", *individual_access)?;
                write_enum(wb, "conformityLevel", *conformity_level)?;
                write_enum(wb, "moreFollows", *more_follows)?;
                wb.write_u8("nextObjectId", 8, *next_object_id)?;
                let number_of_objects: u8 = implicit_length("numberOfObjects", objects.len())?;
                wb.write_u8("numberOfObjects", 8, number_of_objects)?;
                write_array(wb, "objects", objects, |wb, object| object.serialize(wb))
            }
        }
    }
}

fn write_counted_bytes(wb: &mut dyn WriteBuffer, value: &[u8]) -> Result<()> {
    let byte_count: u8 = implicit_length("byteCount", value.len())?;
    wb.write_u8("byteCount", 8, byte_count)?;
    wb.write_byte_array("value", value)
}

fn read_counted_bytes(rb: &mut dyn ReadBuffer) -> Result<Vec<u8>> {
    let byte_count = rb.read_u8("byteCount", 8)?;
    rb.read_byte_array("value", usize::from(byte_count))
}

fn write_item_list<T: Message>(wb: &mut dyn WriteBuffer, items: &[T]) -> Result<()> {
    let byte_count: u8 = implicit_length("byteCount", array_length_in_bits(items) / 8)?;
    wb.write_u8("byteCount", 8, byte_count)?;
    write_array(wb, "items", items, |wb, item| item.serialize(wb))
}

fn read_item_list<T: Parse<Args = ()>>(rb: &mut dyn ReadBuffer) -> Result<Vec<T>> {
    let byte_count = rb.read_u8("byteCount", 8)?;
    read_length_array(rb, "items", usize::from(byte_count), |rb| T::parse(rb, ()))
}

fn read_address_quantity(rb: &mut dyn ReadBuffer) -> Result<(u16, u16)> {
    Ok((
        rb.read_u16("startingAddress", 16)?,
        rb.read_u16("quantity", 16)?,
    ))
}

fn read_address_value(rb: &mut dyn ReadBuffer) -> Result<(u16, u16)> {
    Ok((rb.read_u16("address", 16)?, rb.read_u16("value", 16)?))
}

fn read_masks(rb: &mut dyn ReadBuffer) -> Result<(u16, u16, u16)> {
    Ok((
        rb.read_u16("referenceAddress", 16)?,
        rb.read_u16("andMask", 16)?,
        rb.read_u16("orMask", 16)?,
    ))
}

fn read_diagnostic(rb: &mut dyn ReadBuffer) -> Result<(u16, u16)> {
    Ok((rb.read_u16("subFunction", 16)?, rb.read_u16("data", 16)?))
}

impl Message for ModbusPdu {
    fn type_name(&self) -> &'static str {
        "ModbusPDU"
    }

    fn length_in_bits(&self) -> usize {
        1 + 7 + self.own_length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ModbusPDU", ContextKind::Element)?;
        wb.write_bit("errorFlag", self.error_flag())?;
        wb.write_u8("functionFlag", 7, self.function_flag())?;
        write_variant(wb, self.variant_name(), |wb| self.serialize_fields(wb))?;
        wb.pop_context("ModbusPDU", ContextKind::Element)
    }
}

impl Parse for ModbusPdu {
    /// `true` when reading a response.
    type Args = bool;

    fn parse(rb: &mut dyn ReadBuffer, response: bool) -> Result<Self> {
        rb.pull_context("ModbusPDU", ContextKind::Element)?;
        let error_flag = rb.read_bit("errorFlag")?;
        let function_flag = rb.read_u8("functionFlag", 7)?;

        let pdu = match (error_flag, function_flag, response) {
            (true, function_flag, _) => read_variant(rb, "ModbusPDUError", |rb| {
                Ok(Pdu::Error {
                    function_flag,
                    exception_code: read_enum(rb, "exceptionCode")?,
                })
            })?,
            (false, 0x02, false) => read_variant(rb, "ModbusPDUReadDiscreteInputsRequest", |rb| {
                let (starting_address, quantity) = read_address_quantity(rb)?;
                Ok(Pdu::ReadDiscreteInputsRequest {
                    starting_address,
                    quantity,
                })
            })?,
            (false, 0x02, true) => read_variant(rb, "ModbusPDUReadDiscreteInputsResponse", |rb| {
                Ok(Pdu::ReadDiscreteInputsResponse {
                    value: read_counted_bytes(rb)?,
                })
            })?,
            (false, 0x01, false) => read_variant(rb, "ModbusPDUReadCoilsRequest", |rb| {
                let (starting_address, quantity) = read_address_quantity(rb)?;
                Ok(Pdu::ReadCoilsRequest {
                    starting_address,
                    quantity,
                })
            })?,
            (false, 0x01, true) => read_variant(rb, "ModbusPDUReadCoilsResponse", |rb| {
                Ok(Pdu::ReadCoilsResponse {
                    value: read_counted_bytes(rb)?,
                })
            })?,
            (false, 0x05, false) => read_variant(rb, "ModbusPDUWriteSingleCoilRequest", |rb| {
                let (address, value) = read_address_value(rb)?;
                Ok(Pdu::WriteSingleCoilRequest { address, value })
            })?,
            (false, 0x05, true) => read_variant(rb, "ModbusPDUWriteSingleCoilResponse", |rb| {
                let (address, value) = read_address_value(rb)?;
                Ok(Pdu::WriteSingleCoilResponse { address, value })
            })?,
            (false, 0x0F, false) => read_variant(rb, "ModbusPDUWriteMultipleCoilsRequest", |rb| {
                let (starting_address, quantity) = read_address_quantity(rb)?;
                Ok(Pdu::WriteMultipleCoilsRequest {
                    starting_address,
                    quantity,
                    value: read_counted_bytes(rb)?,
                })
            })?,
            (false, 0x0F, true) => read_variant(rb, "ModbusPDUWriteMultipleCoilsResponse", |rb| {
                let (starting_address, quantity) = read_address_quantity(rb)?;
                Ok(Pdu::WriteMultipleCoilsResponse {
                    starting_address,
                    quantity,
                })
            })?,
            (false, 0x04, false) => read_variant(rb, "ModbusPDUReadInputRegistersRequest", |rb| {
                let (starting_address, quantity) = read_address_quantity(rb)?;
                Ok(Pdu::ReadInputRegistersRequest {
                    starting_address,
                    quantity,
                })
            })?,
            (false, 0x04, true) => read_variant(rb, "ModbusPDUReadInputRegistersResponse", |rb| {
                Ok(Pdu::ReadInputRegistersResponse {
                    value: read_counted_bytes(rb)?,
                })
            })?,
            (false, 0x03, false) => {
                read_variant(rb, "ModbusPDUReadHoldingRegistersRequest", |rb| {
                    let (starting_address, quantity) = read_address_quantity(rb)?;
                    Ok(Pdu::ReadHoldingRegistersRequest {
                        starting_address,
                        quantity,
                    })
                })?
            }
            (false, 0x03, true) => {
                read_variant(rb, "ModbusPDUReadHoldingRegistersResponse", |rb| {
                    Ok(Pdu::ReadHoldingRegistersResponse {
                        value: read_counted_bytes(rb)?,
                    })
                })?
            }
            (false, 0x06, false) => read_variant(rb, "ModbusPDUWriteSingleRegisterRequest", |rb| {
                let (address, value) = read_address_value(rb)?;
                Ok(Pdu::WriteSingleRegisterRequest { address, value })
            })?,
            (false, 0x06, true) => {
                read_variant(rb, "ModbusPDUWriteSingleRegisterResponse", |rb| {
                    let (address, value) = read_address_value(rb)?;
                    Ok(Pdu::WriteSingleRegisterResponse { address, value })
                })?
            }
            (false, 0x10, false) => {
                read_variant(rb, "ModbusPDUWriteMultipleHoldingRegistersRequest", |rb| {
                    let (starting_address, quantity) = read_address_quantity(rb)?;
                    Ok(Pdu::WriteMultipleHoldingRegistersRequest {
                        starting_address,
                        quantity,
                        value: read_counted_bytes(rb)?,
                    })
                })?
            }
            (false, 0x10, true) => {
                read_variant(rb, "ModbusPDUWriteMultipleHoldingRegistersResponse", |rb| {
                    let (starting_address, quantity) = read_address_quantity(rb)?;
                    Ok(Pdu::WriteMultipleHoldingRegistersResponse {
                        starting_address,
                        quantity,
                    })
                })?
            }
            (false, 0x17, false) => {
                read_variant(rb, "ModbusPDUReadWriteMultipleHoldingRegistersRequest", |rb| {
                    Ok(Pdu::ReadWriteMultipleHoldingRegistersRequest {
                        read_starting_address: rb.read_u16("readStartingAddress", 16)?,
                        read_quantity: rb.read_u16("readQuantity", 16)?,
                        write_starting_address: rb.read_u16("writeStartingAddress", 16)?,
                        write_quantity: rb.read_u16("writeQuantity", 16)?,
                        value: read_counted_bytes(rb)?,
                    })
                })?
            }
            (false, 0x17, true) => {
                read_variant(rb, "ModbusPDUReadWriteMultipleHoldingRegistersResponse", |rb| {
                    Ok(Pdu::ReadWriteMultipleHoldingRegistersResponse {
                        value: read_counted_bytes(rb)?,
                    })
                })?
            }
            (false, 0x16, false) => {
                read_variant(rb, "ModbusPDUMaskWriteHoldingRegisterRequest", |rb| {
                    let (reference_address, and_mask, or_mask) = read_masks(rb)?;
                    Ok(Pdu::MaskWriteHoldingRegisterRequest {
                        reference_address,
                        and_mask,
                        or_mask,
                    })
                })?
            }
            (false, 0x16, true) => {
                read_variant(rb, "ModbusPDUMaskWriteHoldingRegisterResponse", |rb| {
                    let (reference_address, and_mask, or_mask) = read_masks(rb)?;
                    Ok(Pdu::MaskWriteHoldingRegisterResponse {
                        reference_address,
                        and_mask,
                        or_mask,
                    })
                })?
            }
            (false, 0x18, false) => read_variant(rb, "ModbusPDUReadFifoQueueRequest", |rb| {
                Ok(Pdu::ReadFifoQueueRequest {
                    fifo_pointer_address: rb.read_u16("fifoPointerAddress", 16)?,
                })
            })?,
            (false, 0x18, true) => read_variant(rb, "ModbusPDUReadFifoQueueResponse", |rb| {
                let _byte_count = rb.read_u16("byteCount", 16)?;
                let fifo_count = rb.read_u16("fifoCount", 16)?;
                let fifo_value = read_count_array(rb, "fifoValue", usize::from(fifo_count), |rb| {
                    rb.read_u16("value", 16)
                })?;
                Ok(Pdu::ReadFifoQueueResponse { fifo_value })
            })?,
            (false, 0x14, false) => read_variant(rb, "ModbusPDUReadFileRecordRequest", |rb| {
                Ok(Pdu::ReadFileRecordRequest {
                    items: read_item_list(rb)?,
                })
            })?,
            (false, 0x14, true) => read_variant(rb, "ModbusPDUReadFileRecordResponse", |rb| {
                Ok(Pdu::ReadFileRecordResponse {
                    items: read_item_list(rb)?,
                })
            })?,
            (false, 0x15, false) => read_variant(rb, "ModbusPDUWriteFileRecordRequest", |rb| {
                Ok(Pdu::WriteFileRecordRequest {
                    items: read_item_list(rb)?,
                })
            })?,
            (false, 0x15, true) => read_variant(rb, "ModbusPDUWriteFileRecordResponse", |rb| {
                Ok(Pdu::WriteFileRecordResponse {
                    items: read_item_list(rb)?,
                })
            })?,
            (false, 0x07, false) => read_variant(rb, "ModbusPDUReadExceptionStatusRequest", |_| {
                Ok(Pdu::ReadExceptionStatusRequest)
            })?,
            (false, 0x07, true) => {
                read_variant(rb, "ModbusPDUReadExceptionStatusResponse", |rb| {
                    Ok(Pdu::ReadExceptionStatusResponse {
                        value: rb.read_u8("value", 8)?,
                    })
                })?
            }
            (false, 0x08, false) => read_variant(rb, "ModbusPDUDiagnosticRequest", |rb| {
                let (sub_function, data) = read_diagnostic(rb)?;
                Ok(Pdu::DiagnosticRequest { sub_function, data })
            })?,
            (false, 0x08, true) => read_variant(rb, "ModbusPDUDiagnosticResponse", |rb| {
                let (sub_function, data) = read_diagnostic(rb)?;
                Ok(Pdu::DiagnosticResponse { sub_function, data })
            })?,
            (false, 0x0B, false) => read_variant(rb, "ModbusPDUGetComEventCounterRequest", |_| {
                Ok(Pdu::GetComEventCounterRequest)
            })?,
            (false, 0x0B, true) => {
                read_variant(rb, "ModbusPDUGetComEventCounterResponse", |rb| {
                    Ok(Pdu::GetComEventCounterResponse {
                        status: rb.read_u16("status", 16)?,
                        event_count: rb.read_u16("eventCount", 16)?,
                    })
                })?
            }
            (false, 0x0C, false) => read_variant(rb, "ModbusPDUGetComEventLogRequest", |_| {
                Ok(Pdu::GetComEventLogRequest)
            })?,
            (false, 0x0C, true) => read_variant(rb, "ModbusPDUGetComEventLogResponse", |rb| {
                let byte_count = rb.read_u8("byteCount", 8)?;
                let status = rb.read_u16("status", 16)?;
                let event_count = rb.read_u16("eventCount", 16)?;
                let message_count = rb.read_u16("messageCount", 16)?;
                let events_length = usize::from(byte_count)
                    .checked_sub(6)
                    .ok_or_else(|| {
                        CodecError::invalid_value(format!("byte count {byte_count} below 6"))
                    })
                    .parsing("byteCount")?;
                Ok(Pdu::GetComEventLogResponse {
                    status,
                    event_count,
                    message_count,
                    events: rb.read_byte_array("events", events_length)?,
                })
            })?,
            (false, 0x11, false) => read_variant(rb, "ModbusPDUReportServerIdRequest", |_| {
                Ok(Pdu::ReportServerIdRequest)
            })?,
            (false, 0x11, true) => read_variant(rb, "ModbusPDUReportServerIdResponse", |rb| {
                Ok(Pdu::ReportServerIdResponse {
                    value: read_counted_bytes(rb)?,
                })
            })?,
            (false, 0x2B, false) => {
                read_variant(rb, "ModbusPDUReadDeviceIdentificationRequest", |rb| {
                    read_const(rb, "meiType", 8, u64::from(MEI_TYPE_DEVICE_IDENTIFICATION))?;
                    Ok(Pdu::ReadDeviceIdentificationRequest {
                        level: read_enum(rb, "level")?,
                        object_id: rb.read_u8("objectId", 8)?,
                    })
                })?
            }
            (false, 0x2B, true) => {
                read_variant(rb, "ModbusPDUReadDeviceIdentificationResponse", |rb| {
                    read_const(rb, "meiType", 8, u64::from(MEI_TYPE_DEVICE_IDENTIFICATION))?;
                    let level = read_enum(rb, "level")?;
                    let individual_access = rb.read_bit("individualAccess")?;
                    let conformity_level = read_enum(rb, "conformityLevel")?;
                    let more_follows = read_enum(rb, "moreFollows")?;
                    let next_object_id = rb.read_u8("nextObjectId", 8)?;
                    let number_of_objects = rb.read_u8("numberOfObjects", 8)?;
                    let objects =
                        read_count_array(rb, "objects", usize::from(number_of_objects), |rb| {
                            ModbusDeviceInformationObject::parse(rb, ())
                        })?;
                    Ok(Pdu::ReadDeviceIdentificationResponse {
                        level,
                        individual_access,
                        conformity_level,
                        more_follows,
                        next_object_id,
                        objects,
                    })
                })?
            }
            (false, function_flag, response) => {
                return Err(CodecError::unsupported(
                    "ModbusPDU",
                    format!(
                        "errorFlag=false functionFlag=0x{function_flag:02X} response={response}"
                    ),
                ))
            }
        };
        rb.close_context("ModbusPDU", ContextKind::Element)?;
        Ok(pdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modbus::types::WriteFileRecordItem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_coils_request_dispatch() {
        let bytes = [0x01, 0x00, 0x13, 0x00, 0x25];
        let pdu = ModbusPdu::from_bytes(&bytes, false).unwrap();
        assert_eq!(
            pdu,
            ModbusPdu::ReadCoilsRequest {
                starting_address: 0x0013,
                quantity: 0x0025,
            }
        );
        assert_eq!(pdu.to_bytes().unwrap(), bytes.to_vec());
        assert_eq!(pdu.response(), Some(false));
    }

    #[test]
    fn test_direction_selects_variant() {
        let bytes = [0x01, 0x03, 0xCD, 0x6B, 0x05];
        let pdu = ModbusPdu::from_bytes(&bytes, true).unwrap();
        assert_eq!(
            pdu,
            ModbusPdu::ReadCoilsResponse {
                value: vec![0xCD, 0x6B, 0x05]
            }
        );
        assert_eq!(pdu.response(), Some(true));
    }

    #[test]
    fn test_exception_response() {
        let bytes = [0x83, 0x02];
        let pdu = ModbusPdu::from_bytes(&bytes, true).unwrap();
        assert_eq!(
            pdu,
            ModbusPdu::Error {
                function_flag: 0x03,
                exception_code: ModbusErrorCode::IllegalDataAddress,
            }
        );
        assert!(pdu.error_flag());
        assert_eq!(pdu.response(), None);
        assert_eq!(pdu.to_bytes().unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_unknown_function_code() {
        let err = ModbusPdu::from_bytes(&[0x42], false).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedVariant {
                type_name: "ModbusPDU",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_write_file_record() {
        let pdu = ModbusPdu::from_bytes(&[0x15, 0x00], false).unwrap();
        assert_eq!(pdu, ModbusPdu::WriteFileRecordRequest { items: vec![] });
        assert_eq!(pdu.to_bytes().unwrap(), vec![0x15, 0x00]);
    }

    #[test]
    fn test_write_file_record_byte_count() {
        let pdu = ModbusPdu::WriteFileRecordRequest {
            items: vec![WriteFileRecordRequestItem(WriteFileRecordItem {
                reference_type: 6,
                file_number: 4,
                record_number: 7,
                record_data: vec![0x06, 0xAF, 0x04, 0xBE, 0x10, 0x0D],
            })],
        };
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(
            bytes,
            hex::decode("150d0600040007000306af04be100d").unwrap()
        );
        assert_eq!(ModbusPdu::from_bytes(&bytes, false).unwrap(), pdu);
    }

    #[test]
    fn test_fifo_queue_response() {
        let pdu = ModbusPdu::ReadFifoQueueResponse {
            fifo_value: vec![0x01B8, 0x1284],
        };
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(bytes, vec![0x18, 0x00, 0x06, 0x00, 0x02, 0x01, 0xB8, 0x12, 0x84]);
        assert_eq!(ModbusPdu::from_bytes(&bytes, true).unwrap(), pdu);
    }

    #[test]
    fn test_device_identification_response() {
        let pdu = ModbusPdu::ReadDeviceIdentificationResponse {
            level: ModbusDeviceInformationLevel::Basic,
            individual_access: false,
            conformity_level: ModbusDeviceInformationConformityLevel::BasicStreamOnly,
            more_follows: ModbusDeviceInformationMoreFollows::NoMoreObjectsAvailable,
            next_object_id: 0,
            objects: vec![ModbusDeviceInformationObject {
                object_id: 0,
                data: b"ACME".to_vec(),
            }],
        };
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(&bytes[..8], &[0x2B, 0x0E, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(bytes.len() * 8, pdu.length_in_bits());
        assert_eq!(ModbusPdu::from_bytes(&bytes, true).unwrap(), pdu);

        let xml = pdu.to_xml().unwrap();
        assert!(xml.contains("stringRepresentation=\"BASIC_STREAM_ONLY\""));
        assert_eq!(ModbusPdu::from_xml(&xml, true).unwrap(), pdu);
    }

    #[test]
    fn test_wrong_mei_type() {
        let err = ModbusPdu::from_bytes(&[0x2B, 0x0D, 0x01, 0x00], false).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'meiType'"));
    }

    #[test]
    fn test_byte_count_overflow() {
        let pdu = ModbusPdu::ReadHoldingRegistersResponse {
            value: vec![0; 256],
        };
        let err = pdu.to_bytes().unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'byteCount'"));
    }
}
