//! Modbus value sets and the repeated items of file record and device
//! identification services.

use strum::{FromRepr, IntoStaticStr};

use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{implicit_length, wire_enum};
use crate::message::{Message, Parse};

/// Exception code of an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ModbusErrorCode {
    /// Function code not supported.
    IllegalFunction = 1,
    /// Address outside the device's range.
    IllegalDataAddress = 2,
    /// Value not accepted.
    IllegalDataValue = 3,
    /// Unrecoverable device error.
    SlaveDeviceFailure = 4,
    /// Accepted, processing takes longer.
    Acknowledge = 5,
    /// Device busy, retry later.
    SlaveDeviceBusy = 6,
    /// Programming function rejected.
    NegativeAcknowledge = 7,
    /// Extended file area parity error.
    MemoryParityError = 8,
    /// Gateway has no path to the target.
    GatewayPathUnavailable = 10,
    /// Target behind the gateway did not answer.
    GatewayTargetDeviceFailedToRespond = 11,
}
wire_enum!(ModbusErrorCode, u8, 8);

/// Read device identification access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ModbusDeviceInformationLevel {
    /// Vendor name, product code, revision.
    Basic = 0x01,
    /// Basic plus optional standard objects.
    Regular = 0x02,
    /// Regular plus private objects.
    Extended = 0x03,
    /// A single object.
    Individual = 0x04,
}
wire_enum!(ModbusDeviceInformationLevel, u8, 8);

/// Identification conformity level of a device, seven bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ModbusDeviceInformationConformityLevel {
    #[allow(missing_docs)]
    BasicStreamOnly = 0x01,
    #[allow(missing_docs)]
    RegularStreamOnly = 0x02,
    #[allow(missing_docs)]
    ExtendedStreamOnly = 0x03,
}
wire_enum!(ModbusDeviceInformationConformityLevel, u8, 7);

/// Whether another identification transaction is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ModbusDeviceInformationMoreFollows {
    #[allow(missing_docs)]
    NoMoreObjectsAvailable = 0x00,
    #[allow(missing_docs)]
    MoreObjectsAvailable = 0xFF,
}
wire_enum!(ModbusDeviceInformationMoreFollows, u8, 8);

/// Sub-request of a read file record request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadFileRecordRequestItem {
    /// Always `6`.
    pub reference_type: u8,
    /// File number.
    pub file_number: u16,
    /// Starting record.
    pub record_number: u16,
    /// Number of registers to read.
    pub record_length: u16,
}

impl Message for ReadFileRecordRequestItem {
    fn type_name(&self) -> &'static str {
        "ModbusPDUReadFileRecordRequestItem"
    }

    fn length_in_bits(&self) -> usize {
        8 + 16 + 16 + 16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context(self.type_name(), ContextKind::Element)?;
        wb.write_u8("referenceType", 8, self.reference_type)?;
        wb.write_u16("fileNumber", 16, self.file_number)?;
        wb.write_u16("recordNumber", 16, self.record_number)?;
        wb.write_u16("recordLength", 16, self.record_length)?;
        wb.pop_context(self.type_name(), ContextKind::Element)
    }
}

impl Parse for ReadFileRecordRequestItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ModbusPDUReadFileRecordRequestItem", ContextKind::Element)?;
        let item = Self {
            reference_type: rb.read_u8("referenceType", 8)?,
            file_number: rb.read_u16("fileNumber", 16)?,
            record_number: rb.read_u16("recordNumber", 16)?,
            record_length: rb.read_u16("recordLength", 16)?,
        };
        rb.close_context("ModbusPDUReadFileRecordRequestItem", ContextKind::Element)?;
        Ok(item)
    }
}

/// Sub-response of a read file record response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadFileRecordResponseItem {
    /// Always `6`.
    pub reference_type: u8,
    /// Record content.
    pub data: Vec<u8>,
}

impl Message for ReadFileRecordResponseItem {
    fn type_name(&self) -> &'static str {
        "ModbusPDUReadFileRecordResponseItem"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + self.data.len() * 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context(self.type_name(), ContextKind::Element)?;
        let data_length: u8 = implicit_length("dataLength", self.data.len() + 1)?;
        wb.write_u8("dataLength", 8, data_length)?;
        wb.write_u8("referenceType", 8, self.reference_type)?;
        wb.write_byte_array("data", &self.data)?;
        wb.pop_context(self.type_name(), ContextKind::Element)
    }
}

impl Parse for ReadFileRecordResponseItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ModbusPDUReadFileRecordResponseItem", ContextKind::Element)?;
        let data_length = rb.read_u8("dataLength", 8)?;
        let reference_type = rb.read_u8("referenceType", 8)?;
        let count = usize::from(data_length)
            .checked_sub(1)
            .ok_or_else(|| CodecError::invalid_value("data length must cover the reference type"))
            .parsing("dataLength")?;
        let data = rb.read_byte_array("data", count)?;
        rb.close_context("ModbusPDUReadFileRecordResponseItem", ContextKind::Element)?;
        Ok(Self {
            reference_type,
            data,
        })
    }
}

/// Sub-request of a write file record request, echoed in the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WriteFileRecordItem {
    /// Always `6`.
    pub reference_type: u8,
    /// File number.
    pub file_number: u16,
    /// Starting record.
    pub record_number: u16,
    /// Register content, an even number of bytes.
    pub record_data: Vec<u8>,
}

impl WriteFileRecordItem {
    fn serialize_as(&self, wb: &mut dyn WriteBuffer, type_name: &str) -> Result<()> {
        if self.record_data.len() % 2 != 0 {
            return Err(CodecError::invalid_value(format!(
                "{} record bytes do not form whole registers",
                self.record_data.len()
            )))
            .serializing("recordData");
        }
        wb.push_context(type_name, ContextKind::Element)?;
        wb.write_u8("referenceType", 8, self.reference_type)?;
        wb.write_u16("fileNumber", 16, self.file_number)?;
        wb.write_u16("recordNumber", 16, self.record_number)?;
        let record_length: u16 = implicit_length("recordLength", self.record_data.len() / 2)?;
        wb.write_u16("recordLength", 16, record_length)?;
        wb.write_byte_array("recordData", &self.record_data)?;
        wb.pop_context(type_name, ContextKind::Element)
    }

    fn parse_as(rb: &mut dyn ReadBuffer, type_name: &str) -> Result<Self> {
        rb.pull_context(type_name, ContextKind::Element)?;
        let reference_type = rb.read_u8("referenceType", 8)?;
        let file_number = rb.read_u16("fileNumber", 16)?;
        let record_number = rb.read_u16("recordNumber", 16)?;
        let record_length = rb.read_u16("recordLength", 16)?;
        let record_data = rb.read_byte_array("recordData", usize::from(record_length) * 2)?;
        rb.close_context(type_name, ContextKind::Element)?;
        Ok(Self {
            reference_type,
            file_number,
            record_number,
            record_data,
        })
    }

    fn length_in_bits(&self) -> usize {
        8 + 16 + 16 + 16 + self.record_data.len() * 8
    }
}

/// [`WriteFileRecordItem`] as carried by the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WriteFileRecordRequestItem(pub WriteFileRecordItem);

/// [`WriteFileRecordItem`] as echoed by the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WriteFileRecordResponseItem(pub WriteFileRecordItem);

impl Message for WriteFileRecordRequestItem {
    fn type_name(&self) -> &'static str {
        "ModbusPDUWriteFileRecordRequestItem"
    }

    fn length_in_bits(&self) -> usize {
        self.0.length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        self.0.serialize_as(wb, self.type_name())
    }
}

impl Parse for WriteFileRecordRequestItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        WriteFileRecordItem::parse_as(rb, "ModbusPDUWriteFileRecordRequestItem").map(Self)
    }
}

impl Message for WriteFileRecordResponseItem {
    fn type_name(&self) -> &'static str {
        "ModbusPDUWriteFileRecordResponseItem"
    }

    fn length_in_bits(&self) -> usize {
        self.0.length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        self.0.serialize_as(wb, self.type_name())
    }
}

impl Parse for WriteFileRecordResponseItem {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        WriteFileRecordItem::parse_as(rb, "ModbusPDUWriteFileRecordResponseItem").map(Self)
    }
}

/// One identification object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModbusDeviceInformationObject {
    /// Object id: `0x00` vendor name, `0x01` product code, ...
    pub object_id: u8,
    /// Object value, usually ASCII.
    pub data: Vec<u8>,
}

impl Message for ModbusDeviceInformationObject {
    fn type_name(&self) -> &'static str {
        "ModbusDeviceInformationObject"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + self.data.len() * 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context(self.type_name(), ContextKind::Element)?;
        wb.write_u8("objectId", 8, self.object_id)?;
        let object_length: u8 = implicit_length("objectLength", self.data.len())?;
        wb.write_u8("objectLength", 8, object_length)?;
        wb.write_byte_array("data", &self.data)?;
        wb.pop_context(self.type_name(), ContextKind::Element)
    }
}

impl Parse for ModbusDeviceInformationObject {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ModbusDeviceInformationObject", ContextKind::Element)?;
        let object_id = rb.read_u8("objectId", 8)?;
        let object_length = rb.read_u8("objectLength", 8)?;
        let data = rb.read_byte_array("data", usize::from(object_length))?;
        rb.close_context("ModbusDeviceInformationObject", ContextKind::Element)?;
        Ok(Self { object_id, data })
    }
}
