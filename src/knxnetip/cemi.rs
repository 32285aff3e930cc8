//! Common External Message Interface frames carried by tunnelling,
//! device configuration and routing messages.

use super::structures::KnxAddress;
use super::types::{Apci, CemiPriority, Tpci};
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    array_length_in_bits, implicit_length, read_const, read_enum, read_fixed_bytes,
    read_length_array, read_simple, read_variant, write_array, write_const, write_enum,
    write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// A cEMI message, keyed by its message code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cemi {
    /// `0x11` L_Data.req.
    LDataReq(LData),
    /// `0x29` L_Data.ind.
    LDataInd(LData),
    /// `0x2E` L_Data.con.
    LDataCon(LData),
    /// `0x2B` L_Busmon.ind.
    LBusmonInd(LBusmon),
    /// `0xFC` M_PropRead.req.
    MPropReadReq(PropertyAccess),
    /// `0xFB` M_PropRead.con.
    MPropReadCon {
        /// Addressed property.
        property: PropertyAccess,
        /// Property value as returned by the device.
        data: Vec<u8>,
    },
    /// `0xF1` M_Reset.req.
    MResetReq,
    /// `0xF0` M_Reset.ind.
    MResetInd,
}

impl Cemi {
    /// Wire discriminator.
    pub fn message_code(&self) -> u8 {
        match self {
            Cemi::LDataReq(_) => 0x11,
            Cemi::LDataInd(_) => 0x29,
            Cemi::LDataCon(_) => 0x2E,
            Cemi::LBusmonInd(_) => 0x2B,
            Cemi::MPropReadReq(_) => 0xFC,
            Cemi::MPropReadCon { .. } => 0xFB,
            Cemi::MResetReq => 0xF1,
            Cemi::MResetInd => 0xF0,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Cemi::LDataReq(_) => "LDataReq",
            Cemi::LDataInd(_) => "LDataInd",
            Cemi::LDataCon(_) => "LDataCon",
            Cemi::LBusmonInd(_) => "LBusmonInd",
            Cemi::MPropReadReq(_) => "MPropReadReq",
            Cemi::MPropReadCon { .. } => "MPropReadCon",
            Cemi::MResetReq => "MResetReq",
            Cemi::MResetInd => "MResetInd",
        }
    }
}

impl Message for Cemi {
    fn type_name(&self) -> &'static str {
        "CEMI"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            Cemi::LDataReq(data) | Cemi::LDataInd(data) | Cemi::LDataCon(data) => {
                data.length_in_bits()
            }
            Cemi::LBusmonInd(busmon) => busmon.length_in_bits(),
            Cemi::MPropReadReq(property) => property.length_in_bits(),
            Cemi::MPropReadCon { property, data } => property.length_in_bits() + data.len() * 8,
            Cemi::MResetReq | Cemi::MResetInd => 0,
        };
        8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("CEMI", ContextKind::Element)?;
        wb.write_u8("messageCode", 8, self.message_code())?;
        write_variant(wb, self.variant_name(), |wb| match self {
            Cemi::LDataReq(data) | Cemi::LDataInd(data) | Cemi::LDataCon(data) => {
                data.serialize_fields(wb)
            }
            Cemi::LBusmonInd(busmon) => busmon.serialize_fields(wb),
            Cemi::MPropReadReq(property) => property.serialize_fields(wb),
            Cemi::MPropReadCon { property, data } => {
                property.serialize_fields(wb)?;
                wb.write_byte_array("data", data)
            }
            Cemi::MResetReq | Cemi::MResetInd => Ok(()),
        })?;
        wb.pop_context("CEMI", ContextKind::Element)
    }
}

impl Parse for Cemi {
    /// Size of the whole cEMI message in bytes, known from the enclosing frame.
    type Args = u16;

    fn parse(rb: &mut dyn ReadBuffer, size: u16) -> Result<Self> {
        rb.pull_context("CEMI", ContextKind::Element)?;
        let message_code = rb.read_u8("messageCode", 8)?;
        let value = match message_code {
            0x11 => read_variant(rb, "LDataReq", |rb| LData::parse_fields(rb).map(Cemi::LDataReq))?,
            0x29 => read_variant(rb, "LDataInd", |rb| LData::parse_fields(rb).map(Cemi::LDataInd))?,
            0x2E => read_variant(rb, "LDataCon", |rb| LData::parse_fields(rb).map(Cemi::LDataCon))?,
            0x2B => read_variant(rb, "LBusmonInd", |rb| {
                LBusmon::parse_fields(rb).map(Cemi::LBusmonInd)
            })?,
            0xFC => read_variant(rb, "MPropReadReq", |rb| {
                PropertyAccess::parse_fields(rb).map(Cemi::MPropReadReq)
            })?,
            0xFB => read_variant(rb, "MPropReadCon", |rb| {
                let property = PropertyAccess::parse_fields(rb)?;
                let data_length = usize::from(size)
                    .checked_sub(1 + property.length_in_bytes())
                    .ok_or_else(|| {
                        CodecError::invalid_value(format!("cEMI size {size} too small for M_PropRead.con"))
                    })
                    .parsing("data")?;
                let data = rb.read_byte_array("data", data_length)?;
                Ok(Cemi::MPropReadCon { property, data })
            })?,
            0xF1 => read_variant(rb, "MResetReq", |_| Ok(Cemi::MResetReq))?,
            0xF0 => read_variant(rb, "MResetInd", |_| Ok(Cemi::MResetInd))?,
            other => {
                return Err(CodecError::unsupported("CEMI", format!("messageCode=0x{other:02X}")))
            }
        };
        rb.close_context("CEMI", ContextKind::Element)?;
        Ok(value)
    }
}

fn additional_information_length(items: &[CemiAdditionalInformation]) -> usize {
    array_length_in_bits(items) / 8
}

fn write_additional_information(
    wb: &mut dyn WriteBuffer,
    items: &[CemiAdditionalInformation],
) -> Result<()> {
    let length: u8 = implicit_length(
        "additionalInformationLength",
        additional_information_length(items),
    )?;
    wb.write_u8("additionalInformationLength", 8, length)?;
    write_array(wb, "additionalInformation", items, |wb, item| item.serialize(wb))
}

fn read_additional_information(rb: &mut dyn ReadBuffer) -> Result<Vec<CemiAdditionalInformation>> {
    let length = rb.read_u8("additionalInformationLength", 8)?;
    read_length_array(rb, "additionalInformation", usize::from(length), |rb| {
        CemiAdditionalInformation::parse(rb, ())
    })
}

/// Body of the `L_Data` services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LData {
    /// Additional information items preceding the frame.
    pub additional_information: Vec<CemiAdditionalInformation>,
    /// The link layer frame.
    pub data_frame: CemiFrame,
}

impl LData {
    fn length_in_bits(&self) -> usize {
        8 + array_length_in_bits(&self.additional_information) + self.data_frame.length_in_bits()
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        write_additional_information(wb, &self.additional_information)?;
        write_simple(wb, "dataFrame", &self.data_frame)
    }

    fn parse_fields(rb: &mut dyn ReadBuffer) -> Result<Self> {
        let additional_information = read_additional_information(rb)?;
        let data_frame = read_simple(rb, "dataFrame", ())?;
        Ok(Self {
            additional_information,
            data_frame,
        })
    }
}

/// Body of `L_Busmon.ind`: a monitored frame and, for data frames, its checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LBusmon {
    /// Additional information items preceding the frame.
    pub additional_information: Vec<CemiAdditionalInformation>,
    /// The monitored frame.
    pub data_frame: CemiFrame,
    /// Frame checksum, present only for data frames.
    pub crc: Option<u8>,
}

impl LBusmon {
    fn length_in_bits(&self) -> usize {
        let crc = match (self.data_frame.not_ack_frame(), self.crc) {
            (true, Some(_)) => 8,
            _ => 0,
        };
        8 + array_length_in_bits(&self.additional_information)
            + self.data_frame.length_in_bits()
            + crc
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        write_additional_information(wb, &self.additional_information)?;
        write_simple(wb, "dataFrame", &self.data_frame)?;
        match (self.data_frame.not_ack_frame(), self.crc) {
            (false, _) => Ok(()),
            (true, Some(crc)) => wb.write_u8("crc", 8, crc),
            (true, None) => Err(CodecError::invalid_value("data frame requires a checksum"))
                .serializing("crc"),
        }
    }

    fn parse_fields(rb: &mut dyn ReadBuffer) -> Result<Self> {
        let additional_information = read_additional_information(rb)?;
        let data_frame: CemiFrame = read_simple(rb, "dataFrame", ())?;
        let crc = if data_frame.not_ack_frame() {
            Some(rb.read_u8("crc", 8)?)
        } else {
            None
        };
        Ok(Self {
            additional_information,
            data_frame,
            crc,
        })
    }
}

/// Addressing of a device management property access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAccess {
    /// Interface object type.
    pub interface_object_type: u16,
    /// Instance of the interface object.
    pub object_instance: u8,
    /// Property identifier.
    pub property_id: u8,
    /// Number of elements, four bits.
    pub number_of_elements: u8,
    /// First element index, twelve bits.
    pub start_index: u16,
}

impl PropertyAccess {
    fn length_in_bits(&self) -> usize {
        16 + 8 + 8 + 4 + 12
    }

    fn length_in_bytes(&self) -> usize {
        self.length_in_bits() / 8
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.write_u16("interfaceObjectType", 16, self.interface_object_type)?;
        wb.write_u8("objectInstance", 8, self.object_instance)?;
        wb.write_u8("propertyId", 8, self.property_id)?;
        wb.write_u8("numberOfElements", 4, self.number_of_elements)?;
        wb.write_u16("startIndex", 12, self.start_index)
    }

    fn parse_fields(rb: &mut dyn ReadBuffer) -> Result<Self> {
        Ok(Self {
            interface_object_type: rb.read_u16("interfaceObjectType", 16)?,
            object_instance: rb.read_u8("objectInstance", 8)?,
            property_id: rb.read_u8("propertyId", 8)?,
            number_of_elements: rb.read_u8("numberOfElements", 4)?,
            start_index: rb.read_u16("startIndex", 12)?,
        })
    }
}

/// An additional information item in front of a cEMI frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CemiAdditionalInformation {
    /// `0x03` bus monitor status.
    BusmonitorInfo {
        /// Frame error.
        frame_error_flag: bool,
        /// Bit error.
        bit_error_flag: bool,
        /// Parity error.
        parity_error_flag: bool,
        /// Unknown flag.
        unknown_flag: bool,
        /// Frames were lost before this one.
        lost_flag: bool,
        /// Sequence number, three bits.
        sequence_number: u8,
    },
    /// `0x04` relative timestamp in ticks.
    RelativeTimestamp {
        /// Timestamp.
        relative_timestamp: u16,
    },
}

impl CemiAdditionalInformation {
    /// Wire discriminator.
    pub fn additional_information_type(&self) -> u8 {
        match self {
            CemiAdditionalInformation::BusmonitorInfo { .. } => 0x03,
            CemiAdditionalInformation::RelativeTimestamp { .. } => 0x04,
        }
    }
}

impl Message for CemiAdditionalInformation {
    fn type_name(&self) -> &'static str {
        "CEMIAdditionalInformation"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            CemiAdditionalInformation::BusmonitorInfo { .. } => 8 + 8,
            CemiAdditionalInformation::RelativeTimestamp { .. } => 8 + 16,
        };
        8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("CEMIAdditionalInformation", ContextKind::Element)?;
        wb.write_u8("additionalInformationType", 8, self.additional_information_type())?;
        match *self {
            CemiAdditionalInformation::BusmonitorInfo {
                frame_error_flag,
                bit_error_flag,
                parity_error_flag,
                unknown_flag,
                lost_flag,
                sequence_number,
            } => write_variant(wb, "CEMIAdditionalInformationBusmonitorInfo", |wb| {
                write_const(wb, "len", 8, 1)?;
                wb.write_bit("frameErrorFlag", frame_error_flag)?;
                wb.write_bit("bitErrorFlag", bit_error_flag)?;
                wb.write_bit("parityErrorFlag", parity_error_flag)?;
                wb.write_bit("unknownFlag", unknown_flag)?;
                wb.write_bit("lostFlag", lost_flag)?;
                wb.write_u8("sequenceNumber", 3, sequence_number)
            })?,
            CemiAdditionalInformation::RelativeTimestamp { relative_timestamp } => {
                write_variant(wb, "CEMIAdditionalInformationRelativeTimestamp", |wb| {
                    write_const(wb, "len", 8, 2)?;
                    wb.write_u16("relativeTimestamp", 16, relative_timestamp)
                })?
            }
        }
        wb.pop_context("CEMIAdditionalInformation", ContextKind::Element)
    }
}

impl Parse for CemiAdditionalInformation {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("CEMIAdditionalInformation", ContextKind::Element)?;
        let information_type = rb.read_u8("additionalInformationType", 8)?;
        let value = match information_type {
            0x03 => read_variant(rb, "CEMIAdditionalInformationBusmonitorInfo", |rb| {
                read_const(rb, "len", 8, 1)?;
                Ok(CemiAdditionalInformation::BusmonitorInfo {
                    frame_error_flag: rb.read_bit("frameErrorFlag")?,
                    bit_error_flag: rb.read_bit("bitErrorFlag")?,
                    parity_error_flag: rb.read_bit("parityErrorFlag")?,
                    unknown_flag: rb.read_bit("unknownFlag")?,
                    lost_flag: rb.read_bit("lostFlag")?,
                    sequence_number: rb.read_u8("sequenceNumber", 3)?,
                })
            })?,
            0x04 => read_variant(rb, "CEMIAdditionalInformationRelativeTimestamp", |rb| {
                read_const(rb, "len", 8, 2)?;
                let relative_timestamp = rb.read_u16("relativeTimestamp", 16)?;
                Ok(CemiAdditionalInformation::RelativeTimestamp { relative_timestamp })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "CEMIAdditionalInformation",
                    format!("additionalInformationType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("CEMIAdditionalInformation", ContextKind::Element)?;
        Ok(value)
    }
}

/// A link layer frame. The first octet carries the frame kind bits, which
/// select the body, and the flags shared by every kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CemiFrame {
    /// Set when the frame is not a repetition.
    pub not_repeated: bool,
    /// Frame priority.
    pub priority: CemiPriority,
    /// A layer 2 acknowledgement is requested.
    pub acknowledge_requested: bool,
    /// Confirmation error flag.
    pub error_flag: bool,
    /// Kind specific part.
    pub body: CemiFrameBody,
}

/// Kind specific part of a [`CemiFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CemiFrameBody {
    /// Standard data frame.
    Data(CemiFrameData),
    /// Extended data frame.
    DataExt(CemiFrameDataExt),
    /// Standard polling frame.
    PollingData,
    /// Extended polling frame.
    PollingDataExt,
    /// Acknowledgement. The frame kind bits carry no meaning here and are
    /// kept as read.
    Ack {
        /// Standard frame bit.
        standard_frame: bool,
        /// Polling bit.
        polling: bool,
    },
}

impl CemiFrame {
    /// Standard (not extended) frame.
    pub fn standard_frame(&self) -> bool {
        match self.body {
            CemiFrameBody::Data(_) | CemiFrameBody::PollingData => true,
            CemiFrameBody::DataExt(_) | CemiFrameBody::PollingDataExt => false,
            CemiFrameBody::Ack { standard_frame, .. } => standard_frame,
        }
    }

    /// Polling frame.
    pub fn polling(&self) -> bool {
        match self.body {
            CemiFrameBody::PollingData | CemiFrameBody::PollingDataExt => true,
            CemiFrameBody::Data(_) | CemiFrameBody::DataExt(_) => false,
            CemiFrameBody::Ack { polling, .. } => polling,
        }
    }

    /// Anything but an acknowledgement.
    pub fn not_ack_frame(&self) -> bool {
        !matches!(self.body, CemiFrameBody::Ack { .. })
    }
}

impl Message for CemiFrame {
    fn type_name(&self) -> &'static str {
        "CEMIFrame"
    }

    fn length_in_bits(&self) -> usize {
        let own = match &self.body {
            CemiFrameBody::Data(data) => data.length_in_bits(),
            CemiFrameBody::DataExt(data) => data.length_in_bits(),
            CemiFrameBody::PollingData
            | CemiFrameBody::PollingDataExt
            | CemiFrameBody::Ack { .. } => 0,
        };
        8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("CEMIFrame", ContextKind::Element)?;
        wb.write_bit("standardFrame", self.standard_frame())?;
        wb.write_bit("polling", self.polling())?;
        wb.write_bit("notRepeated", self.not_repeated)?;
        wb.write_bit("notAckFrame", self.not_ack_frame())?;
        write_enum(wb, "priority", self.priority)?;
        wb.write_bit("acknowledgeRequested", self.acknowledge_requested)?;
        wb.write_bit("errorFlag", self.error_flag)?;
        match &self.body {
            CemiFrameBody::Data(data) => {
                write_variant(wb, "CEMIFrameData", |wb| data.serialize_fields(wb))?
            }
            CemiFrameBody::DataExt(data) => {
                write_variant(wb, "CEMIFrameDataExt", |wb| data.serialize_fields(wb))?
            }
            CemiFrameBody::PollingData => write_variant(wb, "CEMIFramePollingData", |_| Ok(()))?,
            CemiFrameBody::PollingDataExt => {
                write_variant(wb, "CEMIFramePollingDataExt", |_| Ok(()))?
            }
            CemiFrameBody::Ack { .. } => write_variant(wb, "CEMIFrameAck", |_| Ok(()))?,
        }
        wb.pop_context("CEMIFrame", ContextKind::Element)
    }
}

impl Parse for CemiFrame {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("CEMIFrame", ContextKind::Element)?;
        let standard_frame = rb.read_bit("standardFrame")?;
        let polling = rb.read_bit("polling")?;
        let not_repeated = rb.read_bit("notRepeated")?;
        let not_ack_frame = rb.read_bit("notAckFrame")?;
        let priority = read_enum(rb, "priority")?;
        let acknowledge_requested = rb.read_bit("acknowledgeRequested")?;
        let error_flag = rb.read_bit("errorFlag")?;
        let body = match (not_ack_frame, standard_frame, polling) {
            (false, standard_frame, polling) => read_variant(rb, "CEMIFrameAck", |_| {
                Ok(CemiFrameBody::Ack {
                    standard_frame,
                    polling,
                })
            })?,
            (true, true, false) => read_variant(rb, "CEMIFrameData", |rb| {
                CemiFrameData::parse_fields(rb).map(CemiFrameBody::Data)
            })?,
            (true, true, true) => {
                read_variant(rb, "CEMIFramePollingData", |_| Ok(CemiFrameBody::PollingData))?
            }
            (true, false, false) => read_variant(rb, "CEMIFrameDataExt", |rb| {
                CemiFrameDataExt::parse_fields(rb).map(CemiFrameBody::DataExt)
            })?,
            (true, false, true) => read_variant(rb, "CEMIFramePollingDataExt", |_| {
                Ok(CemiFrameBody::PollingDataExt)
            })?,
        };
        rb.close_context("CEMIFrame", ContextKind::Element)?;
        Ok(Self {
            not_repeated,
            priority,
            acknowledge_requested,
            error_flag,
            body,
        })
    }
}

/// Transport and application control fields plus payload, shared by both
/// data frame kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tpdu {
    /// Transport layer control.
    pub tpci: Tpci,
    /// Sequence counter, four bits.
    pub counter: u8,
    /// Application service.
    pub apci: Apci,
    /// Six data bits packed into the APCI octet.
    pub data_first_byte: i8,
    /// Remaining payload octets.
    pub data: Vec<u8>,
}

impl Tpdu {
    fn length_in_bits(&self) -> usize {
        2 + 4 + 4 + 6 + self.data.len() * 8
    }

    fn data_length(&self) -> usize {
        self.data.len() + 1
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        write_enum(wb, "tpci", self.tpci)?;
        wb.write_u8("counter", 4, self.counter)?;
        write_enum(wb, "apci", self.apci)?;
        wb.write_i8("dataFirstByte", 6, self.data_first_byte)?;
        wb.write_byte_array("data", &self.data)
    }

    fn parse_fields(rb: &mut dyn ReadBuffer, data_length: u8) -> Result<Self> {
        let remaining = usize::from(data_length)
            .checked_sub(1)
            .ok_or_else(|| CodecError::invalid_value("data length must cover the APCI octet"))
            .parsing("dataLength")?;
        Ok(Self {
            tpci: read_enum(rb, "tpci")?,
            counter: rb.read_u8("counter", 4)?,
            apci: read_enum(rb, "apci")?,
            data_first_byte: rb.read_i8("dataFirstByte", 6)?,
            data: rb.read_byte_array("data", remaining)?,
        })
    }
}

/// Standard data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CemiFrameData {
    /// Sender.
    pub source_address: KnxAddress,
    /// Receiver, an individual or a group address.
    pub destination_address: [u8; 2],
    /// The destination is a group address.
    pub group_address: bool,
    /// Routing counter, three bits.
    pub hop_count: u8,
    /// Transport and application part.
    pub tpdu: Tpdu,
}

impl CemiFrameData {
    fn length_in_bits(&self) -> usize {
        self.source_address.length_in_bits() + 16 + 1 + 3 + 4 + self.tpdu.length_in_bits()
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        write_simple(wb, "sourceAddress", &self.source_address)?;
        wb.write_byte_array("destinationAddress", &self.destination_address)?;
        wb.write_bit("groupAddress", self.group_address)?;
        wb.write_u8("hopCount", 3, self.hop_count)?;
        let data_length: u8 = implicit_length("dataLength", self.tpdu.data_length())?;
        wb.write_u8("dataLength", 4, data_length)?;
        self.tpdu.serialize_fields(wb)
    }

    fn parse_fields(rb: &mut dyn ReadBuffer) -> Result<Self> {
        let source_address = read_simple(rb, "sourceAddress", ())?;
        let destination_address = read_fixed_bytes(rb, "destinationAddress")?;
        let group_address = rb.read_bit("groupAddress")?;
        let hop_count = rb.read_u8("hopCount", 3)?;
        let data_length = rb.read_u8("dataLength", 4)?;
        let tpdu = Tpdu::parse_fields(rb, data_length)?;
        Ok(Self {
            source_address,
            destination_address,
            group_address,
            hop_count,
            tpdu,
        })
    }
}

/// Extended data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CemiFrameDataExt {
    /// The destination is a group address.
    pub group_address: bool,
    /// Routing counter, three bits.
    pub hop_count: u8,
    /// Extended frame format, four bits.
    pub extended_frame_format: u8,
    /// Sender.
    pub source_address: KnxAddress,
    /// Receiver, an individual or a group address.
    pub destination_address: [u8; 2],
    /// Transport and application part.
    pub tpdu: Tpdu,
}

impl CemiFrameDataExt {
    fn length_in_bits(&self) -> usize {
        1 + 3 + 4 + self.source_address.length_in_bits() + 16 + 8 + self.tpdu.length_in_bits()
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.write_bit("groupAddress", self.group_address)?;
        wb.write_u8("hopCount", 3, self.hop_count)?;
        wb.write_u8("extendedFrameFormat", 4, self.extended_frame_format)?;
        write_simple(wb, "sourceAddress", &self.source_address)?;
        wb.write_byte_array("destinationAddress", &self.destination_address)?;
        let data_length: u8 = implicit_length("dataLength", self.tpdu.data_length())?;
        wb.write_u8("dataLength", 8, data_length)?;
        self.tpdu.serialize_fields(wb)
    }

    fn parse_fields(rb: &mut dyn ReadBuffer) -> Result<Self> {
        let group_address = rb.read_bit("groupAddress")?;
        let hop_count = rb.read_u8("hopCount", 3)?;
        let extended_frame_format = rb.read_u8("extendedFrameFormat", 4)?;
        let source_address = read_simple(rb, "sourceAddress", ())?;
        let destination_address = read_fixed_bytes(rb, "destinationAddress")?;
        let data_length = rb.read_u8("dataLength", 8)?;
        let tpdu = Tpdu::parse_fields(rb, data_length)?;
        Ok(Self {
            group_address,
            hop_count,
            extended_frame_format,
            source_address,
            destination_address,
            tpdu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group_write() -> CemiFrame {
        CemiFrame {
            not_repeated: true,
            priority: CemiPriority::Low,
            acknowledge_requested: false,
            error_flag: false,
            body: CemiFrameBody::DataExt(CemiFrameDataExt {
                group_address: true,
                hop_count: 6,
                extended_frame_format: 0,
                source_address: KnxAddress::new(1, 1, 10),
                destination_address: [0x0A, 0x01],
                tpdu: Tpdu {
                    tpci: Tpci::UnnumberedDataPacket,
                    counter: 0,
                    apci: Apci::GroupValueWritePdu,
                    data_first_byte: 1,
                    data: vec![],
                },
            }),
        }
    }

    #[test]
    fn test_ldata_ind_group_write() {
        let bytes = hex::decode("29003ce0110a0a01010081").unwrap();
        let cemi = Cemi::from_bytes(&bytes, bytes.len() as u16).unwrap();
        let expected = Cemi::LDataInd(LData {
            additional_information: vec![],
            data_frame: group_write(),
        });
        assert_eq!(cemi, expected);
        assert_eq!(cemi.to_bytes().unwrap(), bytes);
        assert_eq!(cemi.length_in_bytes(), bytes.len());
    }

    #[test]
    fn test_ldata_with_additional_information() {
        let cemi = Cemi::LDataReq(LData {
            additional_information: vec![CemiAdditionalInformation::RelativeTimestamp {
                relative_timestamp: 0x1234,
            }],
            data_frame: group_write(),
        });
        let bytes = cemi.to_bytes().unwrap();
        assert_eq!(&bytes[..6], &[0x11, 0x04, 0x04, 0x02, 0x12, 0x34]);
        assert_eq!(Cemi::from_bytes(&bytes, bytes.len() as u16).unwrap(), cemi);
    }

    #[test]
    fn test_standard_frame_length_nibble() {
        let frame = CemiFrame {
            not_repeated: true,
            priority: CemiPriority::Normal,
            acknowledge_requested: true,
            error_flag: false,
            body: CemiFrameBody::Data(CemiFrameData {
                source_address: KnxAddress::new(1, 1, 1),
                destination_address: [0x00, 0x01],
                group_address: true,
                hop_count: 7,
                tpdu: Tpdu {
                    tpci: Tpci::UnnumberedDataPacket,
                    counter: 0,
                    apci: Apci::GroupValueResponsePdu,
                    data_first_byte: 0,
                    data: vec![0x0C, 0x1A],
                },
            }),
        };
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes[5], 0b1_111_0011);
        assert_eq!(bytes.len() * 8, frame.length_in_bits());
        assert_eq!(CemiFrame::from_bytes(&bytes, ()).unwrap(), frame);
    }

    #[test]
    fn test_zero_data_length_is_rejected() {
        let err = CemiFrame::from_bytes(&[0xB0, 0x11, 0x01, 0x00, 0x01, 0xE0, 0x00, 0x80], ())
            .unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'dataLength'"));
        assert!(matches!(err.root_cause(), CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_busmon_crc_follows_frame_kind() {
        let ack = Cemi::LBusmonInd(LBusmon {
            additional_information: vec![CemiAdditionalInformation::BusmonitorInfo {
                frame_error_flag: false,
                bit_error_flag: false,
                parity_error_flag: false,
                unknown_flag: false,
                lost_flag: false,
                sequence_number: 3,
            }],
            data_frame: CemiFrame {
                not_repeated: false,
                priority: CemiPriority::System,
                acknowledge_requested: false,
                error_flag: false,
                body: CemiFrameBody::Ack {
                    standard_frame: true,
                    polling: false,
                },
            },
            crc: None,
        });
        let bytes = ack.to_bytes().unwrap();
        assert_eq!(bytes, vec![0x2B, 0x03, 0x03, 0x01, 0x03, 0x80]);
        assert_eq!(Cemi::from_bytes(&bytes, 6).unwrap(), ack);

        let data = Cemi::LBusmonInd(LBusmon {
            additional_information: vec![],
            data_frame: group_write(),
            crc: None,
        });
        let err = data.to_bytes().unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_prop_read_con_uses_enclosing_size() {
        let bytes = [0xFB, 0x00, 0x0B, 0x01, 0x35, 0x10, 0x01, 0x00, 0xC5];
        let cemi = Cemi::from_bytes(&bytes, bytes.len() as u16).unwrap();
        assert_eq!(
            cemi,
            Cemi::MPropReadCon {
                property: PropertyAccess {
                    interface_object_type: 0x000B,
                    object_instance: 1,
                    property_id: 0x35,
                    number_of_elements: 1,
                    start_index: 1,
                },
                data: vec![0x00, 0xC5],
            }
        );
        assert_eq!(cemi.to_bytes().unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_reset_and_unknown_codes() {
        assert_eq!(Cemi::from_bytes(&[0xF1], 1).unwrap(), Cemi::MResetReq);
        let err = Cemi::from_bytes(&[0x10], 1).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVariant { type_name: "CEMI", .. }));
    }

    #[test]
    fn test_xml_round_trip() {
        let cemi = Cemi::LDataCon(LData {
            additional_information: vec![],
            data_frame: group_write(),
        });
        let xml = cemi.to_xml().unwrap();
        assert!(xml.contains("<dataFrame>"));
        assert!(xml.contains("<CEMIFrameDataExt>"));
        assert_eq!(Cemi::from_xml(&xml, 0).unwrap(), cemi);
    }
}
