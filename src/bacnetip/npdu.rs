//! Network layer protocol data units and network layer messages.

use super::types::NpduNetworkPriority;
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    implicit_length, read_const, read_enum, read_length_array, read_reserved, read_simple,
    read_variant, write_array, write_const, write_enum, write_reserved, write_simple,
    write_variant,
};
use crate::message::{Message, Parse};
use crate::value::RawPlcValue;

/// Version of the network layer protocol.
pub const NPDU_PROTOCOL_VERSION: u8 = 0x01;

/// Network number and MAC address of a remote station.
///
/// An empty address addresses every station of the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NpduAddress {
    /// Network number, `0xFFFF` for a global broadcast.
    pub network: u16,
    /// MAC address on that network.
    pub address: Vec<u8>,
}

impl NpduAddress {
    /// Broadcast to every network.
    pub fn global_broadcast() -> Self {
        Self {
            network: 0xFFFF,
            address: Vec::new(),
        }
    }

    fn length_in_bits(&self) -> usize {
        16 + 8 + self.address.len() * 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer, prefix: &str) -> Result<()> {
        wb.write_u16(&format!("{prefix}NetworkAddress"), 16, self.network)?;
        let length_name = format!("{prefix}Length");
        let length: u8 = implicit_length(&length_name, self.address.len())?;
        wb.write_u8(&length_name, 8, length)?;
        wb.write_byte_array(&format!("{prefix}Address"), &self.address)
    }

    fn parse(rb: &mut dyn ReadBuffer, prefix: &str) -> Result<Self> {
        let network = rb.read_u16(&format!("{prefix}NetworkAddress"), 16)?;
        let length = rb.read_u8(&format!("{prefix}Length"), 8)?;
        let address = rb.read_byte_array(&format!("{prefix}Address"), usize::from(length))?;
        Ok(Self { network, address })
    }
}

/// What an NPDU carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpduBody {
    /// A message for the network layer itself.
    Nlm(Nlm),
    /// An application layer PDU, kept opaque.
    Apdu(Vec<u8>),
}

/// A BACnet network layer protocol data unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npdu {
    /// The sender waits for a reply.
    pub expecting_reply: bool,
    /// Priority.
    pub network_priority: NpduNetworkPriority,
    /// Remote destination, absent for the local network.
    pub destination: Option<NpduAddress>,
    /// Originating station, set by routers.
    pub source: Option<NpduAddress>,
    /// Remaining router hops, required with a destination.
    pub hop_count: Option<u8>,
    /// Payload.
    pub body: NpduBody,
}

impl Npdu {
    /// A local NPDU around an application PDU.
    pub fn apdu(apdu: Vec<u8>) -> Self {
        Self {
            expecting_reply: false,
            network_priority: NpduNetworkPriority::NormalMessage,
            destination: None,
            source: None,
            hop_count: None,
            body: NpduBody::Apdu(apdu),
        }
    }

    /// A local NPDU around a network layer message.
    pub fn nlm(nlm: Nlm) -> Self {
        Self {
            body: NpduBody::Nlm(nlm),
            ..Self::apdu(Vec::new())
        }
    }

    /// The application PDU as a raw value, `None` for network layer messages.
    pub fn apdu_value(&self) -> Option<RawPlcValue> {
        match &self.body {
            NpduBody::Apdu(apdu) => Some(RawPlcValue::new(apdu.clone())),
            NpduBody::Nlm(_) => None,
        }
    }

    fn header_length_in_bits(&self) -> usize {
        let destination = self
            .destination
            .as_ref()
            .map_or(0, |destination| destination.length_in_bits() + 8);
        let source = self.source.as_ref().map_or(0, NpduAddress::length_in_bits);
        8 + 8 + destination + source
    }
}

impl Message for Npdu {
    fn type_name(&self) -> &'static str {
        "NPDU"
    }

    fn length_in_bits(&self) -> usize {
        let body = match &self.body {
            NpduBody::Nlm(nlm) => nlm.length_in_bits(),
            NpduBody::Apdu(apdu) => apdu.len() * 8,
        };
        self.header_length_in_bits() + body
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("NPDU", ContextKind::Element)?;
        write_const(wb, "protocolVersionNumber", 8, u64::from(NPDU_PROTOCOL_VERSION))?;
        wb.write_bit(
            "messageTypeFieldPresent",
            matches!(self.body, NpduBody::Nlm(_)),
        )?;
        write_reserved(wb, "reserved", 1, 0)?;
        wb.write_bit("destinationSpecified", self.destination.is_some())?;
        write_reserved(wb, "reserved", 1, 0)?;
        wb.write_bit("sourceSpecified", self.source.is_some())?;
        wb.write_bit("expectingReply", self.expecting_reply)?;
        write_enum(wb, "networkPriority", self.network_priority)?;
        if let Some(destination) = &self.destination {
            destination.serialize(wb, "destination")?;
        }
        if let Some(source) = &self.source {
            source.serialize(wb, "source")?;
        }
        if self.destination.is_some() {
            let hop_count = self
                .hop_count
                .ok_or_else(|| CodecError::invalid_value("a remote destination needs a hop count"))
                .serializing("hopCount")?;
            wb.write_u8("hopCount", 8, hop_count)?;
        }
        match &self.body {
            NpduBody::Nlm(nlm) => write_simple(wb, "nlm", nlm)?,
            NpduBody::Apdu(apdu) => wb.write_byte_array("apdu", apdu)?,
        }
        wb.pop_context("NPDU", ContextKind::Element)
    }
}

impl Parse for Npdu {
    /// Bytes of the NPDU as announced by the enclosing frame.
    type Args = usize;

    fn parse(rb: &mut dyn ReadBuffer, npdu_length: usize) -> Result<Self> {
        rb.pull_context("NPDU", ContextKind::Element)?;
        let start = rb.pos();
        read_const(rb, "protocolVersionNumber", 8, u64::from(NPDU_PROTOCOL_VERSION))?;
        let message_type_field_present = rb.read_bit("messageTypeFieldPresent")?;
        read_reserved(rb, "reserved", 1, 0)?;
        let destination_specified = rb.read_bit("destinationSpecified")?;
        read_reserved(rb, "reserved", 1, 0)?;
        let source_specified = rb.read_bit("sourceSpecified")?;
        let expecting_reply = rb.read_bit("expectingReply")?;
        let network_priority = read_enum(rb, "networkPriority")?;
        let destination = if destination_specified {
            Some(NpduAddress::parse(rb, "destination")?)
        } else {
            None
        };
        let source = if source_specified {
            Some(NpduAddress::parse(rb, "source")?)
        } else {
            None
        };
        let hop_count = if destination_specified {
            Some(rb.read_u8("hopCount", 8)?)
        } else {
            None
        };
        let body_name = if message_type_field_present { "nlm" } else { "apdu" };
        let body_length = npdu_length
            .checked_sub(rb.pos() - start)
            .ok_or(CodecError::LengthOverrun {
                boundary: start + npdu_length,
                position: rb.pos(),
            })
            .parsing(body_name)?;
        let body = if message_type_field_present {
            NpduBody::Nlm(read_simple(rb, "nlm", body_length)?)
        } else {
            NpduBody::Apdu(rb.read_byte_array("apdu", body_length)?)
        };
        rb.close_context("NPDU", ContextKind::Element)?;
        Ok(Self {
            expecting_reply,
            network_priority,
            destination,
            source,
            hop_count,
            body,
        })
    }
}

/// Network layer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nlm {
    /// `0x00` asks which router reaches the listed networks, all when empty.
    WhoIsRouterToNetwork {
        /// Networks asked for.
        destination_network_addresses: Vec<u16>,
    },
    /// `0x01` announces the networks a router reaches.
    IAmRouterToNetwork {
        /// Networks reachable through the sender.
        destination_network_addresses: Vec<u16>,
    },
    /// `0x80..=0xFF` vendor proprietary message.
    Proprietary {
        /// Message type, at least `0x80`.
        message_type: u8,
        /// Vendor owning the message type.
        vendor_id: u16,
        /// Opaque content.
        data: Vec<u8>,
    },
}

impl Nlm {
    /// Wire discriminator.
    pub fn message_type(&self) -> u8 {
        match self {
            Nlm::WhoIsRouterToNetwork { .. } => 0x00,
            Nlm::IAmRouterToNetwork { .. } => 0x01,
            Nlm::Proprietary { message_type, .. } => *message_type,
        }
    }
}

fn write_networks(wb: &mut dyn WriteBuffer, networks: &[u16]) -> Result<()> {
    write_array(wb, "destinationNetworkAddress", networks, |wb, network| {
        wb.write_u16("value", 16, *network)
    })
}

fn read_networks(rb: &mut dyn ReadBuffer, length: usize) -> Result<Vec<u16>> {
    read_length_array(rb, "destinationNetworkAddress", length, |rb| {
        rb.read_u16("value", 16)
    })
}

impl Message for Nlm {
    fn type_name(&self) -> &'static str {
        "NLM"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            Nlm::WhoIsRouterToNetwork {
                destination_network_addresses,
            }
            | Nlm::IAmRouterToNetwork {
                destination_network_addresses,
            } => destination_network_addresses.len() * 16,
            Nlm::Proprietary { data, .. } => 16 + data.len() * 8,
        };
        8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("NLM", ContextKind::Element)?;
        wb.write_u8("messageType", 8, self.message_type())?;
        match self {
            Nlm::WhoIsRouterToNetwork {
                destination_network_addresses,
            } => write_variant(wb, "NLMWhoIsRouterToNetwork", |wb| {
                write_networks(wb, destination_network_addresses)
            })?,
            Nlm::IAmRouterToNetwork {
                destination_network_addresses,
            } => write_variant(wb, "NLMIAmRouterToNetwork", |wb| {
                write_networks(wb, destination_network_addresses)
            })?,
            Nlm::Proprietary {
                message_type,
                vendor_id,
                data,
            } => {
                if *message_type < 0x80 {
                    return Err(CodecError::invalid_value(format!(
                        "message type 0x{message_type:02X} is not in the proprietary range"
                    )))
                    .serializing("messageType");
                }
                write_variant(wb, "NLMProprietary", |wb| {
                    wb.write_u16("vendorId", 16, *vendor_id)?;
                    wb.write_byte_array("data", data)
                })?
            }
        }
        wb.pop_context("NLM", ContextKind::Element)
    }
}

impl Parse for Nlm {
    /// Bytes of the message, type octet included.
    type Args = usize;

    fn parse(rb: &mut dyn ReadBuffer, length: usize) -> Result<Self> {
        rb.pull_context("NLM", ContextKind::Element)?;
        let message_type = rb.read_u8("messageType", 8)?;
        let rest = length.saturating_sub(1);
        let value = match message_type {
            0x00 => read_variant(rb, "NLMWhoIsRouterToNetwork", |rb| {
                Ok(Nlm::WhoIsRouterToNetwork {
                    destination_network_addresses: read_networks(rb, rest)?,
                })
            })?,
            0x01 => read_variant(rb, "NLMIAmRouterToNetwork", |rb| {
                Ok(Nlm::IAmRouterToNetwork {
                    destination_network_addresses: read_networks(rb, rest)?,
                })
            })?,
            0x80..=0xFF => read_variant(rb, "NLMProprietary", |rb| {
                let vendor_id = rb.read_u16("vendorId", 16)?;
                let data = rb.read_byte_array("data", rest.saturating_sub(2))?;
                Ok(Nlm::Proprietary {
                    message_type,
                    vendor_id,
                    data,
                })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "NLM",
                    format!("messageType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("NLM", ContextKind::Element)?;
        Ok(value)
    }
}
