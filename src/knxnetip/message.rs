//! The KNXnet/IP frame: a six byte header followed by one of sixteen services.

use super::cemi::Cemi;
use super::structures::{
    ConnectionRequestInformation, ConnectionResponseDataBlock, DeviceConfigurationAckDataBlock,
    DeviceConfigurationRequestDataBlock, DibDeviceInfo, DibSuppSvcFamilies, Hpai,
    TunnelingRequestDataBlock, TunnelingResponseDataBlock,
};
use super::types::Status;
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    implicit_length, optional_length_in_bits, read_const, read_enum, read_optional,
    read_reserved, read_simple, read_variant, write_const, write_enum, write_optional,
    write_reserved, write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// Header length of every KNXnet/IP frame.
pub const HEADER_LENGTH: u8 = 0x06;

/// KNXnet/IP protocol version 1.0.
pub const PROTOCOL_VERSION: u8 = 0x10;

/// A KNXnet/IP frame, keyed by its service type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnxNetIpMessage {
    /// `0x0201`
    SearchRequest {
        /// Where responses should be sent.
        hpai_ip_discovery_endpoint: Hpai,
    },
    /// `0x0202`
    SearchResponse {
        /// Control endpoint of the responding server.
        hpai_control_endpoint: Hpai,
        /// Device description.
        dib_device_info: DibDeviceInfo,
        /// Supported service families.
        dib_supp_svc_families: DibSuppSvcFamilies,
    },
    /// `0x0203`
    DescriptionRequest {
        /// Where the response should be sent.
        hpai_control_endpoint: Hpai,
    },
    /// `0x0204`
    DescriptionResponse {
        /// Device description.
        dib_device_info: DibDeviceInfo,
        /// Supported service families.
        dib_supp_svc_families: DibSuppSvcFamilies,
    },
    /// `0x0205`
    ConnectionRequest {
        /// Client control endpoint.
        hpai_discovery_endpoint: Hpai,
        /// Client data endpoint.
        hpai_data_endpoint: Hpai,
        /// Requested connection.
        connection_request_information: ConnectionRequestInformation,
    },
    /// `0x0206`
    ///
    /// The endpoint and the data block are only on the wire when `status`
    /// is [`Status::NoError`].
    ConnectionResponse {
        /// Channel assigned by the server.
        communication_channel_id: u8,
        /// Outcome.
        status: Status,
        /// Server data endpoint.
        hpai_data_endpoint: Option<Hpai>,
        /// Granted connection.
        connection_response_data_block: Option<ConnectionResponseDataBlock>,
    },
    /// `0x0207`
    ConnectionStateRequest {
        /// Channel being probed.
        communication_channel_id: u8,
        /// Client control endpoint.
        hpai_control_endpoint: Hpai,
    },
    /// `0x0208`
    ConnectionStateResponse {
        /// Channel being probed.
        communication_channel_id: u8,
        /// Outcome.
        status: Status,
    },
    /// `0x0209`
    DisconnectRequest {
        /// Channel to close.
        communication_channel_id: u8,
        /// Client control endpoint.
        hpai_control_endpoint: Hpai,
    },
    /// `0x020A`
    DisconnectResponse {
        /// Closed channel.
        communication_channel_id: u8,
        /// Outcome.
        status: Status,
    },
    /// `0x020B`, body kept as opaque bytes.
    UnknownMessage {
        /// Everything after the header.
        unknown_data: Vec<u8>,
    },
    /// `0x0310`
    DeviceConfigurationRequest {
        /// Connection header.
        device_configuration_request_data_block: DeviceConfigurationRequestDataBlock,
        /// Management message.
        cemi: Cemi,
    },
    /// `0x0311`
    DeviceConfigurationAck {
        /// Connection header.
        device_configuration_ack_data_block: DeviceConfigurationAckDataBlock,
    },
    /// `0x0420`
    TunnelingRequest {
        /// Connection header.
        tunneling_request_data_block: TunnelingRequestDataBlock,
        /// Tunnelled frame.
        cemi: Cemi,
    },
    /// `0x0421`
    TunnelingResponse {
        /// Connection header.
        tunneling_response_data_block: TunnelingResponseDataBlock,
    },
    /// `0x0530`
    RoutingIndication {
        /// Routed frame.
        cemi: Cemi,
    },
}

impl KnxNetIpMessage {
    /// Wire discriminator.
    pub fn msg_type(&self) -> u16 {
        match self {
            KnxNetIpMessage::SearchRequest { .. } => 0x0201,
            KnxNetIpMessage::SearchResponse { .. } => 0x0202,
            KnxNetIpMessage::DescriptionRequest { .. } => 0x0203,
            KnxNetIpMessage::DescriptionResponse { .. } => 0x0204,
            KnxNetIpMessage::ConnectionRequest { .. } => 0x0205,
            KnxNetIpMessage::ConnectionResponse { .. } => 0x0206,
            KnxNetIpMessage::ConnectionStateRequest { .. } => 0x0207,
            KnxNetIpMessage::ConnectionStateResponse { .. } => 0x0208,
            KnxNetIpMessage::DisconnectRequest { .. } => 0x0209,
            KnxNetIpMessage::DisconnectResponse { .. } => 0x020A,
            KnxNetIpMessage::UnknownMessage { .. } => 0x020B,
            KnxNetIpMessage::DeviceConfigurationRequest { .. } => 0x0310,
            KnxNetIpMessage::DeviceConfigurationAck { .. } => 0x0311,
            KnxNetIpMessage::TunnelingRequest { .. } => 0x0420,
            KnxNetIpMessage::TunnelingResponse { .. } => 0x0421,
            KnxNetIpMessage::RoutingIndication { .. } => 0x0530,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            KnxNetIpMessage::SearchRequest { .. } => "SearchRequest",
            KnxNetIpMessage::SearchResponse { .. } => "SearchResponse",
            KnxNetIpMessage::DescriptionRequest { .. } => "DescriptionRequest",
            KnxNetIpMessage::DescriptionResponse { .. } => "DescriptionResponse",
            KnxNetIpMessage::ConnectionRequest { .. } => "ConnectionRequest",
            KnxNetIpMessage::ConnectionResponse { .. } => "ConnectionResponse",
            KnxNetIpMessage::ConnectionStateRequest { .. } => "ConnectionStateRequest",
            KnxNetIpMessage::ConnectionStateResponse { .. } => "ConnectionStateResponse",
            KnxNetIpMessage::DisconnectRequest { .. } => "DisconnectRequest",
            KnxNetIpMessage::DisconnectResponse { .. } => "DisconnectResponse",
            KnxNetIpMessage::UnknownMessage { .. } => "UnknownMessage",
            KnxNetIpMessage::DeviceConfigurationRequest { .. } => "DeviceConfigurationRequest",
            KnxNetIpMessage::DeviceConfigurationAck { .. } => "DeviceConfigurationAck",
            KnxNetIpMessage::TunnelingRequest { .. } => "TunnelingRequest",
            KnxNetIpMessage::TunnelingResponse { .. } => "TunnelingResponse",
            KnxNetIpMessage::RoutingIndication { .. } => "RoutingIndication",
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            KnxNetIpMessage::SearchRequest {
                hpai_ip_discovery_endpoint,
            } => hpai_ip_discovery_endpoint.length_in_bits(),
            KnxNetIpMessage::SearchResponse {
                hpai_control_endpoint,
                dib_device_info,
                dib_supp_svc_families,
            } => {
                hpai_control_endpoint.length_in_bits()
                    + dib_device_info.length_in_bits()
                    + dib_supp_svc_families.length_in_bits()
            }
            KnxNetIpMessage::DescriptionRequest {
                hpai_control_endpoint,
            } => hpai_control_endpoint.length_in_bits(),
            KnxNetIpMessage::DescriptionResponse {
                dib_device_info,
                dib_supp_svc_families,
            } => dib_device_info.length_in_bits() + dib_supp_svc_families.length_in_bits(),
            KnxNetIpMessage::ConnectionRequest {
                hpai_discovery_endpoint,
                hpai_data_endpoint,
                connection_request_information,
            } => {
                hpai_discovery_endpoint.length_in_bits()
                    + hpai_data_endpoint.length_in_bits()
                    + connection_request_information.length_in_bits()
            }
            KnxNetIpMessage::ConnectionResponse {
                status,
                hpai_data_endpoint,
                connection_response_data_block,
                ..
            } => {
                let present = *status == Status::NoError;
                8 + 8
                    + optional_length_in_bits(present, hpai_data_endpoint.as_ref())
                    + optional_length_in_bits(present, connection_response_data_block.as_ref())
            }
            KnxNetIpMessage::ConnectionStateRequest {
                hpai_control_endpoint,
                ..
            }
            | KnxNetIpMessage::DisconnectRequest {
                hpai_control_endpoint,
                ..
            } => 8 + 8 + hpai_control_endpoint.length_in_bits(),
            KnxNetIpMessage::ConnectionStateResponse { .. }
            | KnxNetIpMessage::DisconnectResponse { .. } => 8 + 8,
            KnxNetIpMessage::UnknownMessage { unknown_data } => unknown_data.len() * 8,
            KnxNetIpMessage::DeviceConfigurationRequest {
                device_configuration_request_data_block,
                cemi,
            } => device_configuration_request_data_block.length_in_bits() + cemi.length_in_bits(),
            KnxNetIpMessage::DeviceConfigurationAck {
                device_configuration_ack_data_block,
            } => device_configuration_ack_data_block.length_in_bits(),
            KnxNetIpMessage::TunnelingRequest {
                tunneling_request_data_block,
                cemi,
            } => tunneling_request_data_block.length_in_bits() + cemi.length_in_bits(),
            KnxNetIpMessage::TunnelingResponse {
                tunneling_response_data_block,
            } => tunneling_response_data_block.length_in_bits(),
            KnxNetIpMessage::RoutingIndication { cemi } => cemi.length_in_bits(),
        }
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        match self {
            KnxNetIpMessage::SearchRequest {
                hpai_ip_discovery_endpoint,
            } => write_simple(wb, "hpaiIPv4Endpoint", hpai_ip_discovery_endpoint),
            KnxNetIpMessage::SearchResponse {
                hpai_control_endpoint,
                dib_device_info,
                dib_supp_svc_families,
            } => {
                write_simple(wb, "hpaiControlEndpoint", hpai_control_endpoint)?;
                write_simple(wb, "dibDeviceInfo", dib_device_info)?;
                write_simple(wb, "dibSuppSvcFamilies", dib_supp_svc_families)
            }
            KnxNetIpMessage::DescriptionRequest {
                hpai_control_endpoint,
            } => write_simple(wb, "hpaiControlEndpoint", hpai_control_endpoint),
            KnxNetIpMessage::DescriptionResponse {
                dib_device_info,
                dib_supp_svc_families,
            } => {
                write_simple(wb, "dibDeviceInfo", dib_device_info)?;
                write_simple(wb, "dibSuppSvcFamilies", dib_supp_svc_families)
            }
            KnxNetIpMessage::ConnectionRequest {
                hpai_discovery_endpoint,
                hpai_data_endpoint,
                connection_request_information,
            } => {
                write_simple(wb, "hpaiDiscoveryEndpoint", hpai_discovery_endpoint)?;
                write_simple(wb, "hpaiDataEndpoint", hpai_data_endpoint)?;
                write_simple(
                    wb,
                    "connectionRequestInformation",
                    connection_request_information,
                )
            }
            KnxNetIpMessage::ConnectionResponse {
                communication_channel_id,
                status,
                hpai_data_endpoint,
                connection_response_data_block,
            } => {
                wb.write_u8("communicationChannelId", 8, *communication_channel_id)?;
                write_enum(wb, "status", *status)?;
                let present = *status == Status::NoError;
                write_optional(wb, "hpaiDataEndpoint", present, hpai_data_endpoint.as_ref())?;
                write_optional(
                    wb,
                    "connectionResponseDataBlock",
                    present,
                    connection_response_data_block.as_ref(),
                )
            }
            KnxNetIpMessage::ConnectionStateRequest {
                communication_channel_id,
                hpai_control_endpoint,
            }
            | KnxNetIpMessage::DisconnectRequest {
                communication_channel_id,
                hpai_control_endpoint,
            } => {
                wb.write_u8("communicationChannelId", 8, *communication_channel_id)?;
                write_reserved(wb, "reserved", 8, 0x00)?;
                write_simple(wb, "hpaiControlEndpoint", hpai_control_endpoint)
            }
            KnxNetIpMessage::ConnectionStateResponse {
                communication_channel_id,
                status,
            }
            | KnxNetIpMessage::DisconnectResponse {
                communication_channel_id,
                status,
            } => {
                wb.write_u8("communicationChannelId", 8, *communication_channel_id)?;
                write_enum(wb, "status", *status)
            }
            KnxNetIpMessage::UnknownMessage { unknown_data } => {
                wb.write_byte_array("unknownData", unknown_data)
            }
            KnxNetIpMessage::DeviceConfigurationRequest {
                device_configuration_request_data_block,
                cemi,
            } => {
                write_simple(
                    wb,
                    "deviceConfigurationRequestDataBlock",
                    device_configuration_request_data_block,
                )?;
                write_simple(wb, "cemi", cemi)
            }
            KnxNetIpMessage::DeviceConfigurationAck {
                device_configuration_ack_data_block,
            } => write_simple(
                wb,
                "deviceConfigurationAckDataBlock",
                device_configuration_ack_data_block,
            ),
            KnxNetIpMessage::TunnelingRequest {
                tunneling_request_data_block,
                cemi,
            } => {
                write_simple(wb, "tunnelingRequestDataBlock", tunneling_request_data_block)?;
                write_simple(wb, "cemi", cemi)
            }
            KnxNetIpMessage::TunnelingResponse {
                tunneling_response_data_block,
            } => write_simple(
                wb,
                "tunnelingResponseDataBlock",
                tunneling_response_data_block,
            ),
            KnxNetIpMessage::RoutingIndication { cemi } => write_simple(wb, "cemi", cemi),
        }
    }
}

impl Message for KnxNetIpMessage {
    fn type_name(&self) -> &'static str {
        "KnxNetIpMessage"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 16 + 16 + self.own_length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("KnxNetIpMessage", ContextKind::Element)?;
        wb.write_u8("headerLength", 8, HEADER_LENGTH)?;
        write_const(wb, "protocolVersion", 8, u64::from(PROTOCOL_VERSION))?;
        wb.write_u16("msgType", 16, self.msg_type())?;
        let total_length: u16 = implicit_length("totalLength", self.length_in_bytes())?;
        wb.write_u16("totalLength", 16, total_length)?;
        write_variant(wb, self.variant_name(), |wb| self.serialize_fields(wb))?;
        wb.pop_context("KnxNetIpMessage", ContextKind::Element)
    }
}

/// Bytes left for a cEMI after the header and a connection header.
fn cemi_size(total_length: u16, consumed: usize) -> Result<u16> {
    usize::from(total_length)
        .checked_sub(consumed)
        .and_then(|size| u16::try_from(size).ok())
        .ok_or_else(|| {
            CodecError::invalid_value(format!(
                "total length {total_length} is shorter than the {consumed} header bytes"
            ))
        })
        .parsing("totalLength")
}

impl Parse for KnxNetIpMessage {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("KnxNetIpMessage", ContextKind::Element)?;
        // Implicit; the body layout does not depend on it.
        let _header_length = rb.read_u8("headerLength", 8)?;
        read_const(rb, "protocolVersion", 8, u64::from(PROTOCOL_VERSION))?;
        let msg_type = rb.read_u16("msgType", 16)?;
        let total_length = rb.read_u16("totalLength", 16)?;
        let header = usize::from(HEADER_LENGTH);

        let value = match msg_type {
            0x0201 => read_variant(rb, "SearchRequest", |rb| {
                Ok(KnxNetIpMessage::SearchRequest {
                    hpai_ip_discovery_endpoint: read_simple(rb, "hpaiIPv4Endpoint", ())?,
                })
            })?,
            0x0202 => read_variant(rb, "SearchResponse", |rb| {
                Ok(KnxNetIpMessage::SearchResponse {
                    hpai_control_endpoint: read_simple(rb, "hpaiControlEndpoint", ())?,
                    dib_device_info: read_simple(rb, "dibDeviceInfo", ())?,
                    dib_supp_svc_families: read_simple(rb, "dibSuppSvcFamilies", ())?,
                })
            })?,
            0x0203 => read_variant(rb, "DescriptionRequest", |rb| {
                Ok(KnxNetIpMessage::DescriptionRequest {
                    hpai_control_endpoint: read_simple(rb, "hpaiControlEndpoint", ())?,
                })
            })?,
            0x0204 => read_variant(rb, "DescriptionResponse", |rb| {
                Ok(KnxNetIpMessage::DescriptionResponse {
                    dib_device_info: read_simple(rb, "dibDeviceInfo", ())?,
                    dib_supp_svc_families: read_simple(rb, "dibSuppSvcFamilies", ())?,
                })
            })?,
            0x0205 => read_variant(rb, "ConnectionRequest", |rb| {
                Ok(KnxNetIpMessage::ConnectionRequest {
                    hpai_discovery_endpoint: read_simple(rb, "hpaiDiscoveryEndpoint", ())?,
                    hpai_data_endpoint: read_simple(rb, "hpaiDataEndpoint", ())?,
                    connection_request_information: read_simple(
                        rb,
                        "connectionRequestInformation",
                        (),
                    )?,
                })
            })?,
            0x0206 => read_variant(rb, "ConnectionResponse", |rb| {
                let communication_channel_id = rb.read_u8("communicationChannelId", 8)?;
                let status: Status = read_enum(rb, "status")?;
                let present = status == Status::NoError;
                let hpai_data_endpoint = read_optional(rb, "hpaiDataEndpoint", present, ())?;
                let connection_response_data_block =
                    read_optional(rb, "connectionResponseDataBlock", present, ())?;
                Ok(KnxNetIpMessage::ConnectionResponse {
                    communication_channel_id,
                    status,
                    hpai_data_endpoint,
                    connection_response_data_block,
                })
            })?,
            0x0207 => read_variant(rb, "ConnectionStateRequest", |rb| {
                let communication_channel_id = rb.read_u8("communicationChannelId", 8)?;
                read_reserved(rb, "reserved", 8, 0x00)?;
                Ok(KnxNetIpMessage::ConnectionStateRequest {
                    communication_channel_id,
                    hpai_control_endpoint: read_simple(rb, "hpaiControlEndpoint", ())?,
                })
            })?,
            0x0208 => read_variant(rb, "ConnectionStateResponse", |rb| {
                Ok(KnxNetIpMessage::ConnectionStateResponse {
                    communication_channel_id: rb.read_u8("communicationChannelId", 8)?,
                    status: read_enum(rb, "status")?,
                })
            })?,
            0x0209 => read_variant(rb, "DisconnectRequest", |rb| {
                let communication_channel_id = rb.read_u8("communicationChannelId", 8)?;
                read_reserved(rb, "reserved", 8, 0x00)?;
                Ok(KnxNetIpMessage::DisconnectRequest {
                    communication_channel_id,
                    hpai_control_endpoint: read_simple(rb, "hpaiControlEndpoint", ())?,
                })
            })?,
            0x020A => read_variant(rb, "DisconnectResponse", |rb| {
                Ok(KnxNetIpMessage::DisconnectResponse {
                    communication_channel_id: rb.read_u8("communicationChannelId", 8)?,
                    status: read_enum(rb, "status")?,
                })
            })?,
            0x020B => read_variant(rb, "UnknownMessage", |rb| {
                let size = cemi_size(total_length, header)?;
                Ok(KnxNetIpMessage::UnknownMessage {
                    unknown_data: rb.read_byte_array("unknownData", usize::from(size))?,
                })
            })?,
            0x0310 => read_variant(rb, "DeviceConfigurationRequest", |rb| {
                let block: DeviceConfigurationRequestDataBlock =
                    read_simple(rb, "deviceConfigurationRequestDataBlock", ())?;
                let size = cemi_size(total_length, header + block.length_in_bytes())?;
                Ok(KnxNetIpMessage::DeviceConfigurationRequest {
                    device_configuration_request_data_block: block,
                    cemi: read_simple(rb, "cemi", size)?,
                })
            })?,
            0x0311 => read_variant(rb, "DeviceConfigurationAck", |rb| {
                Ok(KnxNetIpMessage::DeviceConfigurationAck {
                    device_configuration_ack_data_block: read_simple(
                        rb,
                        "deviceConfigurationAckDataBlock",
                        (),
                    )?,
                })
            })?,
            0x0420 => read_variant(rb, "TunnelingRequest", |rb| {
                let block: TunnelingRequestDataBlock =
                    read_simple(rb, "tunnelingRequestDataBlock", ())?;
                let size = cemi_size(total_length, header + block.length_in_bytes())?;
                Ok(KnxNetIpMessage::TunnelingRequest {
                    tunneling_request_data_block: block,
                    cemi: read_simple(rb, "cemi", size)?,
                })
            })?,
            0x0421 => read_variant(rb, "TunnelingResponse", |rb| {
                Ok(KnxNetIpMessage::TunnelingResponse {
                    tunneling_response_data_block: read_simple(
                        rb,
                        "tunnelingResponseDataBlock",
                        (),
                    )?,
                })
            })?,
            0x0530 => read_variant(rb, "RoutingIndication", |rb| {
                let size = cemi_size(total_length, header)?;
                Ok(KnxNetIpMessage::RoutingIndication {
                    cemi: read_simple(rb, "cemi", size)?,
                })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "KnxNetIpMessage",
                    format!("msgType=0x{other:04X}"),
                ))
            }
        };
        rb.close_context("KnxNetIpMessage", ContextKind::Element)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knxnetip::cemi::{CemiFrame, CemiFrameBody, CemiFrameDataExt, LData, Tpdu};
    use crate::knxnetip::structures::{KnxAddress, RequestDataBlock};
    use crate::knxnetip::types::{Apci, CemiPriority, KnxLayer, Tpci};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn test_search_request() {
        let bytes = hex::decode("06100201000e0801c0a82a0b0e57").unwrap();
        let message = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap();
        assert_eq!(
            message,
            KnxNetIpMessage::SearchRequest {
                hpai_ip_discovery_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 42, 11), 3671),
            }
        );
        assert_eq!(message.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_header_length_is_not_checked() {
        let bytes = hex::decode("07100201000e0801c0a800010e57").unwrap();
        let message = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap();
        assert_eq!(
            message,
            KnxNetIpMessage::SearchRequest {
                hpai_ip_discovery_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 0, 1), 3671),
            }
        );
        // Always written back as the standard six-byte header.
        assert_eq!(message.to_bytes().unwrap()[0], HEADER_LENGTH);
    }

    #[test]
    fn test_wrong_protocol_version() {
        let bytes = hex::decode("06110201000e0801c0a82a0b0e57").unwrap();
        let err = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'protocolVersion'"));
        assert!(matches!(
            err.root_cause(),
            CodecError::ConstantMismatch {
                expected: 0x10,
                actual: 0x11
            }
        ));
    }

    #[test]
    fn test_connection_request() {
        let message = KnxNetIpMessage::ConnectionRequest {
            hpai_discovery_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 0, 2), 50000),
            hpai_data_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 0, 2), 50001),
            connection_request_information: ConnectionRequestInformation::TunnelConnection {
                knx_layer: KnxLayer::TunnelLinkLayer,
            },
        };
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[..6], &[0x06, 0x10, 0x02, 0x05, 0x00, 0x1A]);
        assert_eq!(KnxNetIpMessage::from_bytes(&bytes, ()).unwrap(), message);
    }

    #[test]
    fn test_failed_connection_response_skips_optionals() {
        let bytes = [0x06, 0x10, 0x02, 0x06, 0x00, 0x08, 0x00, 0x24];
        let message = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap();
        assert_eq!(
            message,
            KnxNetIpMessage::ConnectionResponse {
                communication_channel_id: 0,
                status: Status::NoMoreConnections,
                hpai_data_endpoint: None,
                connection_response_data_block: None,
            }
        );

        let with_leftovers = KnxNetIpMessage::ConnectionResponse {
            communication_channel_id: 0,
            status: Status::NoMoreConnections,
            hpai_data_endpoint: Some(Hpai::udp(Ipv4Addr::LOCALHOST, 3671)),
            connection_response_data_block: None,
        };
        assert_eq!(with_leftovers.length_in_bytes(), 8);
        assert_eq!(with_leftovers.to_bytes().unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_successful_connection_response() {
        let message = KnxNetIpMessage::ConnectionResponse {
            communication_channel_id: 0x15,
            status: Status::NoError,
            hpai_data_endpoint: Some(Hpai::udp(Ipv4Addr::new(192, 168, 0, 10), 3671)),
            connection_response_data_block: Some(ConnectionResponseDataBlock::TunnelConnection {
                knx_address: KnxAddress::new(1, 1, 255),
            }),
        };
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[16..], &[0x04, 0x04, 0x11, 0xFF]);
        assert_eq!(KnxNetIpMessage::from_bytes(&bytes, ()).unwrap(), message);

        let missing = KnxNetIpMessage::ConnectionResponse {
            communication_channel_id: 0x15,
            status: Status::NoError,
            hpai_data_endpoint: None,
            connection_response_data_block: None,
        };
        let err = missing.to_bytes().unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'hpaiDataEndpoint'"));
    }

    #[test]
    fn test_tunneling_request_sizes_cemi_from_total_length() {
        let message = KnxNetIpMessage::TunnelingRequest {
            tunneling_request_data_block: TunnelingRequestDataBlock(RequestDataBlock {
                communication_channel_id: 0x15,
                sequence_counter: 0x00,
            }),
            cemi: Cemi::LDataReq(LData {
                additional_information: vec![],
                data_frame: CemiFrame {
                    not_repeated: true,
                    priority: CemiPriority::Low,
                    acknowledge_requested: false,
                    error_flag: false,
                    body: CemiFrameBody::DataExt(CemiFrameDataExt {
                        group_address: true,
                        hop_count: 6,
                        extended_frame_format: 0,
                        source_address: KnxAddress::new(0, 0, 0),
                        destination_address: [0x00, 0x01],
                        tpdu: Tpdu {
                            tpci: Tpci::UnnumberedDataPacket,
                            counter: 0,
                            apci: Apci::GroupValueWritePdu,
                            data_first_byte: 0,
                            data: vec![0x0C, 0x3F],
                        },
                    }),
                },
            }),
        };
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 23);
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 23);
        assert_eq!(KnxNetIpMessage::from_bytes(&bytes, ()).unwrap(), message);

        let xml = message.to_xml().unwrap();
        assert_eq!(KnxNetIpMessage::from_xml(&xml, ()).unwrap(), message);
    }

    #[test]
    fn test_unknown_message_keeps_body() {
        let bytes = [0x06, 0x10, 0x02, 0x0B, 0x00, 0x09, 0xDE, 0xAD, 0x01];
        let message = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap();
        assert_eq!(
            message,
            KnxNetIpMessage::UnknownMessage {
                unknown_data: vec![0xDE, 0xAD, 0x01]
            }
        );
        assert_eq!(message.to_bytes().unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_unsupported_service() {
        let bytes = [0x06, 0x10, 0x09, 0x99, 0x00, 0x06];
        let err = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedVariant {
                type_name: "KnxNetIpMessage",
                ..
            }
        ));
    }
}
