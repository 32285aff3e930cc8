//! Building blocks carried inside KNXnet/IP service messages.

use std::fmt;
use std::net::Ipv4Addr;

use super::types::{HostProtocolCode, KnxLayer, KnxMedium, Status};
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    array_length_in_bits, implicit_length, read_enum, read_fixed_bytes, read_ipv4,
    read_length_array, read_reserved, read_simple, read_variant, write_array, write_enum,
    write_ipv4, write_reserved, write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// Individual address of a KNX device: area, line and device number.
///
/// Packed as `4 + 4 + 8` bits, so `1.2.3` is `0x12 0x03` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KnxAddress {
    /// Area, four bits.
    pub main_group: u8,
    /// Line, four bits.
    pub middle_group: u8,
    /// Device.
    pub sub_group: u8,
}

impl KnxAddress {
    /// Creates an address from its three parts.
    pub const fn new(main_group: u8, middle_group: u8, sub_group: u8) -> Self {
        Self {
            main_group,
            middle_group,
            sub_group,
        }
    }
}

impl fmt::Display for KnxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.main_group, self.middle_group, self.sub_group)
    }
}

impl Message for KnxAddress {
    fn type_name(&self) -> &'static str {
        "KNXAddress"
    }

    fn length_in_bits(&self) -> usize {
        16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("KNXAddress", ContextKind::Element)?;
        wb.write_u8("mainGroup", 4, self.main_group)?;
        wb.write_u8("middleGroup", 4, self.middle_group)?;
        wb.write_u8("subGroup", 8, self.sub_group)?;
        wb.pop_context("KNXAddress", ContextKind::Element)
    }
}

impl Parse for KnxAddress {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("KNXAddress", ContextKind::Element)?;
        let main_group = rb.read_u8("mainGroup", 4)?;
        let middle_group = rb.read_u8("middleGroup", 4)?;
        let sub_group = rb.read_u8("subGroup", 8)?;
        rb.close_context("KNXAddress", ContextKind::Element)?;
        Ok(Self::new(main_group, middle_group, sub_group))
    }
}

/// Host protocol address information: an IP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hpai {
    /// UDP or TCP.
    pub host_protocol_code: HostProtocolCode,
    /// Endpoint address.
    pub ip_address: Ipv4Addr,
    /// Endpoint port.
    pub ip_port: u16,
}

impl Hpai {
    /// Creates a UDP endpoint.
    pub fn udp(ip_address: Ipv4Addr, ip_port: u16) -> Self {
        Self {
            host_protocol_code: HostProtocolCode::Ipv4Udp,
            ip_address,
            ip_port,
        }
    }
}

impl Message for Hpai {
    fn type_name(&self) -> &'static str {
        "HPAI"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 32 + 16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("HPAI", ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", self.length_in_bytes())?;
        wb.write_u8("structureLength", 8, structure_length)?;
        write_enum(wb, "hostProtocolCode", self.host_protocol_code)?;
        write_ipv4(wb, "ipAddress", self.ip_address)?;
        wb.write_u16("ipPort", 16, self.ip_port)?;
        wb.pop_context("HPAI", ContextKind::Element)
    }
}

impl Parse for Hpai {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("HPAI", ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let host_protocol_code = read_enum(rb, "hostProtocolCode")?;
        let ip_address = read_ipv4(rb, "ipAddress")?;
        let ip_port = rb.read_u16("ipPort", 16)?;
        rb.close_context("HPAI", ContextKind::Element)?;
        Ok(Self {
            host_protocol_code,
            ip_address,
            ip_port,
        })
    }
}

/// Device status octet: seven reserved bits and the programming-mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceStatus {
    /// Device is in programming mode.
    pub program_mode: bool,
}

impl Message for DeviceStatus {
    fn type_name(&self) -> &'static str {
        "DeviceStatus"
    }

    fn length_in_bits(&self) -> usize {
        8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("DeviceStatus", ContextKind::Element)?;
        write_reserved(wb, "reserved", 7, 0x00)?;
        wb.write_bit("programMode", self.program_mode)?;
        wb.pop_context("DeviceStatus", ContextKind::Element)
    }
}

impl Parse for DeviceStatus {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("DeviceStatus", ContextKind::Element)?;
        read_reserved(rb, "reserved", 7, 0x00)?;
        let program_mode = rb.read_bit("programMode")?;
        rb.close_context("DeviceStatus", ContextKind::Element)?;
        Ok(Self { program_mode })
    }
}

/// Project and installation a device is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProjectInstallationIdentifier {
    /// Project number.
    pub project_number: u8,
    /// Installation number.
    pub installation_number: u8,
}

impl Message for ProjectInstallationIdentifier {
    fn type_name(&self) -> &'static str {
        "ProjectInstallationIdentifier"
    }

    fn length_in_bits(&self) -> usize {
        16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ProjectInstallationIdentifier", ContextKind::Element)?;
        wb.write_u8("projectNumber", 8, self.project_number)?;
        wb.write_u8("installationNumber", 8, self.installation_number)?;
        wb.pop_context("ProjectInstallationIdentifier", ContextKind::Element)
    }
}

impl Parse for ProjectInstallationIdentifier {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ProjectInstallationIdentifier", ContextKind::Element)?;
        let project_number = rb.read_u8("projectNumber", 8)?;
        let installation_number = rb.read_u8("installationNumber", 8)?;
        rb.close_context("ProjectInstallationIdentifier", ContextKind::Element)?;
        Ok(Self {
            project_number,
            installation_number,
        })
    }
}

/// Device information block returned by search and description responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DibDeviceInfo {
    /// Description type code, `0x01` for device info.
    pub description_type: u8,
    /// Medium the device is attached to.
    pub knx_medium: KnxMedium,
    /// Status octet.
    pub device_status: DeviceStatus,
    /// Individual address.
    pub knx_address: KnxAddress,
    /// Project assignment.
    pub project_installation_identifier: ProjectInstallationIdentifier,
    /// KNX serial number.
    pub knx_net_ip_device_serial_number: [u8; 6],
    /// Routing multicast address.
    pub knx_net_ip_device_multicast_address: Ipv4Addr,
    /// MAC address.
    pub knx_net_ip_device_mac_address: [u8; 6],
    /// Friendly name, NUL padded.
    pub device_friendly_name: [u8; 30],
}

impl DibDeviceInfo {
    /// Friendly name without its NUL padding.
    pub fn friendly_name(&self) -> String {
        let end = self
            .device_friendly_name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.device_friendly_name.len());
        String::from_utf8_lossy(&self.device_friendly_name[..end]).into_owned()
    }
}

impl Message for DibDeviceInfo {
    fn type_name(&self) -> &'static str {
        "DIBDeviceInfo"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8
            + 8
            + self.device_status.length_in_bits()
            + self.knx_address.length_in_bits()
            + self.project_installation_identifier.length_in_bits()
            + 6 * 8
            + 4 * 8
            + 6 * 8
            + 30 * 8
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("DIBDeviceInfo", ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", self.length_in_bytes())?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("descriptionType", 8, self.description_type)?;
        write_enum(wb, "knxMedium", self.knx_medium)?;
        write_simple(wb, "deviceStatus", &self.device_status)?;
        write_simple(wb, "knxAddress", &self.knx_address)?;
        write_simple(
            wb,
            "projectInstallationIdentifier",
            &self.project_installation_identifier,
        )?;
        wb.write_byte_array(
            "knxNetIpDeviceSerialNumber",
            &self.knx_net_ip_device_serial_number,
        )?;
        write_ipv4(
            wb,
            "knxNetIpDeviceMulticastAddress",
            self.knx_net_ip_device_multicast_address,
        )?;
        wb.write_byte_array(
            "knxNetIpDeviceMacAddress",
            &self.knx_net_ip_device_mac_address,
        )?;
        wb.write_byte_array("deviceFriendlyName", &self.device_friendly_name)?;
        wb.pop_context("DIBDeviceInfo", ContextKind::Element)
    }
}

impl Parse for DibDeviceInfo {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("DIBDeviceInfo", ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let description_type = rb.read_u8("descriptionType", 8)?;
        let knx_medium = read_enum(rb, "knxMedium")?;
        let device_status = read_simple(rb, "deviceStatus", ())?;
        let knx_address = read_simple(rb, "knxAddress", ())?;
        let project_installation_identifier =
            read_simple(rb, "projectInstallationIdentifier", ())?;
        let knx_net_ip_device_serial_number = read_fixed_bytes(rb, "knxNetIpDeviceSerialNumber")?;
        let knx_net_ip_device_multicast_address = read_ipv4(rb, "knxNetIpDeviceMulticastAddress")?;
        let knx_net_ip_device_mac_address = read_fixed_bytes(rb, "knxNetIpDeviceMacAddress")?;
        let device_friendly_name = read_fixed_bytes(rb, "deviceFriendlyName")?;
        rb.close_context("DIBDeviceInfo", ContextKind::Element)?;
        Ok(Self {
            description_type,
            knx_medium,
            device_status,
            knx_address,
            project_installation_identifier,
            knx_net_ip_device_serial_number,
            knx_net_ip_device_multicast_address,
            knx_net_ip_device_mac_address,
            device_friendly_name,
        })
    }
}

/// A service family and the version of it a device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    /// `0x02` core services.
    KnxNetIpCore {
        /// Family version.
        version: u8,
    },
    /// `0x03` device management.
    KnxNetIpDeviceManagement {
        /// Family version.
        version: u8,
    },
    /// `0x04` tunnelling.
    KnxNetIpTunneling {
        /// Family version.
        version: u8,
    },
    /// `0x05` routing.
    KnxNetIpRouting {
        /// Family version.
        version: u8,
    },
    /// `0x06` remote logging.
    KnxNetRemoteLogging {
        /// Family version.
        version: u8,
    },
    /// `0x07` remote configuration and diagnosis.
    KnxNetRemoteConfigurationAndDiagnosis {
        /// Family version.
        version: u8,
    },
    /// `0x08` object server.
    KnxNetObjectServer {
        /// Family version.
        version: u8,
    },
}

impl ServiceId {
    /// Wire discriminator.
    pub fn service_type(&self) -> u8 {
        match self {
            ServiceId::KnxNetIpCore { .. } => 0x02,
            ServiceId::KnxNetIpDeviceManagement { .. } => 0x03,
            ServiceId::KnxNetIpTunneling { .. } => 0x04,
            ServiceId::KnxNetIpRouting { .. } => 0x05,
            ServiceId::KnxNetRemoteLogging { .. } => 0x06,
            ServiceId::KnxNetRemoteConfigurationAndDiagnosis { .. } => 0x07,
            ServiceId::KnxNetObjectServer { .. } => 0x08,
        }
    }

    /// Supported version of the family.
    pub fn version(&self) -> u8 {
        match *self {
            ServiceId::KnxNetIpCore { version }
            | ServiceId::KnxNetIpDeviceManagement { version }
            | ServiceId::KnxNetIpTunneling { version }
            | ServiceId::KnxNetIpRouting { version }
            | ServiceId::KnxNetRemoteLogging { version }
            | ServiceId::KnxNetRemoteConfigurationAndDiagnosis { version }
            | ServiceId::KnxNetObjectServer { version } => version,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            ServiceId::KnxNetIpCore { .. } => "KnxNetIpCore",
            ServiceId::KnxNetIpDeviceManagement { .. } => "KnxNetIpDeviceManagement",
            ServiceId::KnxNetIpTunneling { .. } => "KnxNetIpTunneling",
            ServiceId::KnxNetIpRouting { .. } => "KnxNetIpRouting",
            ServiceId::KnxNetRemoteLogging { .. } => "KnxNetRemoteLogging",
            ServiceId::KnxNetRemoteConfigurationAndDiagnosis { .. } => {
                "KnxNetRemoteConfigurationAndDiagnosis"
            }
            ServiceId::KnxNetObjectServer { .. } => "KnxNetObjectServer",
        }
    }
}

impl Message for ServiceId {
    fn type_name(&self) -> &'static str {
        "ServiceId"
    }

    fn length_in_bits(&self) -> usize {
        16
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ServiceId", ContextKind::Element)?;
        wb.write_u8("serviceType", 8, self.service_type())?;
        write_variant(wb, self.variant_name(), |wb| {
            wb.write_u8("version", 8, self.version())
        })?;
        wb.pop_context("ServiceId", ContextKind::Element)
    }
}

impl Parse for ServiceId {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ServiceId", ContextKind::Element)?;
        let service_type = rb.read_u8("serviceType", 8)?;
        let (name, build): (&str, fn(u8) -> ServiceId) = match service_type {
            0x02 => ("KnxNetIpCore", |version| ServiceId::KnxNetIpCore { version }),
            0x03 => ("KnxNetIpDeviceManagement", |version| {
                ServiceId::KnxNetIpDeviceManagement { version }
            }),
            0x04 => ("KnxNetIpTunneling", |version| ServiceId::KnxNetIpTunneling {
                version,
            }),
            0x05 => ("KnxNetIpRouting", |version| ServiceId::KnxNetIpRouting { version }),
            0x06 => ("KnxNetRemoteLogging", |version| {
                ServiceId::KnxNetRemoteLogging { version }
            }),
            0x07 => ("KnxNetRemoteConfigurationAndDiagnosis", |version| {
                ServiceId::KnxNetRemoteConfigurationAndDiagnosis { version }
            }),
            0x08 => ("KnxNetObjectServer", |version| ServiceId::KnxNetObjectServer {
                version,
            }),
            other => {
                return Err(CodecError::unsupported(
                    "ServiceId",
                    format!("serviceType=0x{other:02X}"),
                ))
            }
        };
        let version = read_variant(rb, name, |rb| rb.read_u8("version", 8))?;
        rb.close_context("ServiceId", ContextKind::Element)?;
        Ok(build(version))
    }
}

/// Service families supported by a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DibSuppSvcFamilies {
    /// Description type code, `0x02` for supported service families.
    pub description_type: u8,
    /// Supported families.
    pub service_ids: Vec<ServiceId>,
}

impl Message for DibSuppSvcFamilies {
    fn type_name(&self) -> &'static str {
        "DIBSuppSvcFamilies"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + array_length_in_bits(&self.service_ids)
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("DIBSuppSvcFamilies", ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", self.length_in_bytes())?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("descriptionType", 8, self.description_type)?;
        write_array(wb, "serviceIds", &self.service_ids, |wb, id| id.serialize(wb))?;
        wb.pop_context("DIBSuppSvcFamilies", ContextKind::Element)
    }
}

impl Parse for DibSuppSvcFamilies {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("DIBSuppSvcFamilies", ContextKind::Element)?;
        let structure_length = rb.read_u8("structureLength", 8)?;
        let description_type = rb.read_u8("descriptionType", 8)?;
        let items_length = usize::from(structure_length)
            .checked_sub(2)
            .ok_or_else(|| {
                CodecError::invalid_value(format!("structure length {structure_length} below 2"))
            })
            .parsing("structureLength")?;
        let service_ids = read_length_array(rb, "serviceIds", items_length, |rb| {
            ServiceId::parse(rb, ())
        })?;
        rb.close_context("DIBSuppSvcFamilies", ContextKind::Element)?;
        Ok(Self {
            description_type,
            service_ids,
        })
    }
}

/// Connection request information: what kind of connection a client asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRequestInformation {
    /// `0x03` device management connection.
    DeviceManagement,
    /// `0x04` tunnel connection on the given layer.
    TunnelConnection {
        /// Tunnel layer.
        knx_layer: KnxLayer,
    },
}

impl ConnectionRequestInformation {
    /// Wire discriminator.
    pub fn connection_type(&self) -> u8 {
        match self {
            ConnectionRequestInformation::DeviceManagement => 0x03,
            ConnectionRequestInformation::TunnelConnection { .. } => 0x04,
        }
    }
}

impl Message for ConnectionRequestInformation {
    fn type_name(&self) -> &'static str {
        "ConnectionRequestInformation"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            ConnectionRequestInformation::DeviceManagement => 0,
            ConnectionRequestInformation::TunnelConnection { .. } => 8 + 8,
        };
        8 + 8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ConnectionRequestInformation", ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", self.length_in_bytes())?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("connectionType", 8, self.connection_type())?;
        match self {
            ConnectionRequestInformation::DeviceManagement => {
                write_variant(wb, "ConnectionRequestInformationDeviceManagement", |_| Ok(()))?
            }
            ConnectionRequestInformation::TunnelConnection { knx_layer } => write_variant(
                wb,
                "ConnectionRequestInformationTunnelConnection",
                |wb| {
                    write_enum(wb, "knxLayer", *knx_layer)?;
                    write_reserved(wb, "reserved", 8, 0x00)
                },
            )?,
        }
        wb.pop_context("ConnectionRequestInformation", ContextKind::Element)
    }
}

impl Parse for ConnectionRequestInformation {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ConnectionRequestInformation", ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let connection_type = rb.read_u8("connectionType", 8)?;
        let value = match connection_type {
            0x03 => read_variant(rb, "ConnectionRequestInformationDeviceManagement", |_| {
                Ok(ConnectionRequestInformation::DeviceManagement)
            })?,
            0x04 => read_variant(rb, "ConnectionRequestInformationTunnelConnection", |rb| {
                let knx_layer = read_enum(rb, "knxLayer")?;
                read_reserved(rb, "reserved", 8, 0x00)?;
                Ok(ConnectionRequestInformation::TunnelConnection { knx_layer })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "ConnectionRequestInformation",
                    format!("connectionType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("ConnectionRequestInformation", ContextKind::Element)?;
        Ok(value)
    }
}

/// Connection response data block: what the server granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionResponseDataBlock {
    /// `0x03` device management connection.
    DeviceManagement,
    /// `0x04` tunnel connection with the individual address assigned to it.
    TunnelConnection {
        /// Address the server assigned to the tunnel.
        knx_address: KnxAddress,
    },
}

impl ConnectionResponseDataBlock {
    /// Wire discriminator.
    pub fn connection_type(&self) -> u8 {
        match self {
            ConnectionResponseDataBlock::DeviceManagement => 0x03,
            ConnectionResponseDataBlock::TunnelConnection { .. } => 0x04,
        }
    }
}

impl Message for ConnectionResponseDataBlock {
    fn type_name(&self) -> &'static str {
        "ConnectionResponseDataBlock"
    }

    fn length_in_bits(&self) -> usize {
        let own = match self {
            ConnectionResponseDataBlock::DeviceManagement => 0,
            ConnectionResponseDataBlock::TunnelConnection { knx_address } => {
                knx_address.length_in_bits()
            }
        };
        8 + 8 + own
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("ConnectionResponseDataBlock", ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", self.length_in_bytes())?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("connectionType", 8, self.connection_type())?;
        match self {
            ConnectionResponseDataBlock::DeviceManagement => {
                write_variant(wb, "ConnectionResponseDataBlockDeviceManagement", |_| Ok(()))?
            }
            ConnectionResponseDataBlock::TunnelConnection { knx_address } => write_variant(
                wb,
                "ConnectionResponseDataBlockTunnelConnection",
                |wb| write_simple(wb, "knxAddress", knx_address),
            )?,
        }
        wb.pop_context("ConnectionResponseDataBlock", ContextKind::Element)
    }
}

impl Parse for ConnectionResponseDataBlock {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("ConnectionResponseDataBlock", ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let connection_type = rb.read_u8("connectionType", 8)?;
        let value = match connection_type {
            0x03 => read_variant(rb, "ConnectionResponseDataBlockDeviceManagement", |_| {
                Ok(ConnectionResponseDataBlock::DeviceManagement)
            })?,
            0x04 => read_variant(rb, "ConnectionResponseDataBlockTunnelConnection", |rb| {
                let knx_address = read_simple(rb, "knxAddress", ())?;
                Ok(ConnectionResponseDataBlock::TunnelConnection { knx_address })
            })?,
            other => {
                return Err(CodecError::unsupported(
                    "ConnectionResponseDataBlock",
                    format!("connectionType=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("ConnectionResponseDataBlock", ContextKind::Element)?;
        Ok(value)
    }
}

/// Connection header of tunnelling and device configuration requests.
///
/// The same four octets appear under two names, so the XML type name is
/// carried alongside the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestDataBlock {
    /// Channel the request belongs to.
    pub communication_channel_id: u8,
    /// Per-channel sequence number.
    pub sequence_counter: u8,
}

impl RequestDataBlock {
    fn serialize_as(&self, wb: &mut dyn WriteBuffer, type_name: &str) -> Result<()> {
        wb.push_context(type_name, ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", 4)?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("communicationChannelId", 8, self.communication_channel_id)?;
        wb.write_u8("sequenceCounter", 8, self.sequence_counter)?;
        write_reserved(wb, "reserved", 8, 0x00)?;
        wb.pop_context(type_name, ContextKind::Element)
    }

    fn parse_as(rb: &mut dyn ReadBuffer, type_name: &str) -> Result<Self> {
        rb.pull_context(type_name, ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let communication_channel_id = rb.read_u8("communicationChannelId", 8)?;
        let sequence_counter = rb.read_u8("sequenceCounter", 8)?;
        read_reserved(rb, "reserved", 8, 0x00)?;
        rb.close_context(type_name, ContextKind::Element)?;
        Ok(Self {
            communication_channel_id,
            sequence_counter,
        })
    }
}

/// Connection header of tunnelling and device configuration acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckDataBlock {
    /// Channel the acknowledgement belongs to.
    pub communication_channel_id: u8,
    /// Sequence number being acknowledged.
    pub sequence_counter: u8,
    /// Outcome.
    pub status: Status,
}

impl AckDataBlock {
    fn serialize_as(&self, wb: &mut dyn WriteBuffer, type_name: &str) -> Result<()> {
        wb.push_context(type_name, ContextKind::Element)?;
        let structure_length = implicit_length("structureLength", 4)?;
        wb.write_u8("structureLength", 8, structure_length)?;
        wb.write_u8("communicationChannelId", 8, self.communication_channel_id)?;
        wb.write_u8("sequenceCounter", 8, self.sequence_counter)?;
        write_enum(wb, "status", self.status)?;
        wb.pop_context(type_name, ContextKind::Element)
    }

    fn parse_as(rb: &mut dyn ReadBuffer, type_name: &str) -> Result<Self> {
        rb.pull_context(type_name, ContextKind::Element)?;
        let _structure_length = rb.read_u8("structureLength", 8)?;
        let communication_channel_id = rb.read_u8("communicationChannelId", 8)?;
        let sequence_counter = rb.read_u8("sequenceCounter", 8)?;
        let status = read_enum(rb, "status")?;
        rb.close_context(type_name, ContextKind::Element)?;
        Ok(Self {
            communication_channel_id,
            sequence_counter,
            status,
        })
    }
}

macro_rules! data_block {
    ($name:ident, $inner:ident, $type_name:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub $inner);

        impl std::ops::Deref for $name {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl Message for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn length_in_bits(&self) -> usize {
                32
            }

            fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
                self.0.serialize_as(wb, $type_name)
            }
        }

        impl Parse for $name {
            type Args = ();

            fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
                $inner::parse_as(rb, $type_name).map($name)
            }
        }
    };
}

data_block!(
    TunnelingRequestDataBlock,
    RequestDataBlock,
    "TunnelingRequestDataBlock",
    "Connection header of a tunnelling request."
);
data_block!(
    TunnelingResponseDataBlock,
    AckDataBlock,
    "TunnelingResponseDataBlock",
    "Connection header of a tunnelling acknowledgement."
);
data_block!(
    DeviceConfigurationRequestDataBlock,
    RequestDataBlock,
    "DeviceConfigurationRequestDataBlock",
    "Connection header of a device configuration request."
);
data_block!(
    DeviceConfigurationAckDataBlock,
    AckDataBlock,
    "DeviceConfigurationAckDataBlock",
    "Connection header of a device configuration acknowledgement."
);
