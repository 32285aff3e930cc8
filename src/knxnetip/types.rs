//! Closed value sets used by KNXnet/IP and cEMI.

use strum::{FromRepr, IntoStaticStr};

use crate::field::wire_enum;

/// Transport of an HPAI endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HostProtocolCode {
    /// IPv4 over UDP.
    Ipv4Udp = 0x01,
    /// IPv4 over TCP.
    Ipv4Tcp = 0x02,
}
wire_enum!(HostProtocolCode, u8, 8);

/// Result codes carried by connection management responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Success.
    NoError = 0x00,
    /// The requested host protocol is not supported.
    ProtocolTypeNotSupported = 0x01,
    /// The requested protocol version is not supported.
    UnsupportedProtocolVersion = 0x02,
    /// A sequence number arrived out of order.
    OutOfOrderSequenceNumber = 0x04,
    /// No active connection with the given channel id.
    InvalidConnectionId = 0x21,
    /// The requested connection type is not supported.
    ConnectionTypeNotSupported = 0x22,
    /// One of the requested connection options is not supported.
    ConnectionOptionNotSupported = 0x23,
    /// The server cannot accept another connection.
    NoMoreConnections = 0x24,
    /// The server has no free individual address for the tunnel.
    NoMoreUniqueConnections = 0x25,
    /// Error on the data connection.
    DataConnection = 0x26,
    /// Error on the KNX subnetwork connection.
    KnxConnection = 0x27,
    /// The requested tunnelling layer is not supported.
    TunnellingLayerNotSupported = 0x29,
}
wire_enum!(Status, u8, 8);

/// Physical KNX medium of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KnxMedium {
    /// Reserved.
    MediumReserved1 = 0x01,
    /// Twisted pair.
    MediumTp1 = 0x02,
    /// Power line 110.
    MediumPl110 = 0x04,
    /// Reserved.
    MediumReserved2 = 0x08,
    /// Radio frequency.
    MediumRf = 0x10,
    /// KNX over IP.
    MediumKnxIp = 0x20,
}
wire_enum!(KnxMedium, u8, 8);

/// Layer a tunnel connection attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KnxLayer {
    /// Data link layer tunnel.
    TunnelLinkLayer = 0x02,
    /// Raw tunnel.
    TunnelRaw = 0x04,
    /// Bus monitor tunnel.
    TunnelBusmonitor = 0x80,
}
wire_enum!(KnxLayer, u8, 8);

/// Frame priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CemiPriority {
    /// System priority.
    System = 0x0,
    /// Normal priority.
    Normal = 0x1,
    /// Urgent priority.
    Urgent = 0x2,
    /// Low priority.
    Low = 0x3,
}
wire_enum!(CemiPriority, u8, 2, "CEMIPriority");

/// Transport layer control information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tpci {
    /// T_Data_Broadcast, T_Data_Group or T_Data_Individual.
    UnnumberedDataPacket = 0x0,
    /// T_Data_Connected.
    NumberedDataPacket = 0x1,
    /// T_Connect or T_Disconnect.
    UnnumberedControlData = 0x2,
    /// T_ACK or T_NAK.
    NumberedControlData = 0x3,
}
wire_enum!(Tpci, u8, 2, "TPCI");

/// Application layer service, upper four bits of the APCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Apci {
    #[allow(missing_docs)]
    GroupValueReadPdu = 0x0,
    #[allow(missing_docs)]
    GroupValueResponsePdu = 0x1,
    #[allow(missing_docs)]
    GroupValueWritePdu = 0x2,
    #[allow(missing_docs)]
    IndividualAddressWritePdu = 0x3,
    #[allow(missing_docs)]
    IndividualAddressReadPdu = 0x4,
    #[allow(missing_docs)]
    IndividualAddressResponsePdu = 0x5,
    #[allow(missing_docs)]
    AdcReadPdu = 0x6,
    #[allow(missing_docs)]
    AdcResponsePdu = 0x7,
    #[allow(missing_docs)]
    MemoryReadPdu = 0x8,
    #[allow(missing_docs)]
    MemoryResponsePdu = 0x9,
    #[allow(missing_docs)]
    MemoryWritePdu = 0xA,
    #[allow(missing_docs)]
    UserMessagePdu = 0xB,
    #[allow(missing_docs)]
    DeviceDescriptorReadPdu = 0xC,
    #[allow(missing_docs)]
    DeviceDescriptorResponsePdu = 0xD,
    #[allow(missing_docs)]
    RestartPdu = 0xE,
    #[allow(missing_docs)]
    OtherPdu = 0xF,
}
wire_enum!(Apci, u8, 4, "APCI");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::WireEnum;

    #[test]
    fn test_status_names() {
        assert_eq!(Status::NoError.name(), "NO_ERROR");
        assert_eq!(Status::from_value(0x29), Some(Status::TunnellingLayerNotSupported));
        assert_eq!(Status::from_value(0x03), None);
    }

    #[test]
    fn test_apci_is_total() {
        for value in 0..16u64 {
            assert_eq!(Apci::from_value(value).map(WireEnum::value), Some(value));
        }
    }

    #[test]
    fn test_host_protocol_code() {
        assert_eq!(HostProtocolCode::Ipv4Udp.name(), "IPV4_UDP");
        assert_eq!(HostProtocolCode::BIT_LENGTH, 8);
    }
}
