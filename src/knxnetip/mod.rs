//! KNXnet/IP: the IP tunnelling, routing and device management frames of
//! KNX building automation, and the cEMI frames they carry.
//!
//! ```
//! use std::net::Ipv4Addr;
//! use plc4x_codec::knxnetip::{Hpai, KnxNetIpMessage};
//! use plc4x_codec::Message;
//!
//! let search = KnxNetIpMessage::SearchRequest {
//!     hpai_ip_discovery_endpoint: Hpai::udp(Ipv4Addr::new(224, 0, 23, 12), 3671),
//! };
//! let bytes = search.to_bytes().unwrap();
//! assert_eq!(&bytes[..6], &[0x06, 0x10, 0x02, 0x01, 0x00, 0x0E]);
//! ```

pub mod cemi;
pub mod message;
pub mod structures;
pub mod types;

pub use cemi::{
    Cemi, CemiAdditionalInformation, CemiFrame, CemiFrameBody, CemiFrameData, CemiFrameDataExt,
    LBusmon, LData, PropertyAccess, Tpdu,
};
pub use message::{KnxNetIpMessage, HEADER_LENGTH, PROTOCOL_VERSION};
pub use structures::{
    AckDataBlock, ConnectionRequestInformation, ConnectionResponseDataBlock,
    DeviceConfigurationAckDataBlock, DeviceConfigurationRequestDataBlock, DeviceStatus,
    DibDeviceInfo, DibSuppSvcFamilies, Hpai, KnxAddress, ProjectInstallationIdentifier,
    RequestDataBlock, ServiceId, TunnelingRequestDataBlock, TunnelingResponseDataBlock,
};
pub use types::{Apci, CemiPriority, HostProtocolCode, KnxLayer, KnxMedium, Status, Tpci};
