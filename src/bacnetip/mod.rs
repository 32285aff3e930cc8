//! BACnet/IP: the BVLC frame header and the NPDU network layer it carries.
//! Application PDUs stay opaque bytes.
//!
//! ```
//! use plc4x_codec::bacnetip::{Bvlc, Npdu, NpduAddress};
//! use plc4x_codec::{Message, Parse};
//!
//! let who_is = Bvlc::OriginalBroadcastNpdu {
//!     npdu: Npdu {
//!         destination: Some(NpduAddress::global_broadcast()),
//!         hop_count: Some(255),
//!         ..Npdu::apdu(vec![0x10, 0x08])
//!     },
//! };
//! let bytes = who_is.to_bytes().unwrap();
//! assert_eq!(bytes, [0x81, 0x0B, 0x00, 0x0C, 0x01, 0x20, 0xFF, 0xFF, 0x00, 0xFF, 0x10, 0x08]);
//! assert_eq!(Bvlc::from_bytes(&bytes, ()).unwrap(), who_is);
//! ```

pub mod bvlc;
pub mod npdu;
pub mod types;

pub use bvlc::{Bvlc, BVLC_HEADER_LENGTH, BVLC_TYPE};
pub use npdu::{Nlm, Npdu, NpduAddress, NpduBody, NPDU_PROTOCOL_VERSION};
pub use types::{BvlcResultCode, NpduNetworkPriority};
