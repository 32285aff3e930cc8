//! BACnet virtual link control (Annex J): the BACnet/IP frame header.

use std::net::Ipv4Addr;

use super::npdu::Npdu;
use super::types::BvlcResultCode;
use crate::buffer::{ContextKind, ReadBuffer, WriteBuffer};
use crate::error::{CodecError, Result, ResultExt};
use crate::field::{
    implicit_length, read_const, read_enum, read_ipv4, read_simple, read_variant, write_const,
    write_enum, write_ipv4, write_simple, write_variant,
};
use crate::message::{Message, Parse};

/// Type octet of BACnet/IP.
pub const BVLC_TYPE: u8 = 0x81;

/// Size of the BVLC header in bytes.
pub const BVLC_HEADER_LENGTH: usize = 4;

/// A BACnet/IP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bvlc {
    /// `0x00` outcome of a BBMD request.
    Result {
        /// Outcome.
        code: BvlcResultCode,
    },
    /// `0x04` broadcast relayed by a BBMD with its original sender.
    ForwardedNpdu {
        /// Address of the original sender.
        ip: Ipv4Addr,
        /// UDP port of the original sender.
        port: u16,
        /// Relayed NPDU.
        npdu: Npdu,
    },
    /// `0x05` registration of a foreign device with a BBMD.
    RegisterForeignDevice {
        /// Seconds the registration stays valid.
        ttl: u16,
    },
    /// `0x08` removal of an entry from the foreign device table.
    DeleteForeignDeviceTableEntry {
        /// Address of the entry.
        ip: Ipv4Addr,
        /// UDP port of the entry.
        port: u16,
    },
    /// `0x09` broadcast a foreign device asks a BBMD to distribute.
    DistributeBroadcastToNetwork {
        /// NPDU to distribute.
        npdu: Npdu,
    },
    /// `0x0A` unicast NPDU.
    OriginalUnicastNpdu {
        /// Carried NPDU.
        npdu: Npdu,
    },
    /// `0x0B` local broadcast NPDU.
    OriginalBroadcastNpdu {
        /// Carried NPDU.
        npdu: Npdu,
    },
}

impl Bvlc {
    /// Wire discriminator.
    pub fn bvlc_function(&self) -> u8 {
        match self {
            Bvlc::Result { .. } => 0x00,
            Bvlc::ForwardedNpdu { .. } => 0x04,
            Bvlc::RegisterForeignDevice { .. } => 0x05,
            Bvlc::DeleteForeignDeviceTableEntry { .. } => 0x08,
            Bvlc::DistributeBroadcastToNetwork { .. } => 0x09,
            Bvlc::OriginalUnicastNpdu { .. } => 0x0A,
            Bvlc::OriginalBroadcastNpdu { .. } => 0x0B,
        }
    }

    /// The carried NPDU, if the frame has one.
    pub fn npdu(&self) -> Option<&Npdu> {
        match self {
            Bvlc::ForwardedNpdu { npdu, .. }
            | Bvlc::DistributeBroadcastToNetwork { npdu }
            | Bvlc::OriginalUnicastNpdu { npdu }
            | Bvlc::OriginalBroadcastNpdu { npdu } => Some(npdu),
            Bvlc::Result { .. }
            | Bvlc::RegisterForeignDevice { .. }
            | Bvlc::DeleteForeignDeviceTableEntry { .. } => None,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Bvlc::Result { .. } => "BVLCResult",
            Bvlc::ForwardedNpdu { .. } => "BVLCForwardedNPDU",
            Bvlc::RegisterForeignDevice { .. } => "BVLCRegisterForeignDevice",
            Bvlc::DeleteForeignDeviceTableEntry { .. } => "BVLCDeleteForeignDeviceTableEntry",
            Bvlc::DistributeBroadcastToNetwork { .. } => "BVLCDistributeBroadcastToNetwork",
            Bvlc::OriginalUnicastNpdu { .. } => "BVLCOriginalUnicastNPDU",
            Bvlc::OriginalBroadcastNpdu { .. } => "BVLCOriginalBroadcastNPDU",
        }
    }

    fn own_length_in_bits(&self) -> usize {
        match self {
            Bvlc::Result { .. } | Bvlc::RegisterForeignDevice { .. } => 16,
            Bvlc::ForwardedNpdu { npdu, .. } => 32 + 16 + npdu.length_in_bits(),
            Bvlc::DeleteForeignDeviceTableEntry { .. } => 32 + 16,
            Bvlc::DistributeBroadcastToNetwork { npdu }
            | Bvlc::OriginalUnicastNpdu { npdu }
            | Bvlc::OriginalBroadcastNpdu { npdu } => npdu.length_in_bits(),
        }
    }

    fn serialize_fields(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        match self {
            Bvlc::Result { code } => write_enum(wb, "code", *code),
            Bvlc::ForwardedNpdu { ip, port, npdu } => {
                write_ipv4(wb, "ip", *ip)?;
                wb.write_u16("port", 16, *port)?;
                write_simple(wb, "npdu", npdu)
            }
            Bvlc::RegisterForeignDevice { ttl } => wb.write_u16("ttl", 16, *ttl),
            Bvlc::DeleteForeignDeviceTableEntry { ip, port } => {
                write_ipv4(wb, "ip", *ip)?;
                wb.write_u16("port", 16, *port)
            }
            Bvlc::DistributeBroadcastToNetwork { npdu }
            | Bvlc::OriginalUnicastNpdu { npdu }
            | Bvlc::OriginalBroadcastNpdu { npdu } => write_simple(wb, "npdu", npdu),
        }
    }
}

fn npdu_length(bvlc_length: u16, header: usize) -> Result<usize> {
    usize::from(bvlc_length)
        .checked_sub(header)
        .ok_or_else(|| {
            CodecError::invalid_value(format!(
                "length {bvlc_length} is shorter than the {header} byte header"
            ))
        })
        .parsing("bvlcLength")
}

impl Message for Bvlc {
    fn type_name(&self) -> &'static str {
        "BVLC"
    }

    fn length_in_bits(&self) -> usize {
        8 + 8 + 16 + self.own_length_in_bits()
    }

    fn serialize(&self, wb: &mut dyn WriteBuffer) -> Result<()> {
        wb.push_context("BVLC", ContextKind::Element)?;
        write_const(wb, "bvlcType", 8, u64::from(BVLC_TYPE))?;
        wb.write_u8("bvlcFunction", 8, self.bvlc_function())?;
        let bvlc_length: u16 = implicit_length("bvlcLength", self.length_in_bytes())?;
        wb.write_u16("bvlcLength", 16, bvlc_length)?;
        write_variant(wb, self.variant_name(), |wb| self.serialize_fields(wb))?;
        wb.pop_context("BVLC", ContextKind::Element)
    }
}

impl Parse for Bvlc {
    type Args = ();

    fn parse(rb: &mut dyn ReadBuffer, _args: ()) -> Result<Self> {
        rb.pull_context("BVLC", ContextKind::Element)?;
        read_const(rb, "bvlcType", 8, u64::from(BVLC_TYPE))?;
        let bvlc_function = rb.read_u8("bvlcFunction", 8)?;
        let bvlc_length = rb.read_u16("bvlcLength", 16)?;
        let value = match bvlc_function {
            0x00 => read_variant(rb, "BVLCResult", |rb| {
                Ok(Bvlc::Result {
                    code: read_enum(rb, "code")?,
                })
            })?,
            0x04 => {
                let length = npdu_length(bvlc_length, BVLC_HEADER_LENGTH + 6)?;
                read_variant(rb, "BVLCForwardedNPDU", |rb| {
                    Ok(Bvlc::ForwardedNpdu {
                        ip: read_ipv4(rb, "ip")?,
                        port: rb.read_u16("port", 16)?,
                        npdu: read_simple(rb, "npdu", length)?,
                    })
                })?
            }
            0x05 => read_variant(rb, "BVLCRegisterForeignDevice", |rb| {
                Ok(Bvlc::RegisterForeignDevice {
                    ttl: rb.read_u16("ttl", 16)?,
                })
            })?,
            0x08 => read_variant(rb, "BVLCDeleteForeignDeviceTableEntry", |rb| {
                Ok(Bvlc::DeleteForeignDeviceTableEntry {
                    ip: read_ipv4(rb, "ip")?,
                    port: rb.read_u16("port", 16)?,
                })
            })?,
            0x09 => {
                let length = npdu_length(bvlc_length, BVLC_HEADER_LENGTH)?;
                read_variant(rb, "BVLCDistributeBroadcastToNetwork", |rb| {
                    Ok(Bvlc::DistributeBroadcastToNetwork {
                        npdu: read_simple(rb, "npdu", length)?,
                    })
                })?
            }
            0x0A => {
                let length = npdu_length(bvlc_length, BVLC_HEADER_LENGTH)?;
                read_variant(rb, "BVLCOriginalUnicastNPDU", |rb| {
                    Ok(Bvlc::OriginalUnicastNpdu {
                        npdu: read_simple(rb, "npdu", length)?,
                    })
                })?
            }
            0x0B => {
                let length = npdu_length(bvlc_length, BVLC_HEADER_LENGTH)?;
                read_variant(rb, "BVLCOriginalBroadcastNPDU", |rb| {
                    Ok(Bvlc::OriginalBroadcastNpdu {
                        npdu: read_simple(rb, "npdu", length)?,
                    })
                })?
            }
            other => {
                return Err(CodecError::unsupported(
                    "BVLC",
                    format!("bvlcFunction=0x{other:02X}"),
                ))
            }
        };
        rb.close_context("BVLC", ContextKind::Element)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacnetip::npdu::{Nlm, NpduBody};
    use pretty_assertions::assert_eq;

    fn round_trip(hex: &str) -> Bvlc {
        let bytes = hex::decode(hex).unwrap();
        let bvlc = Bvlc::from_bytes(&bytes, ()).unwrap();
        assert_eq!(bvlc.to_bytes().unwrap(), bytes);
        assert_eq!(bvlc.length_in_bytes(), bytes.len());
        bvlc
    }

    fn i_am_router() -> Npdu {
        Npdu::nlm(Nlm::IAmRouterToNetwork {
            destination_network_addresses: vec![1, 2, 3],
        })
    }

    #[test]
    fn test_result() {
        assert_eq!(
            round_trip("810000060000"),
            Bvlc::Result {
                code: BvlcResultCode::SuccessfulCompletion
            }
        );
        assert_eq!(
            round_trip("810000060010"),
            Bvlc::Result {
                code: BvlcResultCode::WriteBroadcastDistributionTableNak
            }
        );
    }

    #[test]
    fn test_forwarded_npdu() {
        let bvlc = round_trip("81040013c0a80001bac0018001000100020003");
        assert_eq!(
            bvlc,
            Bvlc::ForwardedNpdu {
                ip: Ipv4Addr::new(192, 168, 0, 1),
                port: 47808,
                npdu: i_am_router(),
            }
        );
    }

    #[test]
    fn test_register_foreign_device() {
        assert_eq!(
            round_trip("81050006001e"),
            Bvlc::RegisterForeignDevice { ttl: 30 }
        );
    }

    #[test]
    fn test_delete_foreign_device_table_entry() {
        assert_eq!(
            round_trip("8108000ac0a8000bbac0"),
            Bvlc::DeleteForeignDeviceTableEntry {
                ip: Ipv4Addr::new(192, 168, 0, 11),
                port: 47808,
            }
        );
    }

    #[test]
    fn test_distribute_broadcast_to_network() {
        let bvlc = round_trip("8109000d018001000100020003");
        assert_eq!(bvlc.npdu(), Some(&i_am_router()));
    }

    #[test]
    fn test_original_broadcast_who_is() {
        let bvlc = round_trip("810b000c0120ffff00ff1008");
        let npdu = bvlc.npdu().unwrap();
        assert_eq!(npdu.body, NpduBody::Apdu(vec![0x10, 0x08]));
    }

    #[test]
    fn test_original_unicast() {
        let bvlc = Bvlc::OriginalUnicastNpdu {
            npdu: Npdu::apdu(vec![0x10, 0x08]),
        };
        assert_eq!(
            bvlc.to_bytes().unwrap(),
            hex::decode("810a000801001008").unwrap()
        );
    }

    #[test]
    fn test_wrong_type() {
        let bytes = hex::decode("820000060000").unwrap();
        let err = Bvlc::from_bytes(&bytes, ()).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::ConstantMismatch {
                expected: 0x81,
                actual: 0x82
            }
        ));
    }

    #[test]
    fn test_length_shorter_than_header() {
        let bytes = hex::decode("810a00020100").unwrap();
        let err = Bvlc::from_bytes(&bytes, ()).unwrap_err();
        assert_eq!(err.field_path().as_deref(), Some("'bvlcLength'"));
    }

    #[test]
    fn test_unknown_function() {
        let bytes = hex::decode("81ff0004").unwrap();
        let err = Bvlc::from_bytes(&bytes, ()).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CodecError::UnsupportedVariant { type_name: "BVLC", .. }
        ));
    }

    #[test]
    fn test_xml_round_trip() {
        let bvlc = Bvlc::ForwardedNpdu {
            ip: Ipv4Addr::new(10, 0, 0, 7),
            port: 47808,
            npdu: i_am_router(),
        };
        let xml = bvlc.to_xml().unwrap();
        assert!(xml.contains("<BVLCForwardedNPDU>"));
        assert!(xml.contains("<destinationNetworkAddress isList=\"true\">"));
        assert_eq!(Bvlc::from_xml(&xml, ()).unwrap(), bvlc);
    }
}
