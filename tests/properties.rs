//! Laws that hold for every well-formed message, checked on generated input.

use std::net::Ipv4Addr;

use plc4x_codec::bacnetip::{Bvlc, Npdu, NpduAddress, NpduNetworkPriority};
use plc4x_codec::knxnetip::{Hpai, KnxAddress, KnxNetIpMessage};
use plc4x_codec::modbus::{ModbusPdu, ModbusTcpAdu};
use plc4x_codec::s7::{MemoryArea, S7Address, TpktPacket, TransportSize};
use plc4x_codec::{
    Message, Parse, ReadBuffer, ReadBufferByteBased, WriteBuffer, WriteBufferByteBased,
};
use proptest::prelude::*;

fn modbus_request() -> impl Strategy<Value = ModbusPdu> {
    prop_oneof![
        (any::<u16>(), 1..2000u16).prop_map(|(starting_address, quantity)| {
            ModbusPdu::ReadCoilsRequest {
                starting_address,
                quantity,
            }
        }),
        (any::<u16>(), 1..125u16).prop_map(|(starting_address, quantity)| {
            ModbusPdu::ReadHoldingRegistersRequest {
                starting_address,
                quantity,
            }
        }),
        (any::<u16>(), any::<u16>())
            .prop_map(|(address, value)| ModbusPdu::WriteSingleRegisterRequest { address, value }),
        (any::<u16>(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(
            |(starting_address, value)| ModbusPdu::WriteMultipleHoldingRegistersRequest {
                starting_address,
                quantity: (value.len() / 2) as u16,
                value,
            }
        ),
        (any::<u16>(), any::<u16>(), any::<u16>()).prop_map(
            |(reference_address, and_mask, or_mask)| ModbusPdu::MaskWriteHoldingRegisterRequest {
                reference_address,
                and_mask,
                or_mask,
            }
        ),
        Just(ModbusPdu::ReadExceptionStatusRequest),
    ]
}

fn knx_address() -> impl Strategy<Value = KnxAddress> {
    (0..16u8, 0..16u8, any::<u8>()).prop_map(|(main, middle, sub)| KnxAddress::new(main, middle, sub))
}

fn npdu_address() -> impl Strategy<Value = NpduAddress> {
    (any::<u16>(), prop::collection::vec(any::<u8>(), 0..8))
        .prop_map(|(network, address)| NpduAddress { network, address })
}

fn npdu() -> impl Strategy<Value = Npdu> {
    (
        any::<bool>(),
        0..4u8,
        prop::option::of((npdu_address(), any::<u8>())),
        prop::option::of(npdu_address()),
        prop::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(expecting_reply, priority, destination, source, apdu)| {
            let (destination, hop_count) = match destination {
                Some((address, hops)) => (Some(address), Some(hops)),
                None => (None, None),
            };
            Npdu {
                expecting_reply,
                network_priority: NpduNetworkPriority::from_repr(priority)
                    .unwrap_or_default(),
                destination,
                source,
                hop_count,
                ..Npdu::apdu(apdu)
            }
        })
}

fn s7_address() -> impl Strategy<Value = S7Address> {
    (
        prop::sample::select(vec![
            TransportSize::Bool,
            TransportSize::Byte,
            TransportSize::Word,
            TransportSize::Dint,
            TransportSize::Real,
        ]),
        any::<u16>(),
        any::<u16>(),
        prop::sample::select(vec![
            MemoryArea::Inputs,
            MemoryArea::Outputs,
            MemoryArea::FlagsMarkers,
            MemoryArea::DataBlocks,
        ]),
        any::<u16>(),
        0..8u8,
    )
        .prop_map(
            |(transport_size, number_of_elements, db_number, area, byte_address, bit_address)| {
                S7Address {
                    transport_size,
                    number_of_elements,
                    db_number,
                    area,
                    byte_address,
                    bit_address,
                }
            },
        )
}

fn round_trips<T>(message: &T, args: T::Args) -> Result<(), TestCaseError>
where
    T: Message + Parse + PartialEq + std::fmt::Debug,
{
    let bytes = message.to_bytes().unwrap();
    prop_assert_eq!(bytes.len() * 8, message.length_in_bits());
    prop_assert_eq!(&T::from_bytes(&bytes, args).unwrap(), message);

    let xml = message.to_xml().unwrap();
    prop_assert_eq!(&T::from_xml(&xml, args).unwrap(), message);
    Ok(())
}

proptest! {
    #[test]
    fn prop_bit_fields_pack_msb_first(
        fields in prop::collection::vec((1..=64u8, any::<u64>()), 1..24)
    ) {
        let fields: Vec<(u8, u64)> = fields
            .into_iter()
            .map(|(bits, value)| (bits, if bits == 64 { value } else { value & ((1 << bits) - 1) }))
            .collect();

        let mut wb = WriteBufferByteBased::new();
        for (bits, value) in &fields {
            wb.write_uint("value", *bits, *value).unwrap();
        }
        let total: usize = fields.iter().map(|(bits, _)| usize::from(*bits)).sum();
        let bytes = wb.into_bytes();
        prop_assert_eq!(bytes.len(), total.div_ceil(8));

        let mut rb = ReadBufferByteBased::new(&bytes);
        for (bits, value) in &fields {
            prop_assert_eq!(rb.read_uint("value", *bits).unwrap(), *value);
        }
        prop_assert_eq!(rb.bit_pos(), total);
    }

    #[test]
    fn prop_signed_fields_sign_extend(bits in 2..=64u8, value in any::<i64>()) {
        let shift = 64 - u32::from(bits);
        let value = (value << shift) >> shift;
        let mut wb = WriteBufferByteBased::new();
        wb.write_int("value", bits, value).unwrap();
        let bytes = wb.into_bytes();
        let mut rb = ReadBufferByteBased::new(&bytes);
        prop_assert_eq!(rb.read_int("value", bits).unwrap(), value);
    }

    #[test]
    fn prop_modbus_tcp(transaction in any::<u16>(), unit in any::<u8>(), pdu in modbus_request()) {
        let adu = ModbusTcpAdu {
            transaction_identifier: transaction,
            unit_identifier: unit,
            pdu,
        };
        round_trips(&adu, false)?;
    }

    #[test]
    fn prop_knx_address(address in knx_address()) {
        round_trips(&address, ())?;
    }

    #[test]
    fn prop_knx_search_request(ip in any::<[u8; 4]>(), port in any::<u16>()) {
        let message = KnxNetIpMessage::SearchRequest {
            hpai_ip_discovery_endpoint: Hpai::udp(Ipv4Addr::from(ip), port),
        };
        round_trips(&message, ())?;
    }

    #[test]
    fn prop_s7_address(address in s7_address()) {
        round_trips(&address, ())?;
    }

    #[test]
    fn prop_bvlc_unicast(npdu in npdu()) {
        round_trips(&Bvlc::OriginalUnicastNpdu { npdu }, ())?;
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = ModbusTcpAdu::from_bytes(&bytes, false);
        let _ = ModbusTcpAdu::from_bytes(&bytes, true);
        let _ = KnxNetIpMessage::from_bytes(&bytes, ());
        let _ = TpktPacket::from_bytes(&bytes, ());
        let _ = Bvlc::from_bytes(&bytes, ());
    }
}
