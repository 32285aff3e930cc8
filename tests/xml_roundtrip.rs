//! Both backends run the same parse and serialize code, so a message must
//! survive a trip through either and agree on its length.

use std::fmt::Debug;
use std::net::Ipv4Addr;

use plc4x_codec::bacnetip::{Bvlc, Nlm, Npdu, NpduAddress, NpduNetworkPriority};
use plc4x_codec::knxnetip::{
    ConnectionRequestInformation, Hpai, KnxLayer, KnxNetIpMessage, Status,
};
use plc4x_codec::modbus::{ModbusErrorCode, ModbusPdu, ModbusTcpAdu};
use plc4x_codec::s7::{
    CotpPacket, CotpParameter, CotpProtocolClass, CotpTpdu, CotpTpduSize, TpktPacket,
};
use plc4x_codec::{Message, Parse, XmlOptions};
use pretty_assertions::assert_eq;

fn check<T>(message: &T, args: T::Args)
where
    T: Message + Parse + PartialEq + Debug,
{
    let bytes = message.to_bytes().unwrap();
    assert_eq!(bytes.len() * 8, message.length_in_bits());
    assert_eq!(&T::from_bytes(&bytes, args).unwrap(), message);

    let xml = message.to_xml().unwrap();
    let from_xml = T::from_xml(&xml, args).unwrap();
    assert_eq!(&from_xml, message);
    assert_eq!(from_xml.to_bytes().unwrap(), bytes);

    let bare = XmlOptions {
        render_attributes: false,
        validate_attributes: false,
        ..XmlOptions::default()
    };
    let xml = message.to_xml_with(bare).unwrap();
    assert!(!xml.contains("bitLength"));
    assert_eq!(&T::from_xml_with(&xml, args, bare).unwrap(), message);
}

#[test]
fn test_modbus() {
    check(
        &ModbusTcpAdu {
            transaction_identifier: 0x1234,
            unit_identifier: 1,
            pdu: ModbusPdu::WriteMultipleHoldingRegistersRequest {
                starting_address: 0x10,
                quantity: 2,
                value: vec![0x00, 0x0A, 0x01, 0x02],
            },
        },
        false,
    );
    check(
        &ModbusPdu::Error {
            function_flag: 0x05,
            exception_code: ModbusErrorCode::IllegalDataValue,
        },
        true,
    );
    check(
        &ModbusPdu::GetComEventLogResponse {
            status: 0,
            event_count: 0x0108,
            message_count: 0x0121,
            events: vec![0x20, 0x00],
        },
        true,
    );
}

#[test]
fn test_knxnetip() {
    check(
        &KnxNetIpMessage::ConnectionRequest {
            hpai_discovery_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 0, 2), 50000),
            hpai_data_endpoint: Hpai::udp(Ipv4Addr::new(192, 168, 0, 2), 50001),
            connection_request_information: ConnectionRequestInformation::TunnelConnection {
                knx_layer: KnxLayer::TunnelLinkLayer,
            },
        },
        (),
    );
    check(
        &KnxNetIpMessage::ConnectionStateResponse {
            communication_channel_id: 7,
            status: Status::InvalidConnectionId,
        },
        (),
    );
}

#[test]
fn test_s7_connection_request() {
    check(
        &TpktPacket {
            payload: CotpPacket {
                tpdu: CotpTpdu::ConnectionRequest {
                    destination_reference: 0,
                    source_reference: 0x000F,
                    protocol_class: CotpProtocolClass::Class0,
                },
                parameters: vec![
                    CotpParameter::CalledTsap { tsap_id: 0x0102 },
                    CotpParameter::CallingTsap { tsap_id: 0x0111 },
                    CotpParameter::TpduSize {
                        tpdu_size: CotpTpduSize::Size1024,
                    },
                ],
                payload: None,
            },
        },
        (),
    );
}

#[test]
fn test_bacnet_routed_npdu() {
    check(
        &Bvlc::OriginalUnicastNpdu {
            npdu: Npdu {
                expecting_reply: true,
                network_priority: NpduNetworkPriority::UrgentMessage,
                destination: Some(NpduAddress {
                    network: 5,
                    address: vec![0x0A],
                }),
                source: Some(NpduAddress {
                    network: 2,
                    address: vec![0xC0, 0xA8, 0x00, 0x11, 0xBA, 0xC0],
                }),
                hop_count: Some(254),
                ..Npdu::apdu(vec![0x00, 0x05, 0x01, 0x0C])
            },
        },
        (),
    );
    check(
        &Bvlc::DistributeBroadcastToNetwork {
            npdu: Npdu::nlm(Nlm::WhoIsRouterToNetwork {
                destination_network_addresses: vec![],
            }),
        },
        (),
    );
}
