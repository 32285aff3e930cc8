//! Captured frames decoded end to end, down to the application values.

use std::net::Ipv4Addr;

use plc4x_codec::bacnetip::{Bvlc, NpduAddress};
use plc4x_codec::knxnetip::{Cemi, CemiFrameBody, KnxAddress, KnxNetIpMessage};
use plc4x_codec::modbus::{ModbusAsciiAdu, ModbusPdu, ModbusRtuAdu, ModbusTcpAdu};
use plc4x_codec::s7::{
    CotpPacket, CotpTpdu, DataTransportErrorCode, DataTransportSize, MemoryArea, S7Address,
    S7Message, S7Parameter, S7Payload, S7VarRequestParameterItem, TpktPacket, TransportSize,
};
use plc4x_codec::{Message, Parse, PlcValue, RawPlcValue};
use pretty_assertions::assert_eq;

fn frame(hex: &str) -> Vec<u8> {
    hex::decode(hex).unwrap()
}

#[test]
fn test_modbus_tcp_holding_registers_response() {
    let bytes = frame("000100000009110306022b00000064");
    let adu = ModbusTcpAdu::from_bytes(&bytes, true).unwrap();
    assert_eq!(adu.unit_identifier, 0x11);

    let ModbusPdu::ReadHoldingRegistersResponse { value } = &adu.pdu else {
        panic!("unexpected pdu {:?}", adu.pdu);
    };
    let registers = RawPlcValue::new(value.clone()).decode("WORD", 3).unwrap();
    assert_eq!(
        registers,
        PlcValue::List(vec![
            PlcValue::Unsigned(0x022B),
            PlcValue::Unsigned(0),
            PlcValue::Unsigned(0x64),
        ])
    );
    assert_eq!(adu.to_bytes().unwrap(), bytes);
}

#[test]
fn test_modbus_serial_framings_share_the_pdu() {
    let pdu = ModbusPdu::ReadHoldingRegistersRequest {
        starting_address: 0,
        quantity: 10,
    };
    let rtu = ModbusRtuAdu {
        address: 0x01,
        pdu: pdu.clone(),
    }
    .to_bytes()
    .unwrap();
    let ascii = ModbusAsciiAdu {
        address: 0x01,
        pdu: pdu.clone(),
    }
    .to_bytes()
    .unwrap();

    assert_eq!(rtu, frame("01030000000ac5cd"));
    assert_eq!(ascii, frame("01030000000af2"));
    assert_eq!(rtu[..6], ascii[..6]);
    assert_eq!(ModbusRtuAdu::from_bytes(&rtu, false).unwrap().pdu, pdu);
}

#[test]
fn test_knx_routing_indication_group_write() {
    let bytes = frame(concat!("061005300011", "29003ce0110a0a01010081"));
    let message = KnxNetIpMessage::from_bytes(&bytes, ()).unwrap();
    let KnxNetIpMessage::RoutingIndication {
        cemi: Cemi::LDataInd(ldata),
    } = &message
    else {
        panic!("unexpected message {message:?}");
    };
    let CemiFrameBody::DataExt(data) = &ldata.data_frame.body else {
        panic!("unexpected frame {:?}", ldata.data_frame.body);
    };
    assert_eq!(data.source_address, KnxAddress::new(1, 1, 10));
    assert!(data.group_address);
    assert_eq!(message.length_in_bytes(), bytes.len());
    assert_eq!(message.to_bytes().unwrap(), bytes);
}

#[test]
fn test_s7_read_var_request() {
    let packet = TpktPacket {
        payload: CotpPacket {
            tpdu: CotpTpdu::Data {
                eot: true,
                tpdu_ref: 0,
            },
            parameters: vec![],
            payload: Some(S7Message::request(
                1,
                S7Parameter::ReadVarRequest {
                    items: vec![S7VarRequestParameterItem::Address {
                        address: S7Address {
                            transport_size: TransportSize::Byte,
                            number_of_elements: 1,
                            db_number: 13,
                            area: MemoryArea::DataBlocks,
                            byte_address: 0,
                            bit_address: 0,
                        },
                    }],
                },
                None,
            )),
        },
    };
    let bytes = frame(concat!(
        "0300001f02f080",
        "320100000001000e0000",
        "0401",
        "120a10020001000d84000000",
    ));
    assert_eq!(packet.to_bytes().unwrap(), bytes);
    assert_eq!(TpktPacket::from_bytes(&bytes, ()).unwrap(), packet);
}

#[test]
fn test_s7_read_var_response_value() {
    let bytes = frame("0300001e05f00dc0010c32030000000b0002000600000401ff0300010100");
    let packet = TpktPacket::from_bytes(&bytes, ()).unwrap();
    let message = packet.payload.payload.as_ref().unwrap();
    assert!(!message.is_error());

    let Some(S7Payload::ReadVarResponse { items }) = &message.payload else {
        panic!("unexpected payload {:?}", message.payload);
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].return_code, DataTransportErrorCode::Ok);
    assert_eq!(items[0].transport_size, DataTransportSize::Bit);
    let value = RawPlcValue::new(items[0].data.clone());
    assert_eq!(value.get_index(0), Some(PlcValue::Unsigned(1)));
}

#[test]
fn test_bacnet_who_is_broadcast() {
    let bytes = frame("810b000c0120ffff00ff1008");
    let bvlc = Bvlc::from_bytes(&bytes, ()).unwrap();
    let npdu = bvlc.npdu().unwrap();
    assert_eq!(npdu.destination, Some(NpduAddress::global_broadcast()));
    assert_eq!(npdu.hop_count, Some(255));
    assert_eq!(npdu.apdu_value().unwrap().get_raw(), [0x10, 0x08]);
    assert_eq!(bvlc.to_bytes().unwrap(), bytes);
}

#[test]
fn test_bacnet_forwarded_npdu_origin() {
    let bytes = frame("81040013c0a80001bac0018001000100020003");
    let Bvlc::ForwardedNpdu { ip, port, npdu } = Bvlc::from_bytes(&bytes, ()).unwrap() else {
        panic!("not a forwarded npdu");
    };
    assert_eq!((ip, port), (Ipv4Addr::new(192, 168, 0, 1), 47808));
    assert!(npdu.apdu_value().is_none());
}
