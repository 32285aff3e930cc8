//! Failures carry the path of the field that broke and the underlying cause.

use plc4x_codec::bacnetip::Bvlc;
use plc4x_codec::knxnetip::{KnxAddress, KnxNetIpMessage};
use plc4x_codec::modbus::{ModbusPdu, ModbusRtuAdu, ModbusTcpAdu};
use plc4x_codec::s7::{S7Message, TpktPacket};
use plc4x_codec::{CodecError, Direction, Message, Parse};

fn frame(hex: &str) -> Vec<u8> {
    hex::decode(hex).unwrap()
}

#[test]
fn test_truncated_modbus_frame() {
    let err = ModbusTcpAdu::from_bytes(&frame("000100000006ff03000000"), false).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'pdu'.'quantity'"));
    assert!(matches!(
        err.root_cause(),
        CodecError::EndOfData { requested: 16, .. }
    ));
    let message = err.to_string();
    assert!(message.starts_with("error parsing 'pdu'.'quantity': "));
    assert!(message.contains("requested 16 bits"));
}

#[test]
fn test_truncated_cemi_names_the_enclosing_field() {
    let err = KnxNetIpMessage::from_bytes(&frame(concat!("061005300011", "29003ce0110a")), ())
        .unwrap_err();
    assert!(err.field_path().unwrap().starts_with("'cemi'"));
    assert!(matches!(err.root_cause(), CodecError::EndOfData { .. }));
}

#[test]
fn test_unknown_enum_value() {
    let err = KnxNetIpMessage::from_bytes(&frame("0610020800080799"), ()).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'status'"));
    assert!(matches!(
        err.root_cause(),
        CodecError::UnknownEnumValue {
            type_name: "Status",
            value: 0x99
        }
    ));
}

#[test]
fn test_nested_constant_mismatch() {
    let err = Bvlc::from_bytes(&frame("810a000802001008"), ()).unwrap_err();
    assert_eq!(
        err.field_path().as_deref(),
        Some("'npdu'.'protocolVersionNumber'")
    );
    assert!(matches!(
        err.root_cause(),
        CodecError::ConstantMismatch {
            expected: 0x01,
            actual: 0x02
        }
    ));
}

#[test]
fn test_unsupported_variant_is_fatal() {
    let err = S7Message::from_bytes(&frame("320700000001000800000001120411440100"), ())
        .unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'parameter'"));
    assert!(matches!(
        err.root_cause(),
        CodecError::UnsupportedVariant {
            type_name: "S7Parameter",
            ..
        }
    ));

    let err = ModbusPdu::from_bytes(&[0x42], false).unwrap_err();
    assert!(err.field_path().is_none());
    assert!(matches!(err, CodecError::UnsupportedVariant { .. }));
}

#[test]
fn test_checksum_mismatch() {
    let err = ModbusRtuAdu::from_bytes(&frame("01030000000bc5cd"), false).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'crc'"));
    assert!(matches!(err.root_cause(), CodecError::ChecksumMismatch { .. }));
}

#[test]
fn test_length_overrun() {
    let err = TpktPacket::from_bytes(&frame("0300000a01e00000000f00"), ()).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'payload'.'parameters'"));
    assert!(matches!(err.root_cause(), CodecError::LengthOverrun { .. }));
}

#[test]
fn test_serialize_errors_name_the_field() {
    let err = KnxAddress::new(16, 0, 0).to_bytes().unwrap_err();
    assert!(matches!(
        err,
        CodecError::Field {
            direction: Direction::Serializing,
            ..
        }
    ));
    assert_eq!(err.field_path().as_deref(), Some("'mainGroup'"));
    assert!(err.to_string().starts_with("error serializing 'mainGroup'"));
}

#[test]
fn test_xml_structure_mismatch() {
    let adu = ModbusTcpAdu {
        transaction_identifier: 1,
        unit_identifier: 1,
        pdu: ModbusPdu::ReadCoilsRequest {
            starting_address: 0,
            quantity: 8,
        },
    };
    let xml = adu.to_xml().unwrap().replace("unitIdentifier", "unitId");
    let err = ModbusTcpAdu::from_xml(&xml, false).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("'unitIdentifier'"));
    assert!(matches!(
        err.root_cause(),
        CodecError::UnexpectedElement { expected, .. } if expected == "unitIdentifier"
    ));
}
