//! Example: decoding a captured frame
//!
//! Run with: cargo run --example decode_frame -- <protocol> <hex>
//!
//! where `<protocol>` is one of `modbus-tcp`, `modbus-tcp-response`,
//! `knxnetip`, `s7` or `bacnetip`.
//!
//! This example demonstrates:
//! - Parsing wire bytes into a typed message
//! - Rendering the same message as debug XML
//! - Reading the field path out of a parse error

use plc4x_codec::bacnetip::Bvlc;
use plc4x_codec::knxnetip::KnxNetIpMessage;
use plc4x_codec::modbus::ModbusTcpAdu;
use plc4x_codec::s7::TpktPacket;
use plc4x_codec::utils::parse_hex_bytes;
use plc4x_codec::{CodecError, Message, Parse};
use std::fmt::Debug;

fn show<T: Message + Debug>(parsed: plc4x_codec::Result<T>) -> plc4x_codec::Result<()> {
    match parsed {
        Ok(message) => {
            println!("{} ({} bytes)\n", message.type_name(), message.length_in_bytes());
            println!("{message:#?}\n");
            println!("{}", message.to_xml()?);
            Ok(())
        }
        Err(err) => {
            if let Some(path) = err.field_path() {
                println!("failed at {path}");
            }
            println!("cause: {}", err.root_cause());
            Err(err)
        }
    }
}

fn main() -> plc4x_codec::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(protocol), Some(hex)) = (args.next(), args.next()) else {
        eprintln!("usage: decode_frame <protocol> <hex>");
        std::process::exit(2);
    };
    let bytes = parse_hex_bytes(&hex)?;

    match protocol.as_str() {
        "modbus-tcp" => show(ModbusTcpAdu::from_bytes(&bytes, false)),
        "modbus-tcp-response" => show(ModbusTcpAdu::from_bytes(&bytes, true)),
        "knxnetip" => show(KnxNetIpMessage::from_bytes(&bytes, ())),
        "s7" => show(TpktPacket::from_bytes(&bytes, ())),
        "bacnetip" => show(Bvlc::from_bytes(&bytes, ())),
        other => Err(CodecError::invalid_value(format!("unknown protocol '{other}'"))),
    }
}
