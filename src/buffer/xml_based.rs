//! XML-backed buffers: a readable rendering of the same field stream.
//!
//! Each context becomes an element, each scalar a leaf:
//!
//! ```xml
//! <ModbusPDUReadCoilsRequest>
//!   <startingAddress dataType="uint" bitLength="16">19</startingAddress>
//!   <quantity dataType="uint" bitLength="16">8</quantity>
//! </ModbusPDUReadCoilsRequest>
//! ```
//!
//! The reader keeps a virtual bit position by summing the `bitLength` of
//! every leaf it consumes, so length-bounded arrays behave the same way as on
//! the byte backend.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{encode_fixed_string, ContextKind, ReadBuffer, StringEncoding, WriteBuffer};
use crate::config::XmlOptions;
use crate::error::{CodecError, Result, ResultExt};
use crate::utils::{
    byte_count_bits, check_bit_length, fits_signed, fits_unsigned, format_hex_bytes,
    parse_hex_bytes, sanitize_xml_text,
};

fn describe(event: &Event<'_>) -> String {
    match event {
        Event::Start(start) => format!("<{}>", String::from_utf8_lossy(start.name().as_ref())),
        Event::End(end) => format!("</{}>", String::from_utf8_lossy(end.name().as_ref())),
        Event::Text(text) => format!("text '{}'", String::from_utf8_lossy(text)),
        Event::Eof => "end of document".to_string(),
        other => format!("{other:?}"),
    }
}

fn parse_text<T: std::str::FromStr>(text: &str, what: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| CodecError::invalid_value(format!("'{text}' is not a valid {what}: {e}")))
}

/// Reads fields from an XML document produced by [`XmlWriteBuffer`].
pub struct XmlReadBuffer<'a> {
    reader: Reader<&'a [u8]>,
    bit_pos: usize,
    options: XmlOptions,
}

impl<'a> XmlReadBuffer<'a> {
    /// Creates a reader with default options.
    pub fn new(xml: &'a str) -> Self {
        Self::with_options(xml, XmlOptions::default())
    }

    /// Creates a reader with explicit options.
    pub fn with_options(xml: &'a str, options: XmlOptions) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            bit_pos: 0,
            options,
        }
    }

    /// Next structural event, leaf text included verbatim.
    fn raw_event(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
        loop {
            match reader.read_event().map_err(CodecError::xml)? {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                event => return Ok(event),
            }
        }
    }

    /// Next event between elements, where whitespace is only indentation.
    fn skip_indentation(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
        loop {
            match Self::raw_event(reader)? {
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                event => return Ok(event),
            }
        }
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        Self::skip_indentation(&mut self.reader)
    }

    fn validate(&self, start: &BytesStart<'_>, data_type: &str, bit_length: usize) -> Result<()> {
        if !self.options.validate_attributes {
            return Ok(());
        }
        for attribute in start.attributes() {
            let attribute = attribute.map_err(CodecError::xml)?;
            let value = attribute.unescape_value().map_err(CodecError::xml)?;
            match attribute.key.as_ref() {
                b"dataType" => {
                    if value != data_type {
                        return Err(CodecError::invalid_value(format!(
                            "dataType '{value}' where '{data_type}' was expected"
                        )));
                    }
                }
                b"bitLength" => {
                    if parse_text::<usize>(&value, "bit length")? != bit_length {
                        return Err(CodecError::invalid_value(format!(
                            "bitLength {value} where {bit_length} was expected"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_leaf(&mut self, logical_name: &str, data_type: &str, bit_length: usize) -> Result<String> {
        let start = match self.next_event()? {
            Event::Start(start) if start.name().as_ref() == logical_name.as_bytes() => start,
            other => {
                return Err(CodecError::UnexpectedElement {
                    expected: logical_name.to_string(),
                    found: describe(&other),
                })
            }
        };
        self.validate(&start, data_type, bit_length)?;

        let mut text = String::new();
        loop {
            match Self::raw_event(&mut self.reader)? {
                Event::Text(chunk) => text.push_str(&chunk.unescape().map_err(CodecError::xml)?),
                Event::CData(chunk) => text.push_str(&String::from_utf8_lossy(&chunk)),
                Event::End(end) if end.name().as_ref() == logical_name.as_bytes() => break,
                other => {
                    return Err(CodecError::UnexpectedEndElement {
                        expected: logical_name.to_string(),
                        found: describe(&other),
                    })
                }
            }
        }
        self.bit_pos += bit_length;
        Ok(text)
    }
}

impl std::fmt::Debug for XmlReadBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlReadBuffer")
            .field("options", &self.options)
            .field("bit_pos", &self.bit_pos)
            .field("buffer_position", &self.reader.buffer_position())
            .finish()
    }
}

impl ReadBuffer for XmlReadBuffer<'_> {
    fn bit_pos(&self) -> usize {
        self.bit_pos
    }

    /// Only rewinds the virtual position; the token stream itself cannot be replayed.
    fn reset(&mut self, bit_pos: usize) {
        self.bit_pos = bit_pos;
    }

    /// `true` while another element follows inside the current context.
    ///
    /// The document carries no byte count, so `bit_length` is not checked.
    fn has_more(&self, _bit_length: usize) -> bool {
        let mut lookahead = self.reader.clone();
        matches!(Self::skip_indentation(&mut lookahead), Ok(Event::Start(_)))
    }

    fn pull_context(&mut self, logical_name: &str, _kind: ContextKind) -> Result<()> {
        match self.next_event()? {
            Event::Start(start) if start.name().as_ref() == logical_name.as_bytes() => Ok(()),
            other => Err(CodecError::UnexpectedElement {
                expected: logical_name.to_string(),
                found: describe(&other),
            }),
        }
    }

    fn close_context(&mut self, logical_name: &str, _kind: ContextKind) -> Result<()> {
        match self.next_event()? {
            Event::End(end) if end.name().as_ref() == logical_name.as_bytes() => Ok(()),
            other => Err(CodecError::UnexpectedEndElement {
                expected: logical_name.to_string(),
                found: describe(&other),
            }),
        }
    }

    fn read_bit(&mut self, logical_name: &str) -> Result<bool> {
        let text = self.read_leaf(logical_name, "bit", 1).parsing(logical_name)?;
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(CodecError::invalid_value(format!("'{other}' is not a bit")))
                .parsing(logical_name),
        }
    }

    fn read_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u64> {
        check_bit_length(bit_length, 64).parsing(logical_name)?;
        let text = self
            .read_leaf(logical_name, "uint", usize::from(bit_length))
            .parsing(logical_name)?;
        let value: u64 = parse_text(&text, "unsigned integer").parsing(logical_name)?;
        if !fits_unsigned(value, bit_length) {
            return Err(CodecError::invalid_value(format!(
                "{value} does not fit in {bit_length} bits"
            )))
            .parsing(logical_name);
        }
        Ok(value)
    }

    fn read_int(&mut self, logical_name: &str, bit_length: u8) -> Result<i64> {
        check_bit_length(bit_length, 64).parsing(logical_name)?;
        let text = self
            .read_leaf(logical_name, "int", usize::from(bit_length))
            .parsing(logical_name)?;
        let value: i64 = parse_text(&text, "signed integer").parsing(logical_name)?;
        if !fits_signed(value, bit_length) {
            return Err(CodecError::invalid_value(format!(
                "{value} does not fit in {bit_length} signed bits"
            )))
            .parsing(logical_name);
        }
        Ok(value)
    }

    fn read_big_uint(&mut self, logical_name: &str, bit_length: u8) -> Result<u128> {
        check_bit_length(bit_length, 128).parsing(logical_name)?;
        let text = self
            .read_leaf(logical_name, "uint", usize::from(bit_length))
            .parsing(logical_name)?;
        parse_text(&text, "unsigned integer").parsing(logical_name)
    }

    fn read_f32(&mut self, logical_name: &str) -> Result<f32> {
        let text = self.read_leaf(logical_name, "float", 32).parsing(logical_name)?;
        parse_text(&text, "float").parsing(logical_name)
    }

    fn read_f64(&mut self, logical_name: &str) -> Result<f64> {
        let text = self.read_leaf(logical_name, "float", 64).parsing(logical_name)?;
        parse_text(&text, "float").parsing(logical_name)
    }

    fn read_byte_array(&mut self, logical_name: &str, count: usize) -> Result<Vec<u8>> {
        let bits = byte_count_bits(count).parsing(logical_name)?;
        let text = self
            .read_leaf(logical_name, "byte", bits)
            .parsing(logical_name)?;
        let bytes = parse_hex_bytes(text.trim()).parsing(logical_name)?;
        if bytes.len() != count {
            return Err(CodecError::invalid_value(format!(
                "{} bytes where {count} were expected",
                bytes.len()
            )))
            .parsing(logical_name);
        }
        Ok(bytes)
    }

    fn read_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        _encoding: StringEncoding,
    ) -> Result<String> {
        self.read_leaf(logical_name, "string", bit_length)
            .parsing(logical_name)
    }
}

/// Renders fields as an indented XML document.
///
/// # Example
///
/// ```
/// use plc4x_codec::{ContextKind, WriteBuffer, XmlWriteBuffer};
///
/// let mut wb = XmlWriteBuffer::new();
/// wb.push_context("KnxAddress", ContextKind::Element).unwrap();
/// wb.write_u8("mainGroup", 4, 1).unwrap();
/// wb.pop_context("KnxAddress", ContextKind::Element).unwrap();
/// let xml = wb.into_xml().unwrap();
/// assert!(xml.contains(r#"<mainGroup dataType="uint" bitLength="4">1</mainGroup>"#));
/// ```
pub struct XmlWriteBuffer {
    writer: Writer<Vec<u8>>,
    options: XmlOptions,
    bit_pos: usize,
    open: Vec<String>,
}

impl XmlWriteBuffer {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::with_options(XmlOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(options: XmlOptions) -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            options,
            bit_pos: 0,
            open: Vec::new(),
        }
    }

    /// Finishes the document and returns it.
    ///
    /// Fails if a context is still open.
    pub fn into_xml(self) -> Result<String> {
        if let Some(name) = self.open.last() {
            return Err(CodecError::UnexpectedEndElement {
                expected: name.clone(),
                found: "end of document".to_string(),
            });
        }
        String::from_utf8(self.writer.into_inner()).map_err(CodecError::xml)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(CodecError::xml)
    }

    fn write_leaf(
        &mut self,
        logical_name: &str,
        data_type: &str,
        bit_length: usize,
        text: &str,
        extra: &[(&str, &str)],
    ) -> Result<()> {
        let mut start = BytesStart::new(logical_name);
        if self.options.render_attributes {
            let bits = bit_length.to_string();
            start.push_attribute(("dataType", data_type));
            start.push_attribute(("bitLength", bits.as_str()));
            for attribute in extra {
                start.push_attribute(*attribute);
            }
        }
        self.emit(Event::Start(start))?;
        // Even empty, the text event keeps the indenter from breaking the line.
        self.emit(Event::Text(BytesText::new(text)))?;
        self.emit(Event::End(BytesEnd::new(logical_name)))?;
        self.bit_pos += bit_length;
        Ok(())
    }
}

impl Default for XmlWriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for XmlWriteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlWriteBuffer")
            .field("options", &self.options)
            .field("bit_pos", &self.bit_pos)
            .field("open", &self.open)
            .finish()
    }
}

impl WriteBuffer for XmlWriteBuffer {
    fn bit_pos(&self) -> usize {
        self.bit_pos
    }

    fn push_context(&mut self, logical_name: &str, kind: ContextKind) -> Result<()> {
        let mut start = BytesStart::new(logical_name);
        if kind == ContextKind::List && self.options.render_lists {
            start.push_attribute(("isList", "true"));
        }
        self.emit(Event::Start(start))?;
        self.open.push(logical_name.to_string());
        Ok(())
    }

    fn pop_context(&mut self, logical_name: &str, _kind: ContextKind) -> Result<()> {
        match self.open.last() {
            Some(top) if top == logical_name => {}
            other => {
                return Err(CodecError::UnexpectedEndElement {
                    expected: other.cloned().unwrap_or_default(),
                    found: format!("</{logical_name}>"),
                })
            }
        }
        self.open.pop();
        self.emit(Event::End(BytesEnd::new(logical_name)))
    }

    fn write_bit(&mut self, logical_name: &str, value: bool) -> Result<()> {
        self.write_leaf(logical_name, "bit", 1, if value { "true" } else { "false" }, &[])
            .serializing(logical_name)
    }

    fn write_uint(&mut self, logical_name: &str, bit_length: u8, value: u64) -> Result<()> {
        self.write_uint_annotated(logical_name, bit_length, value, "")
    }

    fn write_uint_annotated(
        &mut self,
        logical_name: &str,
        bit_length: u8,
        value: u64,
        representation: &str,
    ) -> Result<()> {
        check_bit_length(bit_length, 64).serializing(logical_name)?;
        if !fits_unsigned(value, bit_length) {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {bit_length} bits"
            )))
            .serializing(logical_name);
        }
        let annotation = [("stringRepresentation", representation)];
        let extra: &[(&str, &str)] = if representation.is_empty() {
            &[]
        } else {
            &annotation
        };
        self.write_leaf(
            logical_name,
            "uint",
            usize::from(bit_length),
            &value.to_string(),
            extra,
        )
        .serializing(logical_name)
    }

    fn write_int(&mut self, logical_name: &str, bit_length: u8, value: i64) -> Result<()> {
        check_bit_length(bit_length, 64).serializing(logical_name)?;
        if !fits_signed(value, bit_length) {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {bit_length} signed bits"
            )))
            .serializing(logical_name);
        }
        self.write_leaf(
            logical_name,
            "int",
            usize::from(bit_length),
            &value.to_string(),
            &[],
        )
        .serializing(logical_name)
    }

    fn write_big_uint(&mut self, logical_name: &str, bit_length: u8, value: u128) -> Result<()> {
        check_bit_length(bit_length, 128).serializing(logical_name)?;
        if bit_length < 128 && value >> bit_length != 0 {
            return Err(CodecError::encoding(format!(
                "value {value} does not fit in {bit_length} bits"
            )))
            .serializing(logical_name);
        }
        self.write_leaf(
            logical_name,
            "uint",
            usize::from(bit_length),
            &value.to_string(),
            &[],
        )
        .serializing(logical_name)
    }

    fn write_f32(&mut self, logical_name: &str, value: f32) -> Result<()> {
        self.write_leaf(logical_name, "float", 32, &value.to_string(), &[])
            .serializing(logical_name)
    }

    fn write_f64(&mut self, logical_name: &str, value: f64) -> Result<()> {
        self.write_leaf(logical_name, "float", 64, &value.to_string(), &[])
            .serializing(logical_name)
    }

    fn write_byte_array(&mut self, logical_name: &str, value: &[u8]) -> Result<()> {
        self.write_leaf(
            logical_name,
            "byte",
            value.len() * 8,
            &format_hex_bytes(value),
            &[],
        )
        .serializing(logical_name)
    }

    fn write_string(
        &mut self,
        logical_name: &str,
        bit_length: usize,
        encoding: StringEncoding,
        value: &str,
    ) -> Result<()> {
        encode_fixed_string(value, bit_length, encoding).serializing(logical_name)?;
        let encoding = encoding.to_string();
        self.write_leaf(
            logical_name,
            "string",
            bit_length,
            &sanitize_xml_text(value),
            &[("encoding", encoding.as_str())],
        )
        .serializing(logical_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XmlOptions;

    fn sample() -> String {
        let mut wb = XmlWriteBuffer::new();
        wb.push_context("Sample", ContextKind::Element).unwrap();
        wb.write_bit("flag", true).unwrap();
        wb.write_u8("nibble", 4, 0xA).unwrap();
        wb.write_int("delta", 12, -7).unwrap();
        wb.write_f32("ratio", 0.25).unwrap();
        wb.write_byte_array("raw", &[0xDE, 0xAD]).unwrap();
        wb.write_string("name", 64, StringEncoding::Utf8, "pump").unwrap();
        wb.push_context("items", ContextKind::List).unwrap();
        wb.pop_context("items", ContextKind::List).unwrap();
        wb.pop_context("Sample", ContextKind::Element).unwrap();
        wb.into_xml().unwrap()
    }

    #[test]
    fn test_leaf_rendering() {
        let xml = sample();
        assert!(xml.contains(r#"<flag dataType="bit" bitLength="1">true</flag>"#));
        assert!(xml.contains(r#"<raw dataType="byte" bitLength="16">0xdead</raw>"#));
        assert!(xml.contains(
            r#"<name dataType="string" bitLength="64" encoding="UTF-8">pump</name>"#
        ));
        assert!(xml.contains(r#"<items isList="true">"#));
    }

    #[test]
    fn test_read_back() {
        let xml = sample();
        let mut rb = XmlReadBuffer::new(&xml);
        rb.pull_context("Sample", ContextKind::Element).unwrap();
        assert!(rb.read_bit("flag").unwrap());
        assert_eq!(rb.read_u8("nibble", 4).unwrap(), 0xA);
        assert_eq!(rb.read_int("delta", 12).unwrap(), -7);
        assert_eq!(rb.read_f32("ratio").unwrap(), 0.25);
        assert_eq!(rb.read_byte_array("raw", 2).unwrap(), vec![0xDE, 0xAD]);
        assert_eq!(
            rb.read_string("name", 64, StringEncoding::Utf8).unwrap(),
            "pump"
        );
        rb.pull_context("items", ContextKind::List).unwrap();
        rb.close_context("items", ContextKind::List).unwrap();
        rb.close_context("Sample", ContextKind::Element).unwrap();
        assert_eq!(rb.bit_pos(), 1 + 4 + 12 + 32 + 16 + 64);
    }

    #[test]
    fn test_string_edge_whitespace_survives() {
        let mut wb = XmlWriteBuffer::new();
        wb.push_context("Tag", ContextKind::Element).unwrap();
        wb.write_string("name", 40, StringEncoding::Utf8, " a b ").unwrap();
        wb.write_string("blank", 24, StringEncoding::Utf8, "   ").unwrap();
        wb.write_string("empty", 8, StringEncoding::Utf8, "").unwrap();
        wb.pop_context("Tag", ContextKind::Element).unwrap();
        let xml = wb.into_xml().unwrap();
        assert!(xml.contains("></empty>"));

        let mut rb = XmlReadBuffer::new(&xml);
        rb.pull_context("Tag", ContextKind::Element).unwrap();
        assert_eq!(
            rb.read_string("name", 40, StringEncoding::Utf8).unwrap(),
            " a b "
        );
        assert_eq!(
            rb.read_string("blank", 24, StringEncoding::Utf8).unwrap(),
            "   "
        );
        assert_eq!(rb.read_string("empty", 8, StringEncoding::Utf8).unwrap(), "");
        rb.close_context("Tag", ContextKind::Element).unwrap();
    }

    #[test]
    fn test_has_more_stops_at_end_of_list() {
        let mut wb = XmlWriteBuffer::new();
        wb.push_context("values", ContextKind::List).unwrap();
        wb.write_u8("value", 8, 1).unwrap();
        wb.write_u8("value", 8, 2).unwrap();
        wb.pop_context("values", ContextKind::List).unwrap();
        let xml = wb.into_xml().unwrap();

        let mut rb = XmlReadBuffer::new(&xml);
        rb.pull_context("values", ContextKind::List).unwrap();
        let mut values = Vec::new();
        while rb.has_more(8) {
            values.push(rb.read_u8("value", 8).unwrap());
        }
        assert_eq!(values, vec![1, 2]);
        rb.close_context("values", ContextKind::List).unwrap();
        assert!(!rb.has_more(8));
    }

    #[test]
    fn test_byte_array_count_overflow() {
        let mut rb = XmlReadBuffer::new(r#"<raw dataType="byte" bitLength="0"/>"#);
        let err = rb.read_byte_array("raw", usize::MAX / 4).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_unexpected_element() {
        let xml = sample();
        let mut rb = XmlReadBuffer::new(&xml);
        let err = rb.pull_context("Other", ContextKind::Element).unwrap_err();
        match err {
            CodecError::UnexpectedElement { expected, found } => {
                assert_eq!(expected, "Other");
                assert_eq!(found, "<Sample>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_attribute_validation() {
        let xml = r#"<quantity dataType="uint" bitLength="8">5</quantity>"#;
        let mut rb = XmlReadBuffer::new(xml);
        assert!(rb.read_u16("quantity", 16).is_err());

        let lenient = XmlOptions {
            validate_attributes: false,
            ..XmlOptions::default()
        };
        let mut rb = XmlReadBuffer::with_options(xml, lenient);
        assert_eq!(rb.read_u16("quantity", 16).unwrap(), 5);
    }

    #[test]
    fn test_self_closing_leaf_is_empty() {
        let mut rb = XmlReadBuffer::new(r#"<raw dataType="byte" bitLength="0"/>"#);
        assert_eq!(rb.read_byte_array("raw", 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_unbalanced_pop() {
        let mut wb = XmlWriteBuffer::new();
        wb.push_context("A", ContextKind::Element).unwrap();
        assert!(wb.pop_context("B", ContextKind::Element).is_err());
        assert!(wb.into_xml().is_err());
    }

    #[test]
    fn test_strings_are_sanitized() {
        let mut wb = XmlWriteBuffer::new();
        wb.write_string("name", 32, StringEncoding::Utf8, "a\u{1}b").unwrap();
        let xml = wb.into_xml().unwrap();
        assert!(xml.contains(">ab</name>"));
    }

    #[test]
    fn test_attributes_can_be_suppressed() {
        let options = XmlOptions {
            render_attributes: false,
            render_lists: false,
            ..XmlOptions::default()
        };
        let mut wb = XmlWriteBuffer::with_options(options);
        wb.push_context("values", ContextKind::List).unwrap();
        wb.write_u16("value", 16, 7).unwrap();
        wb.pop_context("values", ContextKind::List).unwrap();
        let xml = wb.into_xml().unwrap();
        assert!(xml.contains("<values>"));
        assert!(xml.contains("<value>7</value>"));
    }
}
