//! Codec configuration.
//!
//! Every option is a plain value handed to the buffer that needs it. There is
//! no process-wide state: two buffers built with different options can run
//! side by side.
//!
//! # Example
//!
//! ```
//! use plc4x_codec::{ByteOrder, CodecConfig};
//!
//! let config = CodecConfig::new()
//!     .with_byte_order(ByteOrder::LittleEndian)
//!     .with_trace_fields(true)
//!     .with_xml_attributes(false);
//!
//! assert_eq!(config.byte_order, ByteOrder::LittleEndian);
//! assert!(config.debug.trace_fields);
//! assert!(!config.xml.render_attributes);
//! ```

/// Byte order used by the byte-based backend for whole-byte multi-byte values.
///
/// Bit packing inside a byte is always most-significant-bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Network byte order.
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

/// Diagnostics toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugOptions {
    /// Emit a `trace!` event for every field read or written.
    pub trace_fields: bool,
}

/// Rendering and validation switches for the XML backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlOptions {
    /// Mark list contexts with `isList="true"`.
    pub render_lists: bool,
    /// Emit `dataType` and `bitLength` attributes on leaf elements.
    pub render_attributes: bool,
    /// Check `dataType` and `bitLength` attributes while reading.
    pub validate_attributes: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            render_lists: true,
            render_attributes: true,
            validate_attributes: true,
        }
    }
}

/// Bundle of all codec options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecConfig {
    /// Byte order for the byte-based backend.
    pub byte_order: ByteOrder,
    /// Diagnostics toggles.
    pub debug: DebugOptions,
    /// XML backend switches.
    pub xml: XmlOptions,
}

impl CodecConfig {
    /// Creates a configuration with big-endian byte order, no field tracing
    /// and full XML rendering and validation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte order of the byte-based backend.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Enables or disables per-field tracing.
    pub fn with_trace_fields(mut self, trace_fields: bool) -> Self {
        self.debug.trace_fields = trace_fields;
        self
    }

    /// Enables or disables the `isList` marker on list contexts.
    pub fn with_xml_lists(mut self, render_lists: bool) -> Self {
        self.xml.render_lists = render_lists;
        self
    }

    /// Enables or disables `dataType`/`bitLength` attributes on XML leaves.
    pub fn with_xml_attributes(mut self, render_attributes: bool) -> Self {
        self.xml.render_attributes = render_attributes;
        self
    }

    /// Enables or disables attribute validation when reading XML.
    pub fn with_xml_validation(mut self, validate_attributes: bool) -> Self {
        self.xml.validate_attributes = validate_attributes;
        self
    }
}
