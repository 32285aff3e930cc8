//! Error types for the codec layer.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Whether an error happened while reading or while writing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The error surfaced during a parse.
    Parsing,
    /// The error surfaced during a serialize.
    Serializing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Parsing => f.write_str("parsing"),
            Direction::Serializing => f.write_str("serializing"),
        }
    }
}

/// Errors that can occur while parsing or serializing protocol messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A read asked for more bits than the buffer holds.
    #[error("end of data: requested {requested} bits at bit {position}, {available} available")]
    EndOfData {
        /// Number of bits requested.
        requested: usize,
        /// Bit position of the cursor when the read was attempted.
        position: usize,
        /// Bits left in the buffer.
        available: usize,
    },

    /// The XML backend found a different start element than the one expected.
    #[error("unexpected element: expected <{expected}>, found {found}")]
    UnexpectedElement {
        /// Logical name the caller asked for.
        expected: String,
        /// Description of what was found instead.
        found: String,
    },

    /// The XML backend found a different end element than the one expected.
    #[error("unexpected end element: expected </{expected}>, found {found}")]
    UnexpectedEndElement {
        /// Logical name the caller asked for.
        expected: String,
        /// Description of what was found instead.
        found: String,
    },

    /// A const field carried a value other than its declared constant.
    #[error("expected constant value 0x{expected:X} but got 0x{actual:X}")]
    ConstantMismatch {
        /// Declared constant.
        expected: u64,
        /// Value found on the wire.
        actual: u64,
    },

    /// No variant of a discriminated family matched the discriminator.
    #[error("unsupported {type_name} variant for discriminator {discriminator}")]
    UnsupportedVariant {
        /// Family being dispatched.
        type_name: &'static str,
        /// Human readable rendering of the discriminator tuple.
        discriminator: String,
    },

    /// A closed enum read a value outside its set.
    #[error("unknown {type_name} value 0x{value:X}")]
    UnknownEnumValue {
        /// Enum type name.
        type_name: &'static str,
        /// Value found on the wire.
        value: u64,
    },

    /// A sub-parse produced something that does not fit its expected shape.
    #[error("cast failure: {reason}")]
    CastFailure {
        /// Description of the shape mismatch.
        reason: String,
    },

    /// A value cannot be represented in its declared encoding or width.
    #[error("encoding failure: {reason}")]
    EncodingFailure {
        /// Description of the encoding problem.
        reason: String,
    },

    /// A checksum field does not match the checksum computed over the message.
    #[error("checksum mismatch: computed 0x{expected:04X}, found 0x{actual:04X}")]
    ChecksumMismatch {
        /// Checksum computed from the message content.
        expected: u64,
        /// Checksum found on the wire.
        actual: u64,
    },

    /// A length-bounded array consumed past its boundary.
    #[error("length overrun: array bounded at byte {boundary} ended at byte {position}")]
    LengthOverrun {
        /// Byte position the array had to end at.
        boundary: usize,
        /// Byte position the last element actually ended at.
        position: usize,
    },

    /// An argument or a field value is outside what the codec accepts.
    #[error("invalid value: {reason}")]
    InvalidValue {
        /// Description of the invalid value.
        reason: String,
    },

    /// The XML input could not be tokenized.
    #[error("malformed XML: {reason}")]
    Xml {
        /// Description reported by the tokenizer.
        reason: String,
    },

    /// An error raised inside a named field, with the path from the outermost field.
    #[error("error {direction} {}: {source}", render_path(.path))]
    Field {
        /// Whether the failure happened while parsing or serializing.
        direction: Direction,
        /// Logical field names from the outermost message inwards.
        path: Vec<String>,
        /// The underlying error.
        source: Box<CodecError>,
    },

    /// Communication timeout.
    #[error("Communication timeout")]
    Timeout,

    /// The transport has not been connected.
    #[error("transport not connected")]
    NotConnected,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn render_path(path: &[String]) -> String {
    path.iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(".")
}

impl CodecError {
    /// Creates a new `InvalidValue` error.
    ///
    /// # Example
    ///
    /// ```
    /// use plc4x_codec::CodecError;
    ///
    /// let err = CodecError::invalid_value("bit length must be between 1 and 64");
    /// ```
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Creates a new `EncodingFailure` error.
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::EncodingFailure {
            reason: reason.into(),
        }
    }

    /// Creates a new `CastFailure` error.
    pub fn cast(reason: impl Into<String>) -> Self {
        Self::CastFailure {
            reason: reason.into(),
        }
    }

    /// Creates a new `Xml` error from anything displayable.
    pub fn xml(reason: impl fmt::Display) -> Self {
        Self::Xml {
            reason: reason.to_string(),
        }
    }

    /// Creates a new `UnsupportedVariant` error.
    ///
    /// # Example
    ///
    /// ```
    /// use plc4x_codec::CodecError;
    ///
    /// let err = CodecError::unsupported("ModbusPDU", "functionFlag=0x7F");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "unsupported ModbusPDU variant for discriminator functionFlag=0x7F"
    /// );
    /// ```
    pub fn unsupported(type_name: &'static str, discriminator: impl fmt::Display) -> Self {
        Self::UnsupportedVariant {
            type_name,
            discriminator: discriminator.to_string(),
        }
    }

    /// Wraps this error with the logical name of the field it happened in.
    ///
    /// Nested calls prepend, so the outermost field ends up first in the path.
    pub fn in_field(self, direction: Direction, name: &str) -> Self {
        match self {
            Self::Field {
                direction: inner,
                mut path,
                source,
            } if inner == direction => {
                path.insert(0, name.to_string());
                Self::Field {
                    direction,
                    path,
                    source,
                }
            }
            other => Self::Field {
                direction,
                path: vec![name.to_string()],
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, skipping any field-path wrapping.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the dotted field path of a wrapped error.
    pub fn field_path(&self) -> Option<String> {
        match self {
            Self::Field { path, .. } => Some(render_path(path)),
            _ => None,
        }
    }
}

/// Adds field-name wrapping to codec results.
pub trait ResultExt<T> {
    /// Wraps an error raised while parsing the named field.
    fn parsing(self, name: &str) -> Result<T>;
    /// Wraps an error raised while serializing the named field.
    fn serializing(self, name: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn parsing(self, name: &str) -> Result<T> {
        self.map_err(|e| e.in_field(Direction::Parsing, name))
    }

    fn serializing(self, name: &str) -> Result<T> {
        self.map_err(|e| e.in_field(Direction::Serializing, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_data_display() {
        let err = CodecError::EndOfData {
            requested: 16,
            position: 8,
            available: 8,
        };
        assert_eq!(
            err.to_string(),
            "end of data: requested 16 bits at bit 8, 8 available"
        );
    }

    #[test]
    fn test_constant_mismatch_display() {
        let err = CodecError::ConstantMismatch {
            expected: 0x10,
            actual: 0x11,
        };
        assert_eq!(err.to_string(), "expected constant value 0x10 but got 0x11");
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = CodecError::ChecksumMismatch {
            expected: 0xC5CD,
            actual: 0x0000,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: computed 0xC5CD, found 0x0000"
        );
    }

    #[test]
    fn test_field_path_is_built_outermost_first() {
        let err: Result<()> = Err(CodecError::EndOfData {
            requested: 4,
            position: 0,
            available: 0,
        });
        let err = err
            .parsing("mainGroup")
            .parsing("sourceAddress")
            .parsing("dataFrame")
            .unwrap_err();

        assert_eq!(
            err.field_path().as_deref(),
            Some("'dataFrame'.'sourceAddress'.'mainGroup'")
        );
        assert!(err
            .to_string()
            .starts_with("error parsing 'dataFrame'.'sourceAddress'.'mainGroup': end of data"));
        assert!(matches!(err.root_cause(), CodecError::EndOfData { .. }));
    }

    #[test]
    fn test_direction_change_starts_new_path() {
        let err = CodecError::invalid_value("x")
            .in_field(Direction::Parsing, "inner")
            .in_field(Direction::Serializing, "outer");
        assert_eq!(err.field_path().as_deref(), Some("'outer'"));
        assert!(matches!(err.root_cause(), CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_timeout_display() {
        let err = CodecError::Timeout;
        assert_eq!(err.to_string(), "Communication timeout");
    }
}
