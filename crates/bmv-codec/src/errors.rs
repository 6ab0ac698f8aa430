//! # Codec Errors
//!
//! Every structural problem found while decoding is reported here. Encoding
//! cannot fail.

use thiserror::Error;

/// Errors raised by the strict RLPn decoder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the announced item was complete.
    #[error("Unexpected end of input: need {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes the header announced
        needed: usize,
        /// Bytes left in the input
        available: usize,
    },

    /// Bytes remain after the last item the reader consumed.
    #[error("Trailing bytes after item: {0} unconsumed")]
    TrailingBytes(usize),

    /// A length prefix was not in its shortest form.
    #[error("Non-canonical length prefix: {0}")]
    NonCanonical(&'static str),

    /// A list was found where a byte string was expected.
    #[error("Expected byte string, found list")]
    ExpectedBytes,

    /// A byte string was found where a list was expected.
    #[error("Expected list, found byte string")]
    ExpectedList,

    /// A null marker was found where a value is required.
    #[error("Unexpected null value")]
    UnexpectedNull,

    /// A fixed-width field had the wrong number of bytes.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required width
        expected: usize,
        /// Decoded width
        actual: usize,
    },

    /// An integer field did not decode to a value of the target type.
    #[error("Invalid integer: {0}")]
    InvalidInteger(&'static str),

    /// A tagged value carried an unknown tag.
    #[error("Unknown {kind} tag: {tag}")]
    UnknownTag {
        /// What was being decoded
        kind: &'static str,
        /// The tag found
        tag: u64,
    },

    /// A structure-level rule was violated.
    #[error("Invalid structure: {0}")]
    Invalid(String),
}
