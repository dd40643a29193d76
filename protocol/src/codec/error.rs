//! Error types for decoding and encoding.
//!
//! Decoding faces bytes from a remote node, which may be buggy or hostile.
//! Every failure mode is a value here; none of them is a panic.

use thiserror::Error;

/// Errors produced while decoding a storage payload.
///
/// Every variant records the byte offset at which decoding stopped and the
/// shape that was being decoded there, rendered in the textual shape
/// grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes remain than the shape requires.
    #[error("unexpected end of input at offset {offset} decoding {shape}: need {needed} bytes, {remaining} left")]
    UnexpectedEnd {
        offset: usize,
        shape: String,
        needed: usize,
        remaining: usize,
    },

    /// A boolean byte other than `0x00` or `0x01`.
    #[error("invalid boolean byte 0x{byte:02x} at offset {offset} decoding {shape}")]
    InvalidBoolean {
        offset: usize,
        shape: String,
        byte: u8,
    },

    /// An option presence tag other than `0x00` or `0x01`.
    #[error("invalid option tag 0x{byte:02x} at offset {offset} decoding {shape}")]
    InvalidOptionTag {
        offset: usize,
        shape: String,
        byte: u8,
    },

    /// A length prefix that claims more than the buffer holds.
    #[error("length prefix {declared} at offset {offset} decoding {shape} overruns the {remaining} remaining bytes")]
    LengthOverrun {
        offset: usize,
        shape: String,
        declared: u128,
        remaining: usize,
    },

    /// A compact integer not written in its shortest form.
    #[error("non-canonical compact integer at offset {offset} decoding {shape}")]
    NonCanonicalCompact { offset: usize, shape: String },

    /// A compact integer wider than 128 bits.
    #[error("compact integer at offset {offset} decoding {shape} is {byte_len} bytes wide (max 16)")]
    CompactOverflow {
        offset: usize,
        shape: String,
        byte_len: usize,
    },

    /// Text that is not valid UTF-8.
    #[error("invalid utf-8 at offset {offset} decoding {shape}")]
    InvalidUtf8 { offset: usize, shape: String },

    /// The value decoded cleanly but bytes were left over.
    #[error("{remaining} trailing bytes at offset {offset} after decoding {shape}")]
    TrailingBytes {
        offset: usize,
        shape: String,
        remaining: usize,
    },
}

impl DecodeError {
    /// Byte offset at which decoding stopped.
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEnd { offset, .. }
            | Self::InvalidBoolean { offset, .. }
            | Self::InvalidOptionTag { offset, .. }
            | Self::LengthOverrun { offset, .. }
            | Self::NonCanonicalCompact { offset, .. }
            | Self::CompactOverflow { offset, .. }
            | Self::InvalidUtf8 { offset, .. }
            | Self::TrailingBytes { offset, .. } => *offset,
        }
    }

    /// Rendered shape that was being decoded.
    pub fn shape(&self) -> &str {
        match self {
            Self::UnexpectedEnd { shape, .. }
            | Self::InvalidBoolean { shape, .. }
            | Self::InvalidOptionTag { shape, .. }
            | Self::LengthOverrun { shape, .. }
            | Self::NonCanonicalCompact { shape, .. }
            | Self::CompactOverflow { shape, .. }
            | Self::InvalidUtf8 { shape, .. }
            | Self::TrailingBytes { shape, .. } => shape,
        }
    }
}

/// Errors produced while encoding a value against a shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The value's variant does not fit the shape.
    #[error("value does not match shape {shape}")]
    Mismatch { shape: String },

    /// An integer larger than the shape's width.
    #[error("integer {value} does not fit {shape}")]
    IntegerOverflow { value: u128, shape: String },

    /// A fixed-size byte array or array of the wrong length.
    #[error("expected {expected} elements for {shape}, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        shape: String,
    },

    /// Record fields missing, extra, or out of order.
    #[error("record field '{got}' where '{expected}' was expected")]
    FieldMismatch { expected: String, got: String },
}
