use thiserror::Error;

/// Errors raised while parsing or rendering chain identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Raw bytes of the wrong length for the identity kind.
    #[error("invalid {kind} length: expected {expected} bytes, got {got}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// The string is not valid base58.
    #[error("base58 decode error: {0}")]
    Base58(String),

    /// The string is not valid hex.
    #[error("hex decode error: {0}")]
    Hex(String),

    /// The leading SS58 byte is outside the defined prefix ranges.
    #[error("invalid ss58 prefix byte 0x{0:02x}")]
    InvalidPrefixByte(u8),

    /// The SS58 checksum does not match the payload.
    #[error("ss58 checksum mismatch")]
    BadChecksum,

    /// Valid SS58, but for another network.
    #[error("ss58 prefix mismatch: expected {expected}, got {got}")]
    PrefixMismatch { expected: u16, got: u16 },

    /// The prefix cannot be represented in SS58.
    #[error("ss58 prefix {0} out of range")]
    PrefixOutOfRange(u16),
}
