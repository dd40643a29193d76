//! # SS58 Account Addresses
//!
//! ```text
//! address = base58( prefix ++ account ++ checksum )
//! checksum = blake2b_512("SS58PRE" ++ prefix ++ account)[..2]
//! ```
//!
//! Prefixes below 64 take one byte. Prefixes 64..=16383 take two bytes
//! with the bits interleaved so that the first byte always lands in
//! 64..=127 and cannot be mistaken for a one-byte prefix.

use super::account::AccountId;
use super::error::IdentityError;
use crate::config::{ACCOUNT_ID_LEN, CESS_SS58_PREFIX, MAX_SS58_PREFIX};
use crate::crypto::hash::blake2_512_multi;

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

/// Renders account identifiers for humans and parses them back.
///
/// The resolver is generic over this so callers on other networks, or
/// tests, can swap the textual form without touching query logic.
pub trait AccountCodec: Send + Sync {
    fn to_display(&self, account: &AccountId) -> String;

    fn from_display(&self, s: &str) -> Result<AccountId, IdentityError>;
}

/// SS58 codec bound to one network prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ss58Codec {
    prefix: u16,
}

impl Ss58Codec {
    pub fn new(prefix: u16) -> Result<Self, IdentityError> {
        if prefix > MAX_SS58_PREFIX {
            return Err(IdentityError::PrefixOutOfRange(prefix));
        }
        Ok(Self { prefix })
    }

    pub fn cess() -> Self {
        Self {
            prefix: CESS_SS58_PREFIX,
        }
    }

    pub fn prefix(&self) -> u16 {
        self.prefix
    }
}

impl Default for Ss58Codec {
    fn default() -> Self {
        Self::cess()
    }
}

impl AccountCodec for Ss58Codec {
    fn to_display(&self, account: &AccountId) -> String {
        let mut payload = prefix_bytes(self.prefix);
        payload.extend_from_slice(account.as_bytes());
        let checksum = blake2_512_multi(&[CHECKSUM_PREAMBLE, &payload]);
        payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        bs58::encode(payload).into_string()
    }

    fn from_display(&self, s: &str) -> Result<AccountId, IdentityError> {
        let (prefix, account) = decode_any(s)?;
        if prefix != self.prefix {
            return Err(IdentityError::PrefixMismatch {
                expected: self.prefix,
                got: prefix,
            });
        }
        Ok(account)
    }
}

/// Decodes an SS58 address without checking which network it belongs to.
pub fn decode_any(s: &str) -> Result<(u16, AccountId), IdentityError> {
    let data = bs58::decode(s)
        .into_vec()
        .map_err(|e| IdentityError::Base58(e.to_string()))?;
    let first = *data.first().ok_or(IdentityError::InvalidLength {
        kind: "ss58 address",
        expected: 1 + ACCOUNT_ID_LEN + CHECKSUM_LEN,
        got: 0,
    })?;

    let (prefix, prefix_len) = match first {
        0..=63 => (u16::from(first), 1),
        64..=127 => {
            let second = *data.get(1).ok_or(IdentityError::InvalidLength {
                kind: "ss58 address",
                expected: 2 + ACCOUNT_ID_LEN + CHECKSUM_LEN,
                got: data.len(),
            })?;
            let lower = ((first & 0b0011_1111) << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (u16::from(lower) | (u16::from(upper) << 8), 2)
        }
        _ => return Err(IdentityError::InvalidPrefixByte(first)),
    };

    let expected = prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN;
    if data.len() != expected {
        return Err(IdentityError::InvalidLength {
            kind: "ss58 address",
            expected,
            got: data.len(),
        });
    }

    let (body, checksum) = data.split_at(prefix_len + ACCOUNT_ID_LEN);
    let digest = blake2_512_multi(&[CHECKSUM_PREAMBLE, body]);
    if checksum != &digest[..CHECKSUM_LEN] {
        return Err(IdentityError::BadChecksum);
    }

    let account = AccountId::try_from(&body[prefix_len..])?;
    Ok((prefix, account))
}

fn prefix_bytes(prefix: u16) -> Vec<u8> {
    if prefix < 64 {
        vec![prefix as u8]
    } else {
        vec![
            ((prefix & 0b1111_1100) >> 2) as u8 | 0b0100_0000,
            ((prefix >> 8) as u8) | (((prefix & 0b11) as u8) << 6),
        ]
    }
}
