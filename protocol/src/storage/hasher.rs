//! Per-parameter key hashing policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::hash::{blake2_128, blake2_256, twox_128, twox_256, twox_64};

/// How a map parameter is turned into key bytes.
///
/// `Identity` is direct concatenation: the encoded parameter is appended
/// as-is. Every other variant is content-hashed; the `*Concat` variants also
/// append the raw encoding after the digest, which is what lets a key be
/// read back out of an enumerated storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageHasher {
    Identity,
    Twox64Concat,
    Twox128,
    Twox256,
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
}

impl StorageHasher {
    /// Appends the hashed form of `encoded` to `out`.
    pub fn hash_into(self, encoded: &[u8], out: &mut Vec<u8>) {
        match self {
            Self::Identity => out.extend_from_slice(encoded),
            Self::Twox64Concat => {
                out.extend_from_slice(&twox_64(encoded));
                out.extend_from_slice(encoded);
            }
            Self::Twox128 => out.extend_from_slice(&twox_128(encoded)),
            Self::Twox256 => out.extend_from_slice(&twox_256(encoded)),
            Self::Blake2_128 => out.extend_from_slice(&blake2_128(encoded)),
            Self::Blake2_256 => out.extend_from_slice(&blake2_256(encoded)),
            Self::Blake2_128Concat => {
                out.extend_from_slice(&blake2_128(encoded));
                out.extend_from_slice(encoded);
            }
        }
    }

    /// Returns the hashed form of `encoded`.
    pub fn hash(self, encoded: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.digest_len() + encoded.len());
        self.hash_into(encoded, &mut out);
        out
    }

    /// Length of the digest part, excluding any appended raw key.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Identity => 0,
            Self::Twox64Concat => 8,
            Self::Twox128 | Self::Blake2_128 | Self::Blake2_128Concat => 16,
            Self::Twox256 | Self::Blake2_256 => 32,
        }
    }

    /// Whether the raw encoded key follows the digest.
    pub const fn is_concat(self) -> bool {
        matches!(self, Self::Identity | Self::Twox64Concat | Self::Blake2_128Concat)
    }

    /// Recovers the encoded parameter from a hashed key segment, for
    /// transparent hashers.
    pub fn strip_digest(self, segment: &[u8]) -> Option<&[u8]> {
        if !self.is_concat() {
            return None;
        }
        segment.get(self.digest_len()..)
    }
}

impl fmt::Display for StorageHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Twox64Concat => "twox64concat",
            Self::Twox128 => "twox128",
            Self::Twox256 => "twox256",
            Self::Blake2_128 => "blake2_128",
            Self::Blake2_256 => "blake2_256",
            Self::Blake2_128Concat => "blake2_128concat",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageHasher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "identity" | "raw" => Ok(Self::Identity),
            "twox64concat" => Ok(Self::Twox64Concat),
            "twox128" => Ok(Self::Twox128),
            "twox256" => Ok(Self::Twox256),
            "blake2128" => Ok(Self::Blake2_128),
            "blake2256" => Ok(Self::Blake2_256),
            "blake2128concat" => Ok(Self::Blake2_128Concat),
            _ => Err(format!("unknown storage hasher '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_direct_concatenation() {
        assert_eq!(StorageHasher::Identity.hash(b"peer"), b"peer".to_vec());
    }

    #[test]
    fn concat_hashers_keep_the_key() {
        let key = [7u8; 32];
        for hasher in [StorageHasher::Twox64Concat, StorageHasher::Blake2_128Concat] {
            let hashed = hasher.hash(&key);
            assert_eq!(hashed.len(), hasher.digest_len() + key.len());
            assert_eq!(hasher.strip_digest(&hashed), Some(&key[..]));
        }
    }

    #[test]
    fn opaque_hashers_hide_the_key() {
        let key = [7u8; 32];
        for hasher in [
            StorageHasher::Twox128,
            StorageHasher::Twox256,
            StorageHasher::Blake2_128,
            StorageHasher::Blake2_256,
        ] {
            let hashed = hasher.hash(&key);
            assert_eq!(hashed.len(), hasher.digest_len());
            assert_eq!(hasher.strip_digest(&hashed), None);
        }
    }

    #[test]
    fn parse_and_display_agree() {
        for hasher in [
            StorageHasher::Identity,
            StorageHasher::Twox64Concat,
            StorageHasher::Twox128,
            StorageHasher::Twox256,
            StorageHasher::Blake2_128,
            StorageHasher::Blake2_256,
            StorageHasher::Blake2_128Concat,
        ] {
            assert_eq!(hasher.to_string().parse::<StorageHasher>(), Ok(hasher));
        }
        assert_eq!(
            "Blake2_128Concat".parse::<StorageHasher>(),
            Ok(StorageHasher::Blake2_128Concat)
        );
        assert!("sha256".parse::<StorageHasher>().is_err());
    }
}
