//! Storage-gateway peer identifiers.
//!
//! A DeOSS gateway registers its libp2p peer ID on chain as a fixed 38-byte
//! value (multihash of an Ed25519 key). Humans and libp2p tooling know it in
//! base58 form, `12D3KooW...`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::IdentityError;
use crate::config::PEER_ID_LEN;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    pub const fn new(bytes: [u8; PEER_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PEER_ID_LEN] {
        &self.0
    }

    /// Base58 rendering used by libp2p.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn from_base58(s: &str) -> Result<Self, IdentityError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| IdentityError::Base58(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for PeerId {
    type Error = IdentityError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; PEER_ID_LEN] =
            bytes.try_into().map_err(|_| IdentityError::InvalidLength {
                kind: "peer id",
                expected: PEER_ID_LEN,
                got: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl FromStr for PeerId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_base58())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for PeerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PeerId::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ed25519 libp2p peer: identity multihash (0x00, len 0x24) over the
    // protobuf-wrapped key (0x08 0x01 0x12 0x20 ++ 32 key bytes).
    fn sample() -> PeerId {
        let mut bytes = [0u8; PEER_ID_LEN];
        bytes[..6].copy_from_slice(&[0x00, 0x24, 0x08, 0x01, 0x12, 0x20]);
        bytes[6..].copy_from_slice(&[0x42; 32]);
        PeerId::new(bytes)
    }

    #[test]
    fn renders_libp2p_style() {
        assert!(sample().to_base58().starts_with("12D3KooW"));
    }

    #[test]
    fn base58_round_trip() {
        let peer = sample();
        assert_eq!(peer.to_string().parse::<PeerId>().unwrap(), peer);
    }

    #[test]
    fn short_input_rejected() {
        let encoded = bs58::encode([1u8; 37]).into_string();
        assert!(matches!(
            PeerId::from_base58(&encoded),
            Err(IdentityError::InvalidLength { got: 37, .. })
        ));
        assert!(matches!(
            PeerId::from_base58("0OIl"),
            Err(IdentityError::Base58(_))
        ));
    }
}
