//! # Hashing Utilities
//!
//! The two hash families a Substrate-style node uses to lay out its storage
//! trie, and nothing else:
//!
//! - **xxHash64 ("twox")**: non-cryptographic, used where the hashed input
//!   is chosen by the runtime developer rather than by users: pallet and item
//!   names, plus map keys declared `Twox64Concat`. Wider outputs are built by
//!   running xxHash64 with consecutive seeds and concatenating the
//!   little-endian results.
//!
//! - **BLAKE2b**: cryptographic, used for map keys an attacker could pick
//!   (account identifiers) so nobody can grind keys into one trie branch.
//!   Also the checksum function of SS58 account addresses.
//!
//! Both must match the node bit for bit. A single wrong seed or byte order
//! produces keys that are well-formed and point at nothing.

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Blake2b512, Digest};
use xxhash_rust::xxh64::xxh64;

/// xxHash64 with seed 0, little-endian. 8 bytes.
pub fn twox_64(data: &[u8]) -> [u8; 8] {
    xxh64(data, 0).to_le_bytes()
}

/// Two xxHash64 rounds (seeds 0 and 1) concatenated. 16 bytes.
///
/// Every storage key starts with `twox_128(pallet) ++ twox_128(item)`.
///
/// # Example
///
/// ```
/// use cess_query::crypto::twox_128;
///
/// assert_eq!(
///     hex::encode(twox_128(b"System")),
///     "26aa394eea5630e07c48ae0c9558cef7"
/// );
/// ```
pub fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&xxh64(data, 0).to_le_bytes());
    out[8..].copy_from_slice(&xxh64(data, 1).to_le_bytes());
    out
}

/// Four xxHash64 rounds (seeds 0..4) concatenated. 32 bytes.
pub fn twox_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (seed, chunk) in out.chunks_exact_mut(8).enumerate() {
        chunk.copy_from_slice(&xxh64(data, seed as u64).to_le_bytes());
    }
    out
}

/// BLAKE2b with a 16-byte digest.
pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    let digest = Blake2b::<U16>::digest(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    out
}

/// BLAKE2b with a 32-byte digest.
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let digest = Blake2b::<U32>::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// BLAKE2b-512 over several parts fed in order, without concatenating them
/// first. SS58 checksums hash `"SS58PRE" ++ prefix ++ account` this way.
pub fn blake2_512_multi(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twox_128_known_prefixes() {
        // The `System::Account` and `System::Number` prefixes are fixed on
        // every Substrate chain, which makes them ideal vectors.
        assert_eq!(
            hex::encode(twox_128(b"System")),
            "26aa394eea5630e07c48ae0c9558cef7"
        );
        assert_eq!(
            hex::encode(twox_128(b"Account")),
            "b99d880ec681799c0cf30e8886371da9"
        );
        assert_eq!(
            hex::encode(twox_128(b"Number")),
            "02a5c1b19ab7a04f536c519aca4983ac"
        );
    }

    #[test]
    fn twox_widths_share_leading_rounds() {
        let data = b"Oss";
        let short = twox_64(data);
        let mid = twox_128(data);
        let wide = twox_256(data);
        assert_eq!(&mid[..8], &short[..]);
        assert_eq!(&wide[..16], &mid[..]);
    }

    #[test]
    fn blake2_256_empty_vector() {
        assert_eq!(
            hex::encode(blake2_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn blake2_512_empty_vector() {
        assert_eq!(
            hex::encode(blake2_512_multi(&[])),
            "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419\
             d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce"
        );
    }

    #[test]
    fn blake2_512_multi_equals_concatenation() {
        let joined = blake2_512_multi(&[b"SS58PRE", b"payload"]);
        let single = blake2_512_multi(&[b"SS58PREpayload"]);
        assert_eq!(joined, single);
    }

    #[test]
    fn blake2_128_differs_from_truncated_256() {
        // Digest length is a BLAKE2 parameter, not a truncation.
        let short = blake2_128(b"cess");
        let long = blake2_256(b"cess");
        assert_ne!(&short[..], &long[..16]);
    }
}
