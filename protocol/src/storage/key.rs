//! Storage key construction.
//!
//! ```text
//! key = twox_128(pallet) ++ twox_128(item) ++ hasher_1(param_1) ++ ... ++ hasher_n(param_n)
//! ```
//!
//! The first 32 bytes are fixed per storage item; that is the prefix used to
//! enumerate every entry of a map. Parameters must already be in their
//! canonical encoding (see [`crate::codec::encode`]); the builder does not
//! know their types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::hasher::StorageHasher;
use crate::crypto::hash::twox_128;

/// Length of the `twox_128(pallet) ++ twox_128(item)` prefix.
pub const STORAGE_PREFIX_LEN: usize = 32;

// ---------------------------------------------------------------------------
// StorageKey
// ---------------------------------------------------------------------------

/// Raw storage key bytes, as the node indexes them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(Vec<u8>);

impl StorageKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `0x`-prefixed lowercase hex, the form JSON-RPC expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Parses hex with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        Ok(Self(hex::decode(digits)?))
    }

    pub fn starts_with(&self, prefix: &StorageKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<Vec<u8>> for StorageKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for StorageKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.to_hex())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// StorageAddress
// ---------------------------------------------------------------------------

/// One encoded key parameter together with the hasher applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyParam {
    pub hasher: StorageHasher,
    pub encoded: Vec<u8>,
}

impl KeyParam {
    pub fn new(hasher: StorageHasher, encoded: impl Into<Vec<u8>>) -> Self {
        Self {
            hasher,
            encoded: encoded.into(),
        }
    }
}

/// A fully resolved storage address: the item it names, the parameters it
/// was built from, and the resulting key bytes.
///
/// Built fresh for every query and never cached; the key is cheap to derive
/// and the value behind it changes from block to block anyway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageAddress {
    module: String,
    item: String,
    params: Vec<KeyParam>,
    key: StorageKey,
}

impl StorageAddress {
    /// Address of `module::item` with the given parameters.
    ///
    /// # Panics
    ///
    /// If `module` or `item` is empty or not ASCII. Names come from
    /// constants or chain metadata; a bad one is a bug at the call site.
    pub fn build(module: &str, item: &str, params: &[KeyParam]) -> Self {
        let mut builder = StorageKeyBuilder::new(module, item);
        for param in params {
            builder = builder.param(param.hasher, param.encoded.clone());
        }
        builder.build()
    }

    /// Prefix-only address, used to enumerate a map.
    pub fn prefix(module: &str, item: &str) -> Self {
        StorageKeyBuilder::new(module, item).build()
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn params(&self) -> &[KeyParam] {
        &self.params
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// True when no parameters were supplied.
    pub fn is_prefix(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for StorageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.item)?;
        if !self.params.is_empty() {
            write!(f, "[{} params]", self.params.len())?;
        }
        Ok(())
    }
}

/// The 32-byte prefix shared by every key of `module::item`.
pub fn storage_prefix(module: &str, item: &str) -> [u8; STORAGE_PREFIX_LEN] {
    let mut out = [0u8; STORAGE_PREFIX_LEN];
    out[..16].copy_from_slice(&twox_128(module.as_bytes()));
    out[16..].copy_from_slice(&twox_128(item.as_bytes()));
    out
}

// ---------------------------------------------------------------------------
// StorageKeyBuilder
// ---------------------------------------------------------------------------

/// Incremental builder for a [`StorageAddress`].
///
/// ```
/// use cess_query::storage::{StorageHasher, StorageKeyBuilder};
///
/// let account = [0x11u8; 32];
/// let address = StorageKeyBuilder::new("System", "Account")
///     .param(StorageHasher::Blake2_128Concat, account.to_vec())
///     .build();
///
/// // 32-byte prefix + 16-byte digest + 32-byte account.
/// assert_eq!(address.key().len(), 80);
/// assert!(address.key().to_hex().starts_with(
///     "0x26aa394eea5630e07c48ae0c9558cef7b99d880ec681799c0cf30e8886371da9"
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct StorageKeyBuilder {
    module: String,
    item: String,
    params: Vec<KeyParam>,
}

impl StorageKeyBuilder {
    /// Starts an address for `module::item`.
    ///
    /// # Panics
    ///
    /// If `module` or `item` is empty or contains non-ASCII characters.
    pub fn new(module: &str, item: &str) -> Self {
        assert!(
            is_identifier(module),
            "storage module name must be non-empty ASCII, got {:?}",
            module
        );
        assert!(
            is_identifier(item),
            "storage item name must be non-empty ASCII, got {:?}",
            item
        );
        Self {
            module: module.to_owned(),
            item: item.to_owned(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter hashed with `hasher`.
    pub fn param(mut self, hasher: StorageHasher, encoded: impl Into<Vec<u8>>) -> Self {
        self.params.push(KeyParam::new(hasher, encoded));
        self
    }

    /// Appends a parameter by direct concatenation.
    pub fn raw_param(self, encoded: impl Into<Vec<u8>>) -> Self {
        self.param(StorageHasher::Identity, encoded)
    }

    pub fn build(self) -> StorageAddress {
        let extra: usize = self
            .params
            .iter()
            .map(|p| p.hasher.digest_len() + p.encoded.len())
            .sum();
        let mut key = Vec::with_capacity(STORAGE_PREFIX_LEN + extra);
        key.extend_from_slice(&storage_prefix(&self.module, &self.item));
        for param in &self.params {
            param.hasher.hash_into(&param.encoded, &mut key);
        }
        StorageAddress {
            module: self.module,
            item: self.item,
            params: self.params,
            key: StorageKey(key),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.is_ascii()
}
