//! Storage items the client knows how to address.
//!
//! Which hasher a map uses is declared by the runtime and published in its
//! metadata. The constants below mirror the current CESS runtime. Callers
//! that read metadata at startup can replace the hashers with
//! [`StorageItem::with_hashers`] instead of trusting these defaults.

use std::borrow::Cow;

use super::hasher::StorageHasher;
use super::key::{StorageAddress, StorageKeyBuilder};
use crate::config;

/// A storage item and the hasher declared for each of its key parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageItem {
    pallet: Cow<'static, str>,
    name: Cow<'static, str>,
    hashers: Cow<'static, [StorageHasher]>,
}

impl StorageItem {
    /// Item description usable in `const` context.
    pub const fn new_static(
        pallet: &'static str,
        name: &'static str,
        hashers: &'static [StorageHasher],
    ) -> Self {
        Self {
            pallet: Cow::Borrowed(pallet),
            name: Cow::Borrowed(name),
            hashers: Cow::Borrowed(hashers),
        }
    }

    /// Item description built at runtime, e.g. from chain metadata.
    pub fn new(
        pallet: impl Into<String>,
        name: impl Into<String>,
        hashers: Vec<StorageHasher>,
    ) -> Self {
        Self {
            pallet: Cow::Owned(pallet.into()),
            name: Cow::Owned(name.into()),
            hashers: Cow::Owned(hashers),
        }
    }

    /// Replaces the declared hashers.
    pub fn with_hashers(mut self, hashers: Vec<StorageHasher>) -> Self {
        self.hashers = Cow::Owned(hashers);
        self
    }

    pub fn pallet(&self) -> &str {
        &self.pallet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hashers(&self) -> &[StorageHasher] {
        &self.hashers
    }

    /// Address for the given encoded parameters. Supplying fewer
    /// parameters than the item declares yields a partial prefix.
    ///
    /// # Panics
    ///
    /// If more parameters are supplied than the item has hashers for.
    pub fn address(&self, params: &[&[u8]]) -> StorageAddress {
        assert!(
            params.len() <= self.hashers.len(),
            "{}::{} takes {} key parameters, got {}",
            self.pallet,
            self.name,
            self.hashers.len(),
            params.len()
        );
        let mut builder = StorageKeyBuilder::new(&self.pallet, &self.name);
        for (hasher, param) in self.hashers.iter().zip(params) {
            builder = builder.param(*hasher, param.to_vec());
        }
        builder.build()
    }

    /// Prefix covering every entry of the item.
    pub fn prefix(&self) -> StorageAddress {
        self.address(&[])
    }
}

/// `Oss::Oss`: account → DeOSS peer identifier.
pub const OSS_PEERS: StorageItem = StorageItem::new_static(
    config::PALLET_OSS,
    config::ITEM_OSS,
    &[StorageHasher::Blake2_128Concat],
);

/// `Oss::AuthorityList`: DeOSS account → account that authorized it.
pub const OSS_AUTHORITY_LIST: StorageItem = StorageItem::new_static(
    config::PALLET_OSS,
    config::ITEM_AUTHORITY_LIST,
    &[StorageHasher::Blake2_128Concat],
);

/// `Sminer::AllMiner`: plain value listing every miner account.
pub const SMINER_ALL_MINER: StorageItem =
    StorageItem::new_static(config::PALLET_SMINER, config::ITEM_ALL_MINER, &[]);

/// `StorageHandler::UserOwnedSpace`: account → purchased space record.
pub const USER_OWNED_SPACE: StorageItem = StorageItem::new_static(
    config::PALLET_STORAGE_HANDLER,
    config::ITEM_USER_OWNED_SPACE,
    &[StorageHasher::Blake2_128Concat],
);

/// `System::Account`: account → nonce and balances.
pub const SYSTEM_ACCOUNT: StorageItem = StorageItem::new_static(
    config::PALLET_SYSTEM,
    config::ITEM_ACCOUNT,
    &[StorageHasher::Blake2_128Concat],
);

/// `System::Number`: current block number.
pub const SYSTEM_NUMBER: StorageItem =
    StorageItem::new_static(config::PALLET_SYSTEM, config::ITEM_NUMBER, &[]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_items_address_like_the_builder() {
        let account = [1u8; 32];
        let via_item = OSS_AUTHORITY_LIST.address(&[&account]);
        let via_builder = StorageKeyBuilder::new("Oss", "AuthorityList")
            .param(StorageHasher::Blake2_128Concat, account.to_vec())
            .build();
        assert_eq!(via_item, via_builder);
    }

    #[test]
    fn overriding_hashers_changes_the_key() {
        let peer = [2u8; 38];
        let declared = OSS_PEERS.address(&[&peer]);
        let direct = OSS_PEERS
            .clone()
            .with_hashers(vec![StorageHasher::Identity])
            .address(&[&peer]);
        assert_ne!(declared.key(), direct.key());
        assert_eq!(direct.key().len(), 32 + 38);
    }

    #[test]
    fn prefix_has_no_params() {
        assert!(OSS_PEERS.prefix().is_prefix());
        assert_eq!(OSS_PEERS.prefix().key().len(), 32);
    }

    #[test]
    #[should_panic(expected = "takes 0 key parameters")]
    fn too_many_params_panics() {
        SYSTEM_NUMBER.address(&[b"x"]);
    }
}
