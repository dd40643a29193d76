//! # Client Configuration & Constants
//!
//! Every chain-facing constant the query client relies on lives here: pallet
//! and storage item names, fixed payload lengths, timing parameters, and the
//! [`ClientConfig`] that the CLI (or any embedding application) builds before
//! opening a connection.
//!
//! Pallet and item names are part of the storage key derivation. A typo here
//! does not fail loudly; it silently addresses an empty slot and every query
//! comes back `Absent`. Keep them byte-exact with the runtime.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Block production interval of the chain, in seconds.
pub const BLOCK_INTERVAL_SECS: u64 = 6;

/// Block production interval. Request timeouts are never configured below
/// this: a read that cannot outlive one block is guaranteed to race the node.
pub const BLOCK_INTERVAL: Duration = Duration::from_secs(BLOCK_INTERVAL_SECS);

/// Default per-request timeout for RPC round trips.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default RPC endpoint of a locally running node.
pub const DEFAULT_RPC_ADDR: &str = "http://127.0.0.1:9944";

/// Page size used when enumerating storage keys. Nodes cap
/// `state_getKeysPaged` at 1000 keys per call.
pub const KEYS_PAGE_SIZE: u32 = 1000;

/// Most keys one prefix enumeration will collect before giving up.
pub const MAX_ENUMERATED_KEYS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Pallets
// ---------------------------------------------------------------------------

/// Pallet holding DeOSS gateway registrations and space authorizations.
pub const PALLET_OSS: &str = "Oss";

/// Pallet holding storage miner registrations.
pub const PALLET_SMINER: &str = "Sminer";

/// Pallet holding purchased space per user.
pub const PALLET_STORAGE_HANDLER: &str = "StorageHandler";

/// Pallet holding account nonces and balances.
pub const PALLET_SYSTEM: &str = "System";

// ---------------------------------------------------------------------------
// Storage items
// ---------------------------------------------------------------------------

/// `Oss::Oss` — DeOSS peer identifier, keyed by the operator's account.
pub const ITEM_OSS: &str = "Oss";

/// `Oss::AuthorityList` — the account that authorized a given DeOSS key.
pub const ITEM_AUTHORITY_LIST: &str = "AuthorityList";

/// `Sminer::AllMiner` — the list of registered miner accounts.
pub const ITEM_ALL_MINER: &str = "AllMiner";

/// `StorageHandler::UserOwnedSpace` — space purchased by an account.
pub const ITEM_USER_OWNED_SPACE: &str = "UserOwnedSpace";

/// `System::Account` — nonce and balance data of an account.
pub const ITEM_ACCOUNT: &str = "Account";

/// `System::Number` — the current block number.
pub const ITEM_NUMBER: &str = "Number";

// ---------------------------------------------------------------------------
// Payload sizes
// ---------------------------------------------------------------------------

/// Length of an on-chain account identifier (sr25519/ed25519 public key).
pub const ACCOUNT_ID_LEN: usize = 32;

/// Length of a libp2p peer identifier as stored on chain.
pub const PEER_ID_LEN: usize = 38;

// ---------------------------------------------------------------------------
// Address encoding
// ---------------------------------------------------------------------------

/// SS58 network prefix of CESS accounts. Addresses render with a `cX` lead.
pub const CESS_SS58_PREFIX: u16 = 11330;

/// Generic Substrate SS58 prefix, used by development chains.
pub const SUBSTRATE_SS58_PREFIX: u16 = 42;

/// Highest prefix representable in the two-byte SS58 form.
pub const MAX_SS58_PREFIX: u16 = 16383;

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Errors raised by [`ClientConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No RPC endpoint was configured.
    #[error("no rpc address configured")]
    NoRpcAddress,

    /// An endpoint is not an `http(s)://` URL.
    #[error("unsupported rpc address '{0}': expected http:// or https://")]
    UnsupportedRpcAddress(String),

    /// The SS58 prefix does not fit the two-byte prefix form.
    #[error("ss58 prefix {0} out of range (max {MAX_SS58_PREFIX})")]
    Ss58PrefixOutOfRange(u16),
}

/// Settings for one logical connection to the chain.
///
/// Built with chained option methods, then checked once with
/// [`validate`](Self::validate):
///
/// ```
/// use std::time::Duration;
/// use cess_query::config::ClientConfig;
///
/// let cfg = ClientConfig::default()
///     .rpc_addrs(["http://10.0.0.1:9944", "http://10.0.0.2:9944"])
///     .request_timeout(Duration::from_secs(2))
///     .name("gateway-probe");
///
/// // Timeouts shorter than a block are raised to one block interval.
/// assert_eq!(cfg.timeout, cess_query::config::BLOCK_INTERVAL);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// RPC endpoints in order of preference.
    pub rpc: Vec<String>,
    /// Per-request timeout, never below [`BLOCK_INTERVAL`].
    pub timeout: Duration,
    /// Client name, attached to log spans.
    pub name: String,
    /// SS58 prefix used to render account identifiers.
    pub ss58_prefix: u16,
    /// SS58 address of the local signing account, if the caller has one.
    pub signature_account: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc: vec![DEFAULT_RPC_ADDR.to_string()],
            timeout: DEFAULT_REQUEST_TIMEOUT,
            name: "cess-query".to_string(),
            ss58_prefix: CESS_SS58_PREFIX,
            signature_account: None,
        }
    }
}

impl ClientConfig {
    /// Replaces the RPC endpoint list.
    pub fn rpc_addrs<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rpc = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request timeout, clamped to at least one block interval.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(BLOCK_INTERVAL);
        self
    }

    /// Sets the client name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the SS58 prefix used for account display strings.
    pub fn ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    /// Sets the SS58 address of the local signing account.
    pub fn signature_account(mut self, account: impl Into<String>) -> Self {
        self.signature_account = Some(account.into());
        self
    }

    /// Checks the configuration for values no transport could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.is_empty() {
            return Err(ConfigError::NoRpcAddress);
        }
        for addr in &self.rpc {
            if !(addr.starts_with("http://") || addr.starts_with("https://")) {
                return Err(ConfigError::UnsupportedRpcAddress(addr.clone()));
            }
        }
        if self.ss58_prefix > MAX_SS58_PREFIX {
            return Err(ConfigError::Ss58PrefixOutOfRange(self.ss58_prefix));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ClientConfig::default().validate(), Ok(()));
    }

    #[test]
    fn timeout_is_clamped_to_block_interval() {
        let cfg = ClientConfig::default().request_timeout(Duration::from_millis(10));
        assert_eq!(cfg.timeout, BLOCK_INTERVAL);

        let cfg = ClientConfig::default().request_timeout(Duration::from_secs(60));
        assert_eq!(cfg.timeout, Duration::from_secs(60));
    }

    #[test]
    fn empty_rpc_list_is_rejected() {
        let cfg = ClientConfig::default().rpc_addrs(Vec::<String>::new());
        assert_eq!(cfg.validate(), Err(ConfigError::NoRpcAddress));
    }

    #[test]
    fn websocket_addresses_are_rejected() {
        let cfg = ClientConfig::default().rpc_addrs(["ws://127.0.0.1:9944"]);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsupportedRpcAddress(_))
        ));
    }

    #[test]
    fn ss58_prefix_range() {
        let cfg = ClientConfig::default().ss58_prefix(MAX_SS58_PREFIX + 1);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Ss58PrefixOutOfRange(MAX_SS58_PREFIX + 1))
        );
    }

    #[test]
    fn block_interval_constants_agree() {
        assert_eq!(BLOCK_INTERVAL.as_secs(), BLOCK_INTERVAL_SECS);
        assert!(DEFAULT_REQUEST_TIMEOUT >= BLOCK_INTERVAL);
    }
}
