//! # CLI Interface
//!
//! Command-line structure for `cess-query`. Connection settings are global
//! flags with environment fallbacks so scripts can set them once.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cess_query::codec::Shape;
use cess_query::config::{ClientConfig, CESS_SS58_PREFIX, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RPC_ADDR};
use cess_query::storage::{KeyParam, StorageHasher};

/// Typed storage queries against a CESS chain node.
///
/// Results are printed as JSON on stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "cess-query",
    about = "Typed storage queries against a CESS chain node",
    version,
    propagate_version = true
)]
pub struct CessQueryCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// RPC endpoints, tried in order. Comma-separated in the environment.
    #[arg(
        long,
        env = "CESS_RPC",
        value_delimiter = ',',
        default_value = DEFAULT_RPC_ADDR,
        global = true
    )]
    pub rpc: Vec<String>,

    /// Request timeout in seconds. Raised to one block interval if lower.
    #[arg(
        long,
        env = "CESS_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(),
        global = true
    )]
    pub timeout_secs: u64,

    /// SS58 prefix for account addresses.
    #[arg(long, env = "CESS_SS58_PREFIX", default_value_t = CESS_SS58_PREFIX, global = true)]
    pub ss58_prefix: u16,

    /// SS58 address of the local signing account.
    #[arg(long, env = "CESS_SIGNATURE_ACCOUNT", global = true)]
    pub signature_account: Option<String>,

    #[arg(long, env = "CESS_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,

    /// Dump gateway metrics in Prometheus text format to stderr on exit.
    #[arg(long, global = true)]
    pub metrics: bool,
}

impl GlobalArgs {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .rpc_addrs(self.rpc.iter().cloned())
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .ss58_prefix(self.ss58_prefix);
        if let Some(account) = &self.signature_account {
            config = config.signature_account(account.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the node and report the connection state.
    Health,
    /// List every registered gateway peer ID.
    Peers,
    /// Look up the peer ID registered by one account.
    Peer(PeerArgs),
    /// Check whether an account authorized a gateway.
    Authorized(AuthorizedArgs),
    /// Read and decode an arbitrary storage item.
    Raw(RawArgs),
    /// Print the storage key for an item without contacting the node.
    Key(KeyArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct PeerArgs {
    /// SS58 address of the gateway account.
    #[arg(long)]
    pub account: String,
}

#[derive(Args, Debug)]
pub struct AuthorizedArgs {
    /// Hex-encoded 32-byte public key of the gateway.
    #[arg(long, value_parser = parse_hex)]
    pub peer: Vec<u8>,

    /// Account expected to have granted the authorization. Defaults to the
    /// signature account.
    #[arg(long)]
    pub account: Option<String>,
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Pallet name, e.g. `Oss`.
    #[arg(long)]
    pub module: String,

    /// Storage item name, e.g. `AuthorityList`.
    #[arg(long)]
    pub item: String,

    /// Key parameter as `<hasher>:<hex>`, e.g. `blake2_128concat:0x1234`.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<KeyParam>,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Shape of the stored value, e.g. `Option<{owner: [u8; 32], size: u128}>`.
    #[arg(long)]
    pub shape: Shape,
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<KeyParam, String> {
    let (hasher, data) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <hasher>:<hex>, got {:?}", s))?;
    let hasher: StorageHasher = hasher.parse()?;
    Ok(KeyParam::new(hasher, parse_hex(data)?))
}
