// Copyright (c) 2026 CESS Query Contributors. MIT License.
// See LICENSE for details.

//! # cess-query
//!
//! Entry point for the `cess-query` binary. Parses CLI arguments, sets up
//! logging and the RPC transport, runs one query and prints the result as
//! JSON.
//!
//! - `health`     — probe the node
//! - `peers`      — every registered gateway peer ID
//! - `peer`       — peer ID of one gateway account
//! - `authorized` — whether an account authorized a gateway
//! - `raw`        — read and decode any storage item
//! - `key`        — print a storage key, offline
//! - `version`    — print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use cess_query::config::{ClientConfig, CESS_SS58_PREFIX};
use cess_query::identity::{AccountCodec, Ss58Codec};
use cess_query::network::{ChainGateway, GatewayMetrics, HttpTransport};
use cess_query::resolver::ChainResolver;
use cess_query::storage::StorageAddress;

use cli::{CessQueryCli, Commands, KeyArgs};

type Resolver = ChainResolver<HttpTransport, Ss58Codec>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CessQueryCli::parse();

    match &cli.command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Key(args) => {
            let address = build_address(args)?;
            print_json(&json!({
                "module": address.module(),
                "item": address.item(),
                "key": address.key().to_hex(),
            }))?;
            return Ok(());
        }
        _ => {}
    }

    logging::init_logging("cess_query=info", cli.global.log_format);

    let config = cli.global.client_config();
    config.validate().context("invalid client configuration")?;
    let transport = HttpTransport::new(&config).context("failed to set up rpc transport")?;
    let codec = Ss58Codec::new(config.ss58_prefix).context("invalid ss58 prefix")?;

    let metrics = Arc::new(GatewayMetrics::new());
    let gateway = ChainGateway::with_metrics(transport, metrics.clone());
    let resolver = ChainResolver::new(gateway, codec);

    tracing::debug!(rpc = ?config.rpc, timeout = ?config.timeout, "client configured");
    let result = run_command(&resolver, &config, cli.command).await;

    if cli.global.metrics {
        match metrics.encode() {
            Ok(text) => eprint!("{}", text),
            Err(e) => tracing::error!("failed to encode metrics: {}", e),
        }
    }

    print_json(&result?)
}

async fn run_command(resolver: &Resolver, config: &ClientConfig, command: Commands) -> Result<Value> {
    match command {
        Commands::Health => {
            let healthy = resolver.check_health().await;
            Ok(json!({
                "endpoint": resolver.gateway().transport().active_endpoint(),
                "healthy": healthy,
                "state": resolver.gateway().connection_state(),
            }))
        }
        Commands::Peers => {
            let peers = resolver
                .resolve_peer_registry()
                .await
                .context("failed to enumerate the peer registry")?;
            Ok(json!({ "count": peers.len(), "peers": peers }))
        }
        Commands::Peer(args) => {
            let account = resolver
                .codec()
                .from_display(&args.account)
                .with_context(|| format!("invalid account address {}", args.account))?;
            let peer = resolver
                .query_peer_id(&account)
                .await
                .context("failed to query the peer id")?;
            Ok(json!({ "account": args.account, "peer_id": peer }))
        }
        Commands::Authorized(args) => {
            let local = args
                .account
                .or_else(|| config.signature_account.clone())
                .ok_or_else(|| anyhow!("no --account given and CESS_SIGNATURE_ACCOUNT is not set"))?;
            let grantor = resolver
                .query_authorized_account(&args.peer)
                .await
                .context("failed to query the authority list")?;
            let grantor_display = grantor.map(|account| resolver.codec().to_display(&account));
            let authorization = resolver.judge_authorization(&args.peer, grantor, &local);
            Ok(json!({
                "peer": format!("0x{}", hex::encode(&args.peer)),
                "account": local,
                "grantor": grantor_display,
                "authorization": authorization,
            }))
        }
        Commands::Raw(args) => {
            build_address(&args.key)?;
            let value = resolver
                .query_raw(&args.key.module, &args.key.item, &args.key.params, &args.shape)
                .await
                .with_context(|| format!("failed to read {}::{}", args.key.module, args.key.item))?;
            Ok(json!({
                "module": args.key.module,
                "item": args.key.item,
                "shape": args.shape.to_string(),
                "present": value.is_some(),
                "value": value.map(|v| v.to_json()),
            }))
        }
        Commands::Key(_) | Commands::Version => bail!("handled before connecting"),
    }
}

/// Builds the address after checking the names the builder would panic on.
fn build_address(args: &KeyArgs) -> Result<StorageAddress> {
    for (what, name) in [("module", &args.module), ("item", &args.item)] {
        ensure!(
            !name.is_empty() && name.is_ascii(),
            "{} name must be non-empty ASCII, got {:?}",
            what,
            name
        );
    }
    Ok(StorageAddress::build(&args.module, &args.item, &args.params))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("cess-query {}", env!("CARGO_PKG_VERSION"));
    println!("ss58       {}", CESS_SS58_PREFIX);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
