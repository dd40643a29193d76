// Copyright (c) 2026 CESS Query Contributors. MIT License.
// See LICENSE for details.

//! # CESS Query — Typed Storage Reads
//!
//! Client-side protocol for reading a CESS chain node's storage: build the
//! key, fetch the bytes, decode them into a typed value, and combine several
//! reads into the answer the caller actually asked for.
//!
//! ## Architecture
//!
//! ```text
//! resolver ──► network::gateway ──► network::transport ──► node
//!    │               │
//!    │               └──► codec::decode
//!    └──► storage::key
//! ```
//!
//! - **config** — Protocol constants, pallet and item names, `ClientConfig`.
//! - **crypto** — The xxHash and BLAKE2b digests storage keys are built from.
//! - **codec** — Shape descriptions, the bounds-checked decoder, the encoder.
//! - **storage** — Storage hashers, key construction, known storage items.
//! - **identity** — Account and peer identifiers, SS58 text form.
//! - **network** — Transport seam, JSON-RPC over HTTP, the query gateway.
//! - **resolver** — Multi-read facts: peer registry, authorization.
//!
//! ## Quick look
//!
//! ```no_run
//! use cess_query::config::ClientConfig;
//! use cess_query::identity::Ss58Codec;
//! use cess_query::network::{ChainGateway, HttpTransport};
//! use cess_query::resolver::ChainResolver;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().rpc_addrs(["http://127.0.0.1:9944"]);
//! let transport = HttpTransport::new(&config)?;
//! let resolver = ChainResolver::new(ChainGateway::new(transport), Ss58Codec::cess());
//!
//! for peer in resolver.resolve_peer_registry().await? {
//!     println!("{peer}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod network;
pub mod resolver;
pub mod storage;
