//! # Network Module
//!
//! Everything between a built storage address and the bytes a node holds
//! under it.
//!
//! ## Architecture
//!
//! ```text
//! transport.rs — ChainTransport trait: the node-facing seam
//! rpc.rs       — JSON-RPC 2.0 envelopes and Substrate method names
//! http.rs      — HttpTransport: JSON-RPC over HTTP with endpoint failover
//! memory.rs    — MemoryTransport: in-process node double for tests
//! gateway.rs   — ChainGateway: connection state, query outcomes, batching
//! metrics.rs   — GatewayMetrics: Prometheus counters
//! ```
//!
//! ## Design Decisions
//!
//! - The connection state is a `parking_lot::RwLock` owned by each gateway,
//!   read before a round trip and written after it. No lock is held across
//!   an `.await`.
//! - Retries belong to the transport. The gateway reports a failure once and
//!   leaves the decision to the caller.
//! - Prefix enumeration costs two round trips however many keys match: one
//!   to list keys, one to read them all at the same block.

pub mod gateway;
pub mod http;
pub mod memory;
pub mod metrics;
pub mod rpc;
pub mod transport;

pub use gateway::{
    ChainGateway, ConnectionState, GatewayError, HealthPolicy, PrefixBatch, PrefixEntry,
    QueryOutcome,
};
pub use http::{HttpSetupError, HttpTransport};
pub use memory::{CallCounts, MemoryTransport};
pub use metrics::GatewayMetrics;
pub use transport::{BatchValue, ChainTransport, TransportError};
