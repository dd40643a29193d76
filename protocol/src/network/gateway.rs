//! # Chain Query Gateway
//!
//! Owns the connection state for one logical node connection and turns
//! transport results into outcomes callers have to branch on.
//!
//! ```text
//!            probe ok / round trip ok
//!   Unknown ─────────────────────────► Up
//!      │                               │ ▲
//!      │ probe failed                  │ │ probe ok
//!      ▼         connection lost       ▼ │
//!    Down ◄────────────────────────────┘ │
//!      └─────────────────────────────────┘
//! ```
//!
//! While `Down`, queries return [`QueryOutcome::ConnectionDown`] without
//! touching the transport. Leaving `Down` takes an explicit
//! [`ChainGateway::check_health`], unless the gateway was built with
//! [`HealthPolicy::BeforeEveryQuery`].
//!
//! Nothing is cached. Every query reflects the node at call time.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::metrics::GatewayMetrics;
use super::transport::{ChainTransport, TransportError};
use crate::codec::{decode_with, DecodeMode, Shape, TypedValue};
use crate::storage::{StorageAddress, StorageKey};

// ---------------------------------------------------------------------------
// State and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No probe or round trip has completed yet.
    Unknown,
    Up,
    Down,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Unknown => "unknown",
            ConnectionState::Up => "up",
            ConnectionState::Down => "down",
        })
    }
}

/// When the gateway probes the node on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthPolicy {
    /// Probe only while the state is still `Unknown`.
    #[default]
    OnDemand,
    /// Probe before every query, including while `Down`.
    BeforeEveryQuery,
}

/// Result of a single-key query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Present(Vec<u8>),
    /// The node holds nothing under the key.
    Absent,
    TransportFailure(TransportError),
    /// Refused without a round trip.
    ConnectionDown,
}

impl QueryOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, QueryOutcome::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, QueryOutcome::Absent)
    }

    /// Folds the failure cases into an error, keeping absence as `None`.
    pub fn into_result(self) -> Result<Option<Vec<u8>>, GatewayError> {
        match self {
            QueryOutcome::Present(bytes) => Ok(Some(bytes)),
            QueryOutcome::Absent => Ok(None),
            QueryOutcome::TransportFailure(e) => Err(GatewayError::Transport(e)),
            QueryOutcome::ConnectionDown => Err(GatewayError::ConnectionDown),
        }
    }
}

/// Failures of gateway operations that do not produce a [`QueryOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("connection to the chain node is down")]
    ConnectionDown,

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// One decoded member of a prefix enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    pub key: StorageKey,
    pub value: TypedValue,
}

/// Decoded members of a prefix enumeration, in transport order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixBatch {
    pub entries: Vec<PrefixEntry>,
    /// Members that were absent at read time, unreadable, or failed to
    /// decode.
    pub skipped: usize,
}

impl PrefixBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ChainGateway
// ---------------------------------------------------------------------------

pub struct ChainGateway<T> {
    transport: T,
    state: RwLock<ConnectionState>,
    policy: HealthPolicy,
    metrics: Arc<GatewayMetrics>,
}

impl<T: ChainTransport> ChainGateway<T> {
    pub fn new(transport: T) -> Self {
        Self::with_metrics(transport, Arc::new(GatewayMetrics::new()))
    }

    pub fn with_metrics(transport: T, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            transport,
            state: RwLock::new(ConnectionState::Unknown),
            policy: HealthPolicy::default(),
            metrics,
        }
    }

    pub fn with_health_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Probes the node and records the result.
    pub async fn check_health(&self) -> bool {
        self.metrics.health_checks_total.inc();
        match self.transport.probe().await {
            Ok(()) => {
                self.set_state(ConnectionState::Up);
                true
            }
            Err(e) => {
                debug!(error = %e, "health probe failed");
                self.set_state(ConnectionState::Down);
                false
            }
        }
    }

    /// Reads the value under one fully built address.
    pub async fn query_single(&self, address: &StorageAddress) -> QueryOutcome {
        if !self.ready().await {
            return QueryOutcome::ConnectionDown;
        }

        let started = Instant::now();
        self.metrics.round_trips_total.inc();
        let result = self.transport.get_storage(address.key()).await;
        self.metrics
            .round_trip_seconds
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(Some(bytes)) => {
                self.set_state(ConnectionState::Up);
                debug!(%address, len = bytes.len(), "storage value present");
                QueryOutcome::Present(bytes)
            }
            Ok(None) => {
                self.set_state(ConnectionState::Up);
                self.metrics.absent_total.inc();
                debug!(%address, "storage value absent");
                QueryOutcome::Absent
            }
            Err(e) => {
                self.record_failure(&e);
                QueryOutcome::TransportFailure(e)
            }
        }
    }

    /// Enumerates every key under `prefix` and fetches the values in one
    /// batched read, decoding each as exactly `shape`.
    ///
    /// Members that are absent, unreadable, or do not decode are skipped
    /// and counted; they never fail the enumeration.
    pub async fn query_prefix(
        &self,
        prefix: &StorageAddress,
        shape: &Shape,
    ) -> Result<PrefixBatch, GatewayError> {
        self.query_prefix_with(prefix, shape, DecodeMode::Exact).await
    }

    /// [`query_prefix`](Self::query_prefix) with a choice of what to do
    /// with bytes after each member's value.
    pub async fn query_prefix_with(
        &self,
        prefix: &StorageAddress,
        shape: &Shape,
        mode: DecodeMode,
    ) -> Result<PrefixBatch, GatewayError> {
        if !self.ready().await {
            return Err(GatewayError::ConnectionDown);
        }

        let started = Instant::now();
        self.metrics.round_trips_total.inc();
        let keys = match self.transport.get_keys(prefix.key()).await {
            Ok(keys) => keys,
            Err(e) => {
                self.record_failure(&e);
                return Err(e.into());
            }
        };
        self.set_state(ConnectionState::Up);
        debug!(%prefix, keys = keys.len(), "enumerated prefix");

        if keys.is_empty() {
            return Ok(PrefixBatch::default());
        }

        self.metrics.round_trips_total.inc();
        let values = match self.transport.query_storage_at(&keys).await {
            Ok(values) => values,
            Err(e) => {
                self.record_failure(&e);
                return Err(e.into());
            }
        };
        self.metrics
            .round_trip_seconds
            .observe(started.elapsed().as_secs_f64());

        let mut batch = PrefixBatch::default();
        for (key, value) in values {
            let bytes = match value {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!(%key, "batch member vanished before read");
                    batch.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(%key, error = %e, "skipping unreadable batch member");
                    batch.skipped += 1;
                    continue;
                }
            };
            match decode_with(&bytes, shape, mode) {
                Ok(value) => batch.entries.push(PrefixEntry { key, value }),
                Err(e) => {
                    warn!(%key, error = %e, "skipping undecodable batch member");
                    batch.skipped += 1;
                }
            }
        }
        self.metrics.skipped_entries_total.inc_by(batch.skipped as u64);

        Ok(batch)
    }

    /// Whether a query may go out. Never holds the state lock across the
    /// probe.
    async fn ready(&self) -> bool {
        let state = self.connection_state();
        let go = match (state, self.policy) {
            (_, HealthPolicy::BeforeEveryQuery) | (ConnectionState::Unknown, _) => {
                self.check_health().await
            }
            (ConnectionState::Up, _) => true,
            (ConnectionState::Down, _) => false,
        };
        if !go {
            self.metrics.connection_down_total.inc();
        }
        go
    }

    fn record_failure(&self, error: &TransportError) {
        self.metrics.transport_failures_total.inc();
        if error.is_connection_loss() {
            self.set_state(ConnectionState::Down);
        }
        warn!(error = %error, "storage round trip failed");
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, next)
        };
        self.metrics
            .connection_up
            .set(i64::from(next == ConnectionState::Up));
        if previous != next {
            match next {
                ConnectionState::Down => warn!(from = %previous, "chain connection down"),
                _ => info!(from = %previous, to = %next, "chain connection state changed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::memory::MemoryTransport;
    use crate::storage::items::SYSTEM_NUMBER;

    fn gateway() -> ChainGateway<Arc<MemoryTransport>> {
        ChainGateway::new(Arc::new(MemoryTransport::new()))
    }

    #[tokio::test]
    async fn first_query_probes_once() {
        let gw = gateway();
        assert_eq!(gw.connection_state(), ConnectionState::Unknown);

        gw.query_single(&SYSTEM_NUMBER.prefix()).await;
        gw.query_single(&SYSTEM_NUMBER.prefix()).await;

        assert_eq!(gw.transport().calls().probe, 1);
        assert_eq!(gw.transport().calls().get_storage, 2);
        assert_eq!(gw.connection_state(), ConnectionState::Up);
    }

    #[tokio::test]
    async fn present_and_absent_are_distinct() {
        let gw = gateway();
        let address = SYSTEM_NUMBER.prefix();
        assert_eq!(gw.query_single(&address).await, QueryOutcome::Absent);

        gw.transport().insert(address.key().clone(), vec![0, 0, 0, 0]);
        assert_eq!(
            gw.query_single(&address).await,
            QueryOutcome::Present(vec![0, 0, 0, 0])
        );
        assert_eq!(gw.metrics().absent_total.get(), 1);
    }

    #[tokio::test]
    async fn connection_loss_flips_state_down() {
        let gw = gateway();
        assert!(gw.check_health().await);

        gw.transport().set_alive(false);
        let outcome = gw.query_single(&SYSTEM_NUMBER.prefix()).await;
        assert!(matches!(outcome, QueryOutcome::TransportFailure(_)));
        assert_eq!(gw.connection_state(), ConnectionState::Down);
    }

    #[tokio::test]
    async fn rpc_error_keeps_state_up() {
        let gw = gateway();
        assert!(gw.check_health().await);

        gw.transport().fail_next(TransportError::Rpc {
            code: -32602,
            message: "invalid params".into(),
        });
        let outcome = gw.query_single(&SYSTEM_NUMBER.prefix()).await;
        assert!(matches!(outcome, QueryOutcome::TransportFailure(_)));
        assert_eq!(gw.connection_state(), ConnectionState::Up);
    }

    #[tokio::test]
    async fn explicit_probe_recovers_from_down() {
        let gw = gateway();
        gw.transport().set_alive(false);
        assert!(!gw.check_health().await);
        assert_eq!(
            gw.query_single(&SYSTEM_NUMBER.prefix()).await,
            QueryOutcome::ConnectionDown
        );

        gw.transport().set_alive(true);
        assert!(gw.check_health().await);
        assert_eq!(
            gw.query_single(&SYSTEM_NUMBER.prefix()).await,
            QueryOutcome::Absent
        );
    }

    #[tokio::test]
    async fn probing_policy_reconnects_on_its_own() {
        let gw = gateway().with_health_policy(HealthPolicy::BeforeEveryQuery);
        gw.transport().set_alive(false);
        assert_eq!(
            gw.query_single(&SYSTEM_NUMBER.prefix()).await,
            QueryOutcome::ConnectionDown
        );

        gw.transport().set_alive(true);
        assert_eq!(
            gw.query_single(&SYSTEM_NUMBER.prefix()).await,
            QueryOutcome::Absent
        );
        assert_eq!(gw.transport().calls().probe, 2);
    }

    #[tokio::test]
    async fn empty_prefix_skips_the_batch_read() {
        let gw = gateway();
        let batch = gw
            .query_prefix(&SYSTEM_NUMBER.prefix(), &Shape::u32())
            .await
            .unwrap();
        assert!(batch.is_empty());
        assert_eq!(gw.transport().calls().query_storage_at, 0);
    }

    #[test]
    fn outcome_into_result() {
        assert_eq!(QueryOutcome::Absent.into_result(), Ok(None));
        assert_eq!(
            QueryOutcome::Present(vec![1]).into_result(),
            Ok(Some(vec![1]))
        );
        assert_eq!(
            QueryOutcome::ConnectionDown.into_result(),
            Err(GatewayError::ConnectionDown)
        );
    }
}
