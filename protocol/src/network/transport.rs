//! The chain RPC collaborator seam.
//!
//! The gateway never speaks a wire protocol itself. Anything that can read
//! storage at the node's best block implements [`ChainTransport`]:
//! [`HttpTransport`](super::http::HttpTransport) in production,
//! [`MemoryTransport`](super::memory::MemoryTransport) in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::StorageKey;

/// Failures reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The node could not be reached or dropped the connection.
    #[error("node unreachable: {0}")]
    Disconnected(String),

    /// No answer within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// True for failures that mean the node is gone rather than that one
    /// request went wrong.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            TransportError::Disconnected(_) | TransportError::Timeout(_)
        )
    }
}

/// One member of a batched read. A member whose payload cannot be read
/// fails on its own and leaves the rest of the batch intact.
pub type BatchValue = Result<Option<Vec<u8>>, TransportError>;

/// Read access to a node's storage at its best block.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Lightweight liveness check.
    async fn probe(&self) -> Result<(), TransportError>;

    /// Value under `key`, or `None` when the node holds nothing there.
    async fn get_storage(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, TransportError>;

    /// Every key starting with `prefix`, in the node's order.
    async fn get_keys(&self, prefix: &StorageKey) -> Result<Vec<StorageKey>, TransportError>;

    /// Values of all `keys` read at one block, in the order requested.
    /// The outer error fails the whole batch; a member's own error does not.
    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
    ) -> Result<Vec<(StorageKey, BatchValue)>, TransportError>;
}

#[async_trait]
impl<T: ChainTransport + ?Sized> ChainTransport for Arc<T> {
    async fn probe(&self) -> Result<(), TransportError> {
        (**self).probe().await
    }

    async fn get_storage(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).get_storage(key).await
    }

    async fn get_keys(&self, prefix: &StorageKey) -> Result<Vec<StorageKey>, TransportError> {
        (**self).get_keys(prefix).await
    }

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
    ) -> Result<Vec<(StorageKey, BatchValue)>, TransportError> {
        (**self).query_storage_at(keys).await
    }
}
