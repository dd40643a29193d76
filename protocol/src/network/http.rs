//! JSON-RPC over HTTP.
//!
//! ```text
//! endpoints: [a, b, c]     active: a
//!
//! call ──► a ──ok──► result
//!          │
//!          └─connection lost──► b ──ok──► result   (active := b)
//!                               │
//!                               └─► c ──► ... until every endpoint failed once
//! ```
//!
//! Only connection loss moves on to the next endpoint. An RPC error or a
//! malformed reply is an answer, and is returned as is.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::rpc::{decode_hex_data, RpcMethod, RpcRequest, RpcResponse, StorageChangeSet, SystemHealth};
use super::transport::{BatchValue, ChainTransport, TransportError};
use crate::config::{ClientConfig, ConfigError, KEYS_PAGE_SIZE, MAX_ENUMERATED_KEYS};
use crate::storage::StorageKey;

/// Errors building an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum HttpSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpTransport {
    client: Client,
    endpoints: Vec<String>,
    active: AtomicUsize,
    request_id: AtomicU64,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, HttpSetupError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)))
            .user_agent(config.name.clone())
            .build()?;

        Ok(Self {
            client,
            endpoints: config.rpc.clone(),
            active: AtomicUsize::new(0),
            request_id: AtomicU64::new(1),
            timeout: config.timeout,
        })
    }

    /// The endpoint requests currently go to.
    pub fn active_endpoint(&self) -> &str {
        &self.endpoints[self.active.load(Ordering::Relaxed) % self.endpoints.len()]
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<R, TransportError> {
        let start = self.active.load(Ordering::Relaxed);
        let mut last_error = None;

        for attempt in 0..self.endpoints.len() {
            let index = (start + attempt) % self.endpoints.len();
            let endpoint = &self.endpoints[index];
            match self.call_endpoint(endpoint, method, params.clone()).await {
                Ok(result) => {
                    if index != start % self.endpoints.len() {
                        warn!(endpoint = %endpoint, "switched rpc endpoint");
                        self.active.store(index, Ordering::Relaxed);
                    }
                    return Ok(result);
                }
                Err(e) if e.is_connection_loss() => {
                    debug!(endpoint = %endpoint, error = %e, "rpc endpoint unreachable");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| TransportError::Disconnected("no rpc endpoint configured".into())))
    }

    async fn call_endpoint<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<R, TransportError> {
        let request = RpcRequest::new(self.next_id(), method, params);
        debug!(endpoint, method = %method, id = request.id, "rpc request");

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(endpoint, e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::Disconnected(format!(
                "{} answered http {}",
                endpoint, status
            )));
        }
        if !status.is_success() {
            return Err(TransportError::Malformed(format!("http status {}", status)));
        }

        let rpc_response: RpcResponse = response
            .json()
            .await
            .map_err(|e| self.map_reqwest_error(endpoint, e))?;

        if let Some(error) = rpc_response.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(rpc_response.result)
            .map_err(|e| TransportError::Malformed(format!("{} result: {}", method, e)))
    }

    fn map_reqwest_error(&self, endpoint: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() || e.is_request() {
            TransportError::Disconnected(format!("cannot connect to {}: {}", endpoint, e))
        } else if e.is_decode() {
            TransportError::Malformed(e.to_string())
        } else {
            TransportError::Disconnected(e.to_string())
        }
    }
}

#[async_trait]
impl ChainTransport for HttpTransport {
    async fn probe(&self) -> Result<(), TransportError> {
        let health: SystemHealth = self
            .call(RpcMethod::SystemHealth, serde_json::json!([]))
            .await?;
        debug!(peers = health.peers, syncing = health.is_syncing, "node health");
        Ok(())
    }

    async fn get_storage(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, TransportError> {
        let data: Option<String> = self
            .call(RpcMethod::GetStorage, serde_json::json!([key.to_hex()]))
            .await?;
        data.map(|hex| decode_storage_data(&hex)).transpose()
    }

    async fn get_keys(&self, prefix: &StorageKey) -> Result<Vec<StorageKey>, TransportError> {
        let prefix_hex = prefix.to_hex();
        let mut keys: Vec<StorageKey> = Vec::new();

        loop {
            let start_key = keys.last().map(StorageKey::to_hex);
            let page: Vec<String> = self
                .call(
                    RpcMethod::GetKeysPaged,
                    serde_json::json!([prefix_hex, KEYS_PAGE_SIZE, start_key]),
                )
                .await?;
            let full_page = page.len() >= KEYS_PAGE_SIZE as usize;
            for raw in &page {
                let key = StorageKey::from_hex(raw)
                    .map_err(|e| TransportError::Malformed(format!("storage key: {}", e)))?;
                // Keys ascend across pages.
                if let Some(previous) = keys.last() {
                    if key <= *previous {
                        return Err(TransportError::Malformed(format!(
                            "key page went back from {} to {}",
                            previous, key
                        )));
                    }
                }
                keys.push(key);
            }
            if keys.len() > MAX_ENUMERATED_KEYS {
                return Err(TransportError::Malformed(format!(
                    "prefix {} holds more than {} keys",
                    prefix_hex, MAX_ENUMERATED_KEYS
                )));
            }
            if !full_page {
                break;
            }
        }

        Ok(keys)
    }

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
    ) -> Result<Vec<(StorageKey, BatchValue)>, TransportError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let hex_keys: Vec<String> = keys.iter().map(StorageKey::to_hex).collect();
        let sets: Vec<StorageChangeSet> = self
            .call(RpcMethod::QueryStorageAt, serde_json::json!([hex_keys]))
            .await?;
        Ok(collect_changes(keys, sets))
    }
}

fn decode_storage_data(hex: &str) -> Result<Vec<u8>, TransportError> {
    decode_hex_data(hex).map_err(|e| TransportError::Malformed(format!("storage data: {}", e)))
}

/// Lines the change sets up with the requested keys. Keys the node left
/// out of every change set hold nothing. A value that is not valid hex
/// fails only its own key.
fn collect_changes(
    keys: &[StorageKey],
    sets: Vec<StorageChangeSet>,
) -> Vec<(StorageKey, BatchValue)> {
    let mut values: HashMap<String, Option<String>> = HashMap::new();
    for set in sets {
        for (key, value) in set.changes {
            values.insert(key.to_ascii_lowercase(), value);
        }
    }

    keys.iter()
        .map(|key| {
            let value = values
                .remove(&key.to_hex())
                .flatten()
                .map(|hex| decode_storage_data(&hex))
                .transpose();
            (key.clone(), value)
        })
        .collect()
}
