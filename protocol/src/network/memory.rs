//! In-process node double.
//!
//! Holds storage in a `BTreeMap`, so key enumeration comes back in
//! lexicographic order like a real trie walk unless
//! [`MemoryTransport::set_reverse_listing`] turns it around. Every method
//! bumps a counter, which lets tests assert that a code path never reached
//! the transport.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::transport::{BatchValue, ChainTransport, TransportError};
use crate::storage::StorageKey;

/// Snapshot of how often each transport method was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub probe: usize,
    pub get_storage: usize,
    pub get_keys: usize,
    pub query_storage_at: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.probe + self.get_storage + self.get_keys + self.query_storage_at
    }

    /// Calls other than liveness probes.
    pub fn round_trips(&self) -> usize {
        self.get_storage + self.get_keys + self.query_storage_at
    }
}

#[derive(Default)]
struct Counters {
    probe: AtomicUsize,
    get_storage: AtomicUsize,
    get_keys: AtomicUsize,
    query_storage_at: AtomicUsize,
}

pub struct MemoryTransport {
    storage: RwLock<BTreeMap<StorageKey, Vec<u8>>>,
    alive: AtomicBool,
    reverse_listing: AtomicBool,
    failures: Mutex<VecDeque<TransportError>>,
    calls: Counters,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(BTreeMap::new()),
            alive: AtomicBool::new(true),
            reverse_listing: AtomicBool::new(false),
            failures: Mutex::new(VecDeque::new()),
            calls: Counters::default(),
        }
    }

    pub fn insert(&self, key: StorageKey, value: Vec<u8>) {
        self.storage.write().insert(key, value);
    }

    pub fn remove(&self, key: &StorageKey) -> Option<Vec<u8>> {
        self.storage.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    /// While offline every call fails with [`TransportError::Disconnected`].
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// Lists keys in descending order, for callers that must keep whatever
    /// order the node gives.
    pub fn set_reverse_listing(&self, reverse: bool) {
        self.reverse_listing.store(reverse, Ordering::SeqCst);
    }

    /// Queues an error returned by the next call, whichever method it is.
    pub fn fail_next(&self, error: TransportError) {
        self.failures.lock().push_back(error);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            probe: self.calls.probe.load(Ordering::SeqCst),
            get_storage: self.calls.get_storage.load(Ordering::SeqCst),
            get_keys: self.calls.get_keys.load(Ordering::SeqCst),
            query_storage_at: self.calls.query_storage_at.load(Ordering::SeqCst),
        }
    }

    fn enter(&self, counter: &AtomicUsize) -> Result<(), TransportError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected(
                "memory transport is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainTransport for MemoryTransport {
    async fn probe(&self) -> Result<(), TransportError> {
        self.enter(&self.calls.probe)
    }

    async fn get_storage(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, TransportError> {
        self.enter(&self.calls.get_storage)?;
        Ok(self.storage.read().get(key).cloned())
    }

    async fn get_keys(&self, prefix: &StorageKey) -> Result<Vec<StorageKey>, TransportError> {
        self.enter(&self.calls.get_keys)?;
        let storage = self.storage.read();
        let mut keys: Vec<StorageKey> = storage
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        if self.reverse_listing.load(Ordering::SeqCst) {
            keys.reverse();
        }
        Ok(keys)
    }

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
    ) -> Result<Vec<(StorageKey, BatchValue)>, TransportError> {
        self.enter(&self.calls.query_storage_at)?;
        let storage = self.storage.read();
        Ok(keys
            .iter()
            .map(|key| (key.clone(), Ok(storage.get(key).cloned())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(bytes: &[u8]) -> StorageKey {
        StorageKey::new(bytes.to_vec())
    }

    #[tokio::test]
    async fn get_keys_returns_only_prefixed_keys_in_order() {
        let transport = MemoryTransport::new();
        transport.insert(key(&[1, 3]), vec![]);
        transport.insert(key(&[1, 1]), vec![]);
        transport.insert(key(&[2, 0]), vec![]);
        transport.insert(key(&[0, 9]), vec![]);

        let keys = transport.get_keys(&key(&[1])).await.unwrap();
        assert_eq!(keys, vec![key(&[1, 1]), key(&[1, 3])]);

        transport.set_reverse_listing(true);
        let keys = transport.get_keys(&key(&[1])).await.unwrap();
        assert_eq!(keys, vec![key(&[1, 3]), key(&[1, 1])]);
    }

    #[tokio::test]
    async fn offline_transport_fails_and_counts() {
        let transport = MemoryTransport::new();
        transport.set_alive(false);
        let err = transport.get_storage(&key(&[1])).await.unwrap_err();
        assert!(err.is_connection_loss());
        assert_eq!(transport.calls().get_storage, 1);
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let transport = MemoryTransport::new();
        transport.insert(key(&[1]), vec![42]);
        transport.fail_next(TransportError::Malformed("garbage".into()));

        assert!(transport.get_storage(&key(&[1])).await.is_err());
        assert_eq!(
            transport.get_storage(&key(&[1])).await.unwrap(),
            Some(vec![42])
        );
        assert_eq!(transport.calls().total(), 2);
    }

    #[tokio::test]
    async fn batch_reports_missing_keys_as_none() {
        let transport = MemoryTransport::new();
        transport.insert(key(&[1]), vec![7]);
        let values = transport
            .query_storage_at(&[key(&[1]), key(&[2])])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![(key(&[1]), Ok(Some(vec![7]))), (key(&[2]), Ok(None))]
        );
    }
}
