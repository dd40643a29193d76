//! # Derived-Fact Resolver
//!
//! Answers questions that take more than one storage read, or a read plus
//! some interpretation, on top of a [`ChainGateway`].
//!
//! ```text
//! resolve_authorization(peer_key, local):
//!
//!   peer_key ──encode as AccountId──► Oss::AuthorityList[peer_key]
//!                                          │
//!                      absent ◄────────────┼────────────► AccountId
//!                        │                                   │
//!                  NotAuthorized                    codec.to_display()
//!                                                            │
//!                                              == local ? Authorized : NotAuthorized
//! ```
//!
//! Absence is an answer, not an error. Transport and decode failures are
//! errors and propagate.
//!
//! Registry values are read for their leading field only. Bytes after the
//! peer id or account id are ignored, so records that gained fields on a
//! runtime upgrade keep resolving.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{
    decode, decode_with, encode, DecodeError, DecodeMode, EncodeError, Shape, TypedValue,
};
use crate::identity::{AccountCodec, AccountId, PeerId, Ss58Codec};
use crate::network::{ChainGateway, ChainTransport, GatewayError, TransportError};
use crate::storage::items::{OSS_AUTHORITY_LIST, OSS_PEERS};
use crate::storage::{KeyParam, StorageAddress, StorageItem};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("connection to the chain node is down")]
    ConnectionDown,

    #[error("transport failure: {0}")]
    Transport(TransportError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Peer keys are account public keys and must be 32 bytes.
    #[error("invalid peer key: expected 32 bytes, got {len}")]
    InvalidPeerKey { len: usize },

    #[error("cannot encode key parameter: {0}")]
    Encode(#[from] EncodeError),
}

impl From<GatewayError> for ResolveError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::ConnectionDown => ResolveError::ConnectionDown,
            GatewayError::Transport(e) => ResolveError::Transport(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived facts
// ---------------------------------------------------------------------------

/// Who authorized a peer, as read from chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRecord {
    #[serde(serialize_with = "serialize_hex")]
    pub subject_peer_key: Vec<u8>,
    pub grantor: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Authorization {
    Authorized(AuthorizationRecord),
    NotAuthorized,
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

/// Storage items the resolver reads. Replace them when chain metadata
/// declares different hashers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverItems {
    /// Account → gateway peer identifier.
    pub peers: StorageItem,
    /// Gateway account → account that authorized it.
    pub authority_list: StorageItem,
}

impl Default for ResolverItems {
    fn default() -> Self {
        Self {
            peers: OSS_PEERS,
            authority_list: OSS_AUTHORITY_LIST,
        }
    }
}

// ---------------------------------------------------------------------------
// ChainResolver
// ---------------------------------------------------------------------------

pub struct ChainResolver<T, C = Ss58Codec> {
    gateway: ChainGateway<T>,
    codec: C,
    items: ResolverItems,
}

impl<T: ChainTransport, C: AccountCodec> ChainResolver<T, C> {
    pub fn new(gateway: ChainGateway<T>, codec: C) -> Self {
        Self {
            gateway,
            codec,
            items: ResolverItems::default(),
        }
    }

    pub fn with_items(mut self, items: ResolverItems) -> Self {
        self.items = items;
        self
    }

    pub fn gateway(&self) -> &ChainGateway<T> {
        &self.gateway
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn items(&self) -> &ResolverItems {
        &self.items
    }

    pub async fn check_health(&self) -> bool {
        self.gateway.check_health().await
    }

    /// Every registered gateway peer, base58-encoded, in the order the node
    /// enumerated them. Malformed registry entries are left out.
    pub async fn resolve_peer_registry(&self) -> Result<Vec<String>, ResolveError> {
        let batch = self
            .gateway
            .query_prefix_with(
                &self.items.peers.prefix(),
                &Shape::peer_id(),
                DecodeMode::Leading,
            )
            .await?;
        if batch.skipped > 0 {
            warn!(skipped = batch.skipped, "peer registry has unreadable entries");
        }

        let peers: Vec<String> = batch
            .entries
            .iter()
            .filter_map(|entry| entry.value.as_bytes())
            .filter_map(|bytes| PeerId::try_from(bytes).ok())
            .map(|peer| peer.to_base58())
            .collect();
        debug!(count = peers.len(), "resolved peer registry");
        Ok(peers)
    }

    /// Peer identifier registered by `account`, if any.
    pub async fn query_peer_id(&self, account: &AccountId) -> Result<Option<PeerId>, ResolveError> {
        let address = self.items.peers.address(&[account.as_bytes()]);
        let Some(bytes) = self.gateway.query_single(&address).await.into_result()? else {
            return Ok(None);
        };
        let value = decode_with(&bytes, &Shape::peer_id(), DecodeMode::Leading)?;
        Ok(value.as_bytes().and_then(|b| PeerId::try_from(b).ok()))
    }

    /// Account that authorized the peer with public key `peer_key`.
    pub async fn query_authorized_account(
        &self,
        peer_key: &[u8],
    ) -> Result<Option<AccountId>, ResolveError> {
        let param = encode_peer_key(peer_key)?;
        let address = self.items.authority_list.address(&[&param]);
        let Some(bytes) = self.gateway.query_single(&address).await.into_result()? else {
            debug!(peer = %hex::encode(peer_key), "no authorization record");
            return Ok(None);
        };
        let value = decode_with(&bytes, &Shape::account_id(), DecodeMode::Leading)?;
        Ok(value.as_bytes().and_then(|b| AccountId::try_from(b).ok()))
    }

    /// [`query_authorized_account`](Self::query_authorized_account), rendered
    /// with the account codec.
    pub async fn query_authorized_account_display(
        &self,
        peer_key: &[u8],
    ) -> Result<Option<String>, ResolveError> {
        Ok(self
            .query_authorized_account(peer_key)
            .await?
            .map(|account| self.codec.to_display(&account)))
    }

    /// Whether the account shown as `local_display` is the one that
    /// authorized `peer_key`.
    pub async fn resolve_authorization(
        &self,
        peer_key: &[u8],
        local_display: &str,
    ) -> Result<Authorization, ResolveError> {
        let grantor = self.query_authorized_account(peer_key).await?;
        Ok(self.judge_authorization(peer_key, grantor, local_display))
    }

    /// Decides authorization from a grantor already read from chain.
    pub fn judge_authorization(
        &self,
        peer_key: &[u8],
        grantor: Option<AccountId>,
        local_display: &str,
    ) -> Authorization {
        let Some(grantor) = grantor else {
            return Authorization::NotAuthorized;
        };
        if self.codec.to_display(&grantor) != local_display {
            debug!(peer = %hex::encode(peer_key), "authorized by another account");
            return Authorization::NotAuthorized;
        }
        Authorization::Authorized(AuthorizationRecord {
            subject_peer_key: peer_key.to_vec(),
            grantor,
        })
    }

    /// Reads and decodes an arbitrary storage item.
    ///
    /// # Panics
    ///
    /// If `module` or `item` is empty or not ASCII.
    pub async fn query_raw(
        &self,
        module: &str,
        item: &str,
        params: &[KeyParam],
        shape: &Shape,
    ) -> Result<Option<TypedValue>, ResolveError> {
        let address = StorageAddress::build(module, item, params);
        match self.gateway.query_single(&address).await.into_result()? {
            Some(bytes) => Ok(Some(decode(&bytes, shape)?)),
            None => Ok(None),
        }
    }
}

/// Canonical encoding of a peer public key as an account id.
fn encode_peer_key(peer_key: &[u8]) -> Result<Vec<u8>, ResolveError> {
    AccountId::try_from(peer_key).map_err(|_| ResolveError::InvalidPeerKey {
        len: peer_key.len(),
    })?;
    Ok(encode(
        &TypedValue::Bytes(peer_key.to_vec()),
        &Shape::account_id(),
    )?)
}
