//! Gateway and resolver behaviour against an in-memory node.
//!
//! Each test seeds its own `MemoryTransport` and inspects its call counters
//! to check which round trips actually happened.

use std::sync::Arc;

use cess_query::codec::{Shape, TypedValue};
use cess_query::identity::{AccountCodec, AccountId, PeerId, Ss58Codec};
use cess_query::network::{
    ChainGateway, ConnectionState, GatewayError, MemoryTransport, QueryOutcome, TransportError,
};
use cess_query::resolver::{Authorization, ChainResolver, ResolveError};
use cess_query::storage::items::{OSS_AUTHORITY_LIST, OSS_PEERS, SYSTEM_NUMBER};
use cess_query::storage::{KeyParam, StorageHasher, StorageKey};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn node() -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::new())
}

fn resolver(node: &Arc<MemoryTransport>) -> ChainResolver<Arc<MemoryTransport>> {
    ChainResolver::new(ChainGateway::new(Arc::clone(node)), Ss58Codec::cess())
}

/// A libp2p-style Ed25519 peer id whose key bytes are all `fill`.
fn peer(fill: u8) -> PeerId {
    let mut bytes = [fill; 38];
    bytes[..6].copy_from_slice(&[0x00, 0x24, 0x08, 0x01, 0x12, 0x20]);
    PeerId::new(bytes)
}

/// Registers `peer` for `account` in `Oss::Oss`, returning the storage key.
fn register_peer(node: &MemoryTransport, account: u8, peer: &PeerId) -> StorageKey {
    let key = OSS_PEERS.address(&[&[account; 32]]).key().clone();
    node.insert(key.clone(), peer.as_bytes().to_vec());
    key
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_key_is_absent_not_an_error() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));

    let outcome = gateway.query_single(&SYSTEM_NUMBER.prefix()).await;
    assert_eq!(outcome, QueryOutcome::Absent);
    assert_eq!(outcome.into_result(), Ok(None));
}

#[tokio::test]
async fn down_connection_never_reaches_the_transport() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));

    node.set_alive(false);
    assert!(!gateway.check_health().await);
    assert_eq!(gateway.connection_state(), ConnectionState::Down);
    let before = node.calls();

    assert_eq!(
        gateway.query_single(&SYSTEM_NUMBER.prefix()).await,
        QueryOutcome::ConnectionDown
    );
    assert_eq!(
        gateway
            .query_prefix(&OSS_PEERS.prefix(), &Shape::peer_id())
            .await,
        Err(GatewayError::ConnectionDown)
    );

    assert_eq!(node.calls(), before);
    assert_eq!(gateway.metrics().connection_down_total.get(), 2);
}

#[tokio::test]
async fn batch_skips_the_corrupted_member() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));

    for account in 1..=4u8 {
        register_peer(&node, account, &peer(account));
    }
    let corrupted = OSS_PEERS.address(&[&[5u8; 32]]).key().clone();
    node.insert(corrupted.clone(), vec![0xee; 37]);

    let batch = gateway
        .query_prefix(&OSS_PEERS.prefix(), &Shape::peer_id())
        .await
        .unwrap();

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.skipped, 1);
    assert!(batch.entries.iter().all(|entry| entry.key != corrupted));
    assert_eq!(gateway.metrics().skipped_entries_total.get(), 1);
}

#[tokio::test]
async fn batch_reads_in_one_round_trip() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));
    for account in 0..50u8 {
        register_peer(&node, account, &peer(account));
    }

    let batch = gateway
        .query_prefix(&OSS_PEERS.prefix(), &Shape::peer_id())
        .await
        .unwrap();

    assert_eq!(batch.len(), 50);
    let calls = node.calls();
    assert_eq!(calls.get_keys, 1);
    assert_eq!(calls.query_storage_at, 1);
    assert_eq!(calls.get_storage, 0);
}

#[tokio::test]
async fn prefix_enumeration_stays_within_its_item() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));
    register_peer(&node, 1, &peer(1));
    node.insert(
        OSS_AUTHORITY_LIST.address(&[&[1u8; 32]]).key().clone(),
        vec![2u8; 32],
    );

    let batch = gateway
        .query_prefix(&OSS_PEERS.prefix(), &Shape::peer_id())
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.skipped, 0);
}

#[tokio::test]
async fn transport_failure_mid_batch_is_reported() {
    let node = node();
    let gateway = ChainGateway::new(Arc::clone(&node));
    register_peer(&node, 1, &peer(1));
    assert!(gateway.check_health().await);

    node.fail_next(TransportError::Timeout(std::time::Duration::from_secs(6)));
    let err = gateway
        .query_prefix(&OSS_PEERS.prefix(), &Shape::peer_id())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(TransportError::Timeout(_))));
    assert_eq!(gateway.connection_state(), ConnectionState::Down);
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn peer_registry_lists_peers_in_transport_order() {
    let node = node();
    node.set_reverse_listing(true);
    let mut registered: Vec<(StorageKey, PeerId)> = [(7u8, 0x70u8), (3, 0x30), (9, 0x90)]
        .into_iter()
        .map(|(account, fill)| {
            let p = peer(fill);
            (register_peer(&node, account, &p), p)
        })
        .collect();
    registered.sort_by(|a, b| b.0.cmp(&a.0));
    let expected: Vec<String> = registered.iter().map(|(_, p)| p.to_base58()).collect();
    let mut sorted = expected.clone();
    sorted.reverse();

    let peers = resolver(&node).resolve_peer_registry().await.unwrap();

    assert_eq!(peers.len(), 3);
    assert_eq!(peers, expected);
    assert_ne!(peers, sorted);
    assert!(peers.iter().all(|p| p.starts_with("12D3KooW")));
}

#[tokio::test]
async fn peer_records_with_appended_fields_still_resolve() {
    let node = node();
    let mut expected = Vec::new();
    for account in 1..=3u8 {
        let p = peer(0x40 + account);
        let mut record = p.as_bytes().to_vec();
        record.extend_from_slice(&[0x0c, b'a', b'b', b'c']);
        node.insert(OSS_PEERS.address(&[&[account; 32]]).key().clone(), record);
        expected.push(p.to_base58());
    }
    expected.sort();

    let mut peers = resolver(&node).resolve_peer_registry().await.unwrap();
    peers.sort();

    assert_eq!(peers, expected);
}

#[tokio::test]
async fn absent_authorization_is_not_authorized() {
    let node = node();
    let resolver = resolver(&node);
    let local = resolver.codec().to_display(&AccountId::new([1; 32]));

    let answer = resolver
        .resolve_authorization(&[0xaa; 32], &local)
        .await
        .unwrap();

    assert_eq!(answer, Authorization::NotAuthorized);
    assert_eq!(node.calls().get_storage, 1);
}

#[tokio::test]
async fn matching_grantor_is_authorized() {
    let node = node();
    let resolver = resolver(&node);
    let peer_key = [0xaa; 32];
    let grantor = AccountId::new([1; 32]);
    node.insert(
        OSS_AUTHORITY_LIST.address(&[&peer_key]).key().clone(),
        grantor.as_bytes().to_vec(),
    );

    let local = resolver.codec().to_display(&grantor);
    let answer = resolver
        .resolve_authorization(&peer_key, &local)
        .await
        .unwrap();
    assert!(answer.is_authorized());

    let shown = resolver
        .query_authorized_account_display(&peer_key)
        .await
        .unwrap();
    assert_eq!(shown, Some(local));
}

#[tokio::test]
async fn authorization_errors_propagate() {
    let node = node();
    let resolver = resolver(&node);
    node.set_alive(false);

    let err = resolver
        .resolve_authorization(&[0xaa; 32], "cXanything")
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::ConnectionDown);
}

#[tokio::test]
async fn raw_query_decodes_and_reports_absence() {
    let node = node();
    let resolver = resolver(&node);
    let params = [KeyParam::new(StorageHasher::Blake2_128Concat, vec![1u8; 32])];
    let shape: Shape = "{nonce: u32, consumers: u32, providers: u32, sufficients: u32}"
        .parse()
        .unwrap();

    let missing = resolver
        .query_raw("System", "Account", &params, &shape)
        .await
        .unwrap();
    assert_eq!(missing, None);

    let key = cess_query::storage::StorageAddress::build("System", "Account", &params)
        .key()
        .clone();
    node.insert(key, [5u32, 1, 1, 0].iter().flat_map(|v| v.to_le_bytes()).collect());

    let value = resolver
        .query_raw("System", "Account", &params, &shape)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value.field("nonce"), Some(&TypedValue::UInt(5)));
    assert_eq!(value.field("sufficients"), Some(&TypedValue::UInt(0)));
}

#[tokio::test]
async fn raw_query_surfaces_decode_errors() {
    let node = node();
    let resolver = resolver(&node);
    node.insert(SYSTEM_NUMBER.prefix().key().clone(), vec![1, 2, 3]);

    let err = resolver
        .query_raw("System", "Number", &[], &Shape::u32())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Decode(_)));
}
