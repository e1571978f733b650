//! Integration test: registry enumeration over the creation-event log.
//!
//! Verifies the pagination completeness property — a chained forward
//! traversal equals the reverse of a chained backward traversal and both
//! match the registry count — plus reverse lookup and the retryable
//! outage path.

use std::sync::Arc;

use weid_core::{ErrorCode, SdkConfig, WeId};
use weid_crypto::KeyPair;
use weid_identity::{PublicKeyArgs, RegistryCursor, RegistryReader, WeIdService};
use weid_ledger::{InMemoryLedger, TransactionAuth};

struct Harness {
    ledger: Arc<InMemoryLedger>,
    service: WeIdService<InMemoryLedger>,
    reader: RegistryReader<InMemoryLedger>,
}

fn harness(block_capacity: u32) -> Harness {
    weid_integration_tests::init_tracing();
    let ledger = Arc::new(InMemoryLedger::with_block_capacity(block_capacity));
    Harness {
        service: WeIdService::new(Arc::clone(&ledger), SdkConfig::default()),
        reader: RegistryReader::new(Arc::clone(&ledger), SdkConfig::default()),
        ledger,
    }
}

async fn traverse(reader: &RegistryReader<InMemoryLedger>, start: RegistryCursor) -> Vec<WeId> {
    let mut collected = Vec::new();
    let mut cursor = Some(start);
    while let Some(current) = cursor {
        let page = reader.get_weid_list(current).await.result.unwrap();
        collected.extend(page.entries.into_iter().map(|e| e.weid));
        cursor = page.next_cursor;
    }
    collected
}

// =========================================================================
// Completeness and symmetry
// =========================================================================

#[tokio::test]
async fn test_full_traversals_agree_with_count() {
    let h = harness(3);
    let mut anchored = Vec::new();
    for _ in 0..10 {
        anchored.push(h.service.create_weid().await.result.unwrap().weid);
    }

    // Mutations between creations must not disturb the creation log.
    let extra = KeyPair::generate();
    let owner = h.service.create_weid().await.result.unwrap();
    anchored.push(owner.weid.clone());
    h.service
        .add_public_key(
            &owner.weid,
            &PublicKeyArgs {
                public_key: extra.public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(owner.key_pair.clone()),
        )
        .await;

    let forward = traverse(&h.reader, RegistryCursor::forward_start(4)).await;
    let mut backward = traverse(&h.reader, RegistryCursor::backward_start(4)).await;
    backward.reverse();

    assert_eq!(forward, anchored);
    assert_eq!(forward, backward);
    assert_eq!(
        h.reader.get_weid_count().await.result,
        Some(anchored.len() as u64)
    );
}

#[tokio::test]
async fn test_chained_pages_never_skip_or_duplicate() {
    let h = harness(2);
    for _ in 0..9 {
        h.service.create_weid().await.result.unwrap();
    }

    for page_size in [1usize, 2, 3, 5, 20] {
        let collected = traverse(&h.reader, RegistryCursor::forward_start(page_size)).await;
        assert_eq!(collected.len(), 9, "page size {}", page_size);
        let mut deduped = collected.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 9, "page size {}", page_size);
    }
}

#[tokio::test]
async fn test_terminal_page_signals_no_further_data() {
    let h = harness(2);
    for _ in 0..4 {
        h.service.create_weid().await.result.unwrap();
    }

    let first = h
        .reader
        .get_weid_list(RegistryCursor::forward_start(4))
        .await
        .result
        .unwrap();
    assert_eq!(first.entries.len(), 4);
    assert!(first.next_cursor.is_none());
}

// =========================================================================
// Reverse lookup
// =========================================================================

#[tokio::test]
async fn test_lookup_by_pubkey_list_matches_live_keys_only() {
    let h = harness(10);
    let alice = h.service.create_weid().await.result.unwrap();
    let bob = h.service.create_weid().await.result.unwrap();
    let unanchored = KeyPair::generate();

    let keys = vec![
        alice.key_pair.public_key().to_hex(),
        bob.key_pair.public_key().to_hex(),
        unanchored.public_key().to_hex(),
    ];
    let matched = h
        .reader
        .get_weid_list_by_pubkey_list(&keys)
        .await
        .result
        .unwrap();
    assert_eq!(matched, vec![alice.weid.clone(), bob.weid.clone()]);

    // Revoking bob's creation key removes him from the result set.
    h.service
        .revoke_public_key_with_authentication(
            &bob.weid,
            &PublicKeyArgs {
                public_key: bob.key_pair.public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(bob.key_pair.clone()),
        )
        .await;
    let matched = h
        .reader
        .get_weid_list_by_pubkey_list(&keys)
        .await
        .result
        .unwrap();
    assert_eq!(matched, vec![alice.weid]);
}

// =========================================================================
// Outage handling
// =========================================================================

#[tokio::test]
async fn test_outage_is_retryable_and_converges() {
    let h = harness(10);
    let created = h.service.create_weid().await.result.unwrap();

    h.ledger.set_offline(true);
    let resp = h
        .reader
        .get_weid_list(RegistryCursor::forward_start(5))
        .await;
    assert_eq!(resp.error_code, ErrorCode::LedgerUnavailable.code());

    let resp = h
        .service
        .add_public_key(
            &created.weid,
            &PublicKeyArgs {
                public_key: KeyPair::generate().public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(created.key_pair.clone()),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::LedgerUnavailable.code());

    // The envelope marks exactly this failure as retryable; retrying
    // after the outage succeeds.
    h.ledger.set_offline(false);
    let page = h
        .reader
        .get_weid_list(RegistryCursor::forward_start(5))
        .await
        .result
        .unwrap();
    assert_eq!(page.entries.len(), 1);
}
