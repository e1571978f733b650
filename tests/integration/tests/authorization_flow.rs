//! Integration test: self-vs-delegate authorization across crates.
//!
//! Exercises the authorization resolver through the public service
//! surface: stranger writes, committee delegation, and rotated-key
//! signing.

use std::sync::Arc;

use weid_core::{ErrorCode, SdkConfig};
use weid_crypto::KeyPair;
use weid_identity::{PublicKeyArgs, ServiceArgs, WeIdService};
use weid_ledger::{InMemoryLedger, TransactionAuth};

struct Harness {
    ledger: Arc<InMemoryLedger>,
    service: WeIdService<InMemoryLedger>,
}

fn harness() -> Harness {
    weid_integration_tests::init_tracing();
    let ledger = Arc::new(InMemoryLedger::new());
    let service = WeIdService::new(Arc::clone(&ledger), SdkConfig::default());
    Harness { ledger, service }
}

// =========================================================================
// Self path
// =========================================================================

#[tokio::test]
async fn test_stranger_write_is_denied_without_state_change() {
    let h = harness();
    let created = h.service.create_weid().await.result.unwrap();
    let before = h
        .service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();

    let resp = h
        .service
        .add_public_key(
            &created.weid,
            &PublicKeyArgs {
                public_key: KeyPair::generate().public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(KeyPair::generate()),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::Unauthorized.code());

    let after = h
        .service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_rotated_key_can_sign_for_the_subject() {
    let h = harness();
    let created = h.service.create_weid().await.result.unwrap();
    let rotated = KeyPair::generate();

    h.service
        .add_public_key(
            &created.weid,
            &PublicKeyArgs {
                public_key: rotated.public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(created.key_pair.clone()),
        )
        .await;

    // The rotated key is now a listed live entry and may mutate.
    let resp = h
        .service
        .set_service(
            &created.weid,
            &ServiceArgs {
                service_type: "messagingService".into(),
                endpoint: "https://msg.example.com".into(),
            },
            TransactionAuth::new(rotated.clone()),
        )
        .await;
    assert_eq!(resp.result, Some(true));

    // Once revoked it loses that right.
    h.service
        .revoke_public_key_with_authentication(
            &created.weid,
            &PublicKeyArgs {
                public_key: rotated.public_key().to_hex(),
                controller: None,
            },
            TransactionAuth::new(created.key_pair.clone()),
        )
        .await;
    let resp = h
        .service
        .set_service(
            &created.weid,
            &ServiceArgs {
                service_type: "messagingService".into(),
                endpoint: "https://msg2.example.com".into(),
            },
            TransactionAuth::new(rotated),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::Unauthorized.code());
}

// =========================================================================
// Delegate path
// =========================================================================

#[tokio::test]
async fn test_delegate_creation_requires_committee() {
    let h = harness();
    let subject_key = KeyPair::generate();
    let admin = KeyPair::generate();

    let denied = h
        .service
        .delegate_create_weid(
            &subject_key.public_key().to_hex(),
            TransactionAuth::new(admin.clone()),
        )
        .await;
    assert_eq!(denied.error_code, ErrorCode::Unauthorized.code());

    h.ledger.add_committee_member(admin.public_key().to_hex());
    let granted = h
        .service
        .delegate_create_weid(
            &subject_key.public_key().to_hex(),
            TransactionAuth::new(admin),
        )
        .await;
    let weid = granted.result.unwrap();
    assert_eq!(weid, weid_crypto::derive_weid("1", &subject_key.public_key()));
    assert_eq!(h.service.is_weid_exist(&weid).await.result, Some(true));
}

#[tokio::test]
async fn test_delegate_mutations_do_not_require_subject_relation() {
    let h = harness();
    let created = h.service.create_weid().await.result.unwrap();
    let admin = KeyPair::generate();
    h.ledger.add_committee_member(admin.public_key().to_hex());

    let resp = h
        .service
        .delegate_set_service(
            &created.weid,
            &ServiceArgs {
                service_type: "recoveryService".into(),
                endpoint: "https://recovery.example.com".into(),
            },
            TransactionAuth::new(admin.clone()),
        )
        .await;
    assert_eq!(resp.result, Some(true));

    let resp = h
        .service
        .delegate_set_authentication(
            &created.weid,
            &weid_identity::AuthenticationArgs {
                public_key: created.key_pair.public_key().to_hex(),
            },
            TransactionAuth::new(admin),
        )
        .await;
    assert_eq!(resp.result, Some(true));
}

#[tokio::test]
async fn test_committee_membership_is_not_implicit_self_privilege() {
    let h = harness();
    let created = h.service.create_weid().await.result.unwrap();
    let admin = KeyPair::generate();
    h.ledger.add_committee_member(admin.public_key().to_hex());

    // The admin key is not listed on the subject document, so the
    // self-signed path must still deny it.
    let resp = h
        .service
        .set_service(
            &created.weid,
            &ServiceArgs {
                service_type: "recoveryService".into(),
                endpoint: "https://recovery.example.com".into(),
            },
            TransactionAuth::new(admin),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::Unauthorized.code());
}
