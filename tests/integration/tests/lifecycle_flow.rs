//! Integration test: Full identifier lifecycle across crates.
//!
//! Drives weid-identity against the in-memory ledger from weid-ledger:
//! creation, key rotation, authentication handling, service upserts, and
//! the full-vs-effective document views.

use std::sync::Arc;

use weid_core::{ErrorCode, SdkConfig};
use weid_crypto::KeyPair;
use weid_identity::{
    AuthenticationArgs, CreateWeIdData, PublicKeyArgs, ServiceArgs, WeIdService,
};
use weid_ledger::{InMemoryLedger, TransactionAuth};

/// Helper: a service over a fresh in-memory chain.
fn new_service() -> WeIdService<InMemoryLedger> {
    weid_integration_tests::init_tracing();
    WeIdService::new(Arc::new(InMemoryLedger::new()), SdkConfig::default())
}

/// Helper: anchor a fresh identifier and unwrap the envelope.
async fn create(service: &WeIdService<InMemoryLedger>) -> CreateWeIdData {
    let resp = service.create_weid().await;
    assert!(resp.is_success());
    resp.result.expect("creation should return data")
}

fn self_auth(created: &CreateWeIdData) -> TransactionAuth {
    TransactionAuth::new(created.key_pair.clone())
}

// =========================================================================
// Creation
// =========================================================================

#[tokio::test]
async fn test_two_creations_yield_distinct_identifiers() {
    let service = new_service();
    let a = create(&service).await;
    let b = create(&service).await;
    assert_ne!(a.weid, b.weid);

    assert_eq!(service.is_weid_exist(&a.weid).await.result, Some(true));
    assert_eq!(service.is_weid_exist(&b.weid).await.result, Some(true));
}

#[tokio::test]
async fn test_creation_key_gets_id_zero_and_authentication() {
    let service = new_service();
    let created = create(&service).await;

    let doc = service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();
    assert_eq!(doc.public_keys.len(), 1);
    assert_eq!(doc.public_keys[0].id, 0);
    assert_eq!(
        doc.public_keys[0].public_key,
        created.key_pair.public_key().to_hex()
    );
    assert_eq!(doc.public_keys[0].controller, created.weid);
    assert_eq!(doc.authentications.len(), 1);
    assert_eq!(doc.created_at_block, doc.updated_at_block);
}

// =========================================================================
// Key rotation and un-revoke-on-add
// =========================================================================

#[tokio::test]
async fn test_unrevoke_on_add_preserves_key_id() {
    let service = new_service();
    let created = create(&service).await;
    let rotated = KeyPair::generate();
    let args = PublicKeyArgs {
        public_key: rotated.public_key().to_hex(),
        controller: None,
    };

    let added = service
        .add_public_key(&created.weid, &args, self_auth(&created))
        .await;
    assert_eq!(added.result, Some(1));

    let revoked = service
        .revoke_public_key_with_authentication(&created.weid, &args, self_auth(&created))
        .await;
    assert_eq!(revoked.result, Some(true));

    // Adding identical material again un-revokes the entry in place.
    let readded = service
        .add_public_key(&created.weid, &args, self_auth(&created))
        .await;
    assert_eq!(readded.result, Some(1));

    let doc = service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();
    assert_eq!(doc.public_keys.len(), 2);
    let entry = doc.find_key(&rotated.public_key().to_hex()).unwrap();
    assert_eq!(entry.id, 1);
    assert!(!entry.revoked);
}

#[tokio::test]
async fn test_revoke_with_authentication_is_one_logical_operation() {
    let service = new_service();
    let created = create(&service).await;
    let rotated = KeyPair::generate();
    let args = PublicKeyArgs {
        public_key: rotated.public_key().to_hex(),
        controller: None,
    };
    service
        .add_public_key(&created.weid, &args, self_auth(&created))
        .await;
    service
        .set_authentication(
            &created.weid,
            &AuthenticationArgs {
                public_key: rotated.public_key().to_hex(),
            },
            self_auth(&created),
        )
        .await;

    // Applying the revocation twice leaves the same state as once.
    for _ in 0..2 {
        let resp = service
            .revoke_public_key_with_authentication(&created.weid, &args, self_auth(&created))
            .await;
        assert_eq!(resp.result, Some(true));

        let doc = service
            .get_weid_document(&created.weid)
            .await
            .result
            .unwrap();
        let key = doc.find_key(&rotated.public_key().to_hex()).unwrap();
        assert!(key.revoked);
        let auth = doc
            .authentications
            .iter()
            .find(|a| a.public_key_id == key.id)
            .unwrap();
        assert!(auth.revoked);
    }
}

// =========================================================================
// Authentication-only revocation and document views
// =========================================================================

#[tokio::test]
async fn test_revoke_authentication_leaves_key_live() {
    let service = new_service();
    let created = create(&service).await;
    let rotated = KeyPair::generate();
    service
        .add_public_key(
            &created.weid,
            &PublicKeyArgs {
                public_key: rotated.public_key().to_hex(),
                controller: None,
            },
            self_auth(&created),
        )
        .await;
    service
        .set_authentication(
            &created.weid,
            &AuthenticationArgs {
                public_key: rotated.public_key().to_hex(),
            },
            self_auth(&created),
        )
        .await;

    let resp = service
        .revoke_authentication(
            &created.weid,
            &AuthenticationArgs {
                public_key: rotated.public_key().to_hex(),
            },
            self_auth(&created),
        )
        .await;
    assert_eq!(resp.result, Some(true));

    let doc = service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();
    let key = doc.find_key(&rotated.public_key().to_hex()).unwrap();
    assert_eq!(key.id, 1);
    assert!(!key.revoked);

    // Full view keeps the revoked authentication for audit.
    let auth = doc
        .authentications
        .iter()
        .find(|a| a.public_key_id == 1)
        .unwrap();
    assert!(auth.revoked);

    // Effective view excludes it but keeps the live key.
    let effective = doc.effective();
    assert!(effective.public_keys.iter().any(|k| k.id == 1));
    assert!(effective
        .authentications
        .iter()
        .all(|a| a.public_key_id != 1));
}

#[tokio::test]
async fn test_set_authentication_requires_live_key() {
    let service = new_service();
    let created = create(&service).await;

    // Unknown key material: dangling reference.
    let resp = service
        .set_authentication(
            &created.weid,
            &AuthenticationArgs {
                public_key: KeyPair::generate().public_key().to_hex(),
            },
            self_auth(&created),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::DanglingReference.code());

    // Revoked key: rejected as invalid argument.
    let rotated = KeyPair::generate();
    let args = PublicKeyArgs {
        public_key: rotated.public_key().to_hex(),
        controller: None,
    };
    service
        .add_public_key(&created.weid, &args, self_auth(&created))
        .await;
    service
        .revoke_public_key_with_authentication(&created.weid, &args, self_auth(&created))
        .await;
    let resp = service
        .set_authentication(
            &created.weid,
            &AuthenticationArgs {
                public_key: rotated.public_key().to_hex(),
            },
            self_auth(&created),
        )
        .await;
    assert_eq!(resp.error_code, ErrorCode::InvalidArgument.code());
}

// =========================================================================
// Services and JSON form
// =========================================================================

#[tokio::test]
async fn test_service_upsert_and_canonical_json() {
    let service = new_service();
    let created = create(&service).await;

    for endpoint in ["https://old.example.com/weid", "https://new.example.com/weid"] {
        let resp = service
            .set_service(
                &created.weid,
                &ServiceArgs {
                    service_type: "drivingCardService".into(),
                    endpoint: endpoint.into(),
                },
                self_auth(&created),
            )
            .await;
        assert_eq!(resp.result, Some(true));
    }

    let doc = service
        .get_weid_document(&created.weid)
        .await
        .result
        .unwrap();
    assert_eq!(doc.services.len(), 1);
    assert_eq!(
        doc.services["drivingCardService"].endpoint,
        "https://new.example.com/weid"
    );

    let json = service
        .get_weid_document_json(&created.weid)
        .await
        .result
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["id"], created.weid.uri());
    assert_eq!(parsed["@context"], "https://www.w3.org/ns/did/v1");
    assert_eq!(
        parsed["service"][0]["endpoint"],
        "https://new.example.com/weid"
    );

    // Canonical: repeated serialization is byte-identical.
    let again = service
        .get_weid_document_json(&created.weid)
        .await
        .result
        .unwrap();
    assert_eq!(json, again);
}

#[tokio::test]
async fn test_reading_unknown_identifier_is_not_found() {
    let service = new_service();
    let ghost = weid_crypto::derive_weid("1", &KeyPair::generate().public_key());

    let resp = service.get_weid_document(&ghost).await;
    assert_eq!(resp.error_code, ErrorCode::IdentifierNotFound.code());
    assert_eq!(service.is_weid_exist(&ghost).await.result, Some(false));
}
