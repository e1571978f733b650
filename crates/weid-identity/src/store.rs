use std::collections::BTreeMap;

use weid_core::WeId;
use weid_crypto::PublicKey;
use weid_ledger::DocumentRecord;

use crate::document::{AuthenticationEntry, PublicKeyEntry, ServiceEntry, WeIdDocument};
use crate::error::IdentityError;

/// Translate the raw per-identifier contract state into a typed document.
///
/// This is the only place raw ledger records are interpreted. Structural
/// violations of the document invariants (non-increasing key ids,
/// regressed block stamps, malformed key material) surface as
/// `InternalInconsistency`; a dangling authentication reference does not —
/// it is inert and kept for the audit view.
pub fn assemble_document(record: &DocumentRecord) -> Result<WeIdDocument, IdentityError> {
    if record.updated_at_block < record.created_at_block {
        return Err(IdentityError::Inconsistency(format!(
            "document {} updated at block {} before creation block {}",
            record.weid, record.updated_at_block, record.created_at_block
        )));
    }

    let mut public_keys = Vec::with_capacity(record.keys.len());
    let mut last_id: Option<u32> = None;
    for key in &record.keys {
        if let Some(prev) = last_id {
            if key.key_id <= prev {
                return Err(IdentityError::Inconsistency(format!(
                    "document {} key ids not strictly increasing: {} after {}",
                    record.weid, key.key_id, prev
                )));
            }
        }
        last_id = Some(key.key_id);

        PublicKey::from_hex(&key.public_key).map_err(|e| {
            IdentityError::Inconsistency(format!(
                "document {} key {} holds malformed material: {}",
                record.weid, key.key_id, e
            ))
        })?;
        let controller = WeId::new(key.controller.clone()).map_err(|e| {
            IdentityError::Inconsistency(format!(
                "document {} key {} controller: {}",
                record.weid, key.key_id, e
            ))
        })?;

        public_keys.push(PublicKeyEntry {
            id: key.key_id,
            public_key: key.public_key.clone(),
            controller,
            revoked: key.revoked,
        });
    }

    let mut authentications = Vec::with_capacity(record.authentications.len());
    let mut seen_auth_ids = Vec::new();
    for auth in &record.authentications {
        if seen_auth_ids.contains(&auth.public_key_id) {
            return Err(IdentityError::Inconsistency(format!(
                "document {} has duplicate authentication for key {}",
                record.weid, auth.public_key_id
            )));
        }
        seen_auth_ids.push(auth.public_key_id);
        authentications.push(AuthenticationEntry {
            public_key_id: auth.public_key_id,
            revoked: auth.revoked,
        });
    }

    let mut services = BTreeMap::new();
    for service in &record.services {
        let previous = services.insert(
            service.service_type.clone(),
            ServiceEntry {
                service_type: service.service_type.clone(),
                endpoint: service.endpoint.clone(),
            },
        );
        if previous.is_some() {
            return Err(IdentityError::Inconsistency(format!(
                "document {} has duplicate service type {}",
                record.weid, service.service_type
            )));
        }
    }

    Ok(WeIdDocument {
        id: record.weid.clone(),
        public_keys,
        authentications,
        services,
        created_at_block: record.created_at_block,
        updated_at_block: record.updated_at_block,
    })
}
