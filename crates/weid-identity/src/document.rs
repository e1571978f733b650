use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use weid_core::WeId;

use crate::error::IdentityError;

/// A public key listed in a WeID document.
///
/// Ids are assigned by the registry contract in strictly increasing order
/// per identifier (0 is the creation key) and survive revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyEntry {
    pub id: u32,
    /// Hex-encoded Ed25519 public key material.
    pub public_key: String,
    pub controller: WeId,
    pub revoked: bool,
}

/// An authentication reference to a public key entry in the same document.
///
/// A reference whose backing key was revoked later is inert: kept in the
/// full view, excluded from the effective view, never a read error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationEntry {
    pub public_key_id: u32,
    pub revoked: bool,
}

/// A service endpoint, unique per type within a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub service_type: String,
    pub endpoint: String,
}

/// The full (audit) view of a WeID document, materialized on demand from
/// ledger state. Revoked entries are retained here; consumers verifying
/// signatures must use [`WeIdDocument::effective`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeIdDocument {
    pub id: WeId,
    pub public_keys: Vec<PublicKeyEntry>,
    pub authentications: Vec<AuthenticationEntry>,
    pub services: BTreeMap<String, ServiceEntry>,
    pub created_at_block: u64,
    pub updated_at_block: u64,
}

/// The effective view: only live entries, suitable for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDocument {
    pub id: WeId,
    pub public_keys: Vec<PublicKeyEntry>,
    pub authentications: Vec<AuthenticationEntry>,
    pub services: BTreeMap<String, ServiceEntry>,
}

impl WeIdDocument {
    /// Find the key entry holding the given hex key material.
    pub fn find_key(&self, public_key_hex: &str) -> Option<&PublicKeyEntry> {
        self.public_keys
            .iter()
            .find(|k| k.public_key == public_key_hex)
    }

    /// Whether the document lists the key material as a non-revoked entry.
    pub fn has_live_key(&self, public_key_hex: &str) -> bool {
        self.find_key(public_key_hex).is_some_and(|k| !k.revoked)
    }

    /// Build the effective view: revoked keys drop out, and so does every
    /// authentication that is revoked or references a key that is revoked
    /// or absent.
    pub fn effective(&self) -> EffectiveDocument {
        let public_keys: Vec<PublicKeyEntry> = self
            .public_keys
            .iter()
            .filter(|k| !k.revoked)
            .cloned()
            .collect();
        let authentications = self
            .authentications
            .iter()
            .filter(|a| !a.revoked && public_keys.iter().any(|k| k.id == a.public_key_id))
            .cloned()
            .collect();
        EffectiveDocument {
            id: self.id.clone(),
            public_keys,
            authentications,
            services: self.services.clone(),
        }
    }

    /// Canonical JSON serialization of the full document: stable field
    /// order, services sorted by type, W3C DID context header.
    pub fn to_json(&self) -> Result<String, IdentityError> {
        let projection = DocumentJson {
            context: DID_CONTEXT,
            id: &self.id,
            public_key: &self.public_keys,
            authentication: &self.authentications,
            service: self.services.values().collect(),
            created: self.created_at_block,
            updated: self.updated_at_block,
        };
        serde_json::to_string(&projection)
            .map_err(|e| IdentityError::Inconsistency(format!("document serialization: {}", e)))
    }
}

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentJson<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    id: &'a WeId,
    public_key: &'a [PublicKeyEntry],
    authentication: &'a [AuthenticationEntry],
    service: Vec<&'a ServiceEntry>,
    created: u64,
    updated: u64,
}
