use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use weid_core::WeId;
use weid_crypto::{KeyPair, PublicKey};

/// Signing authority for a ledger transaction.
///
/// Wraps the key pair whose private half signs the transaction; whether
/// that key is acting for itself or as a committee delegate is decided
/// one layer up, by the authorization resolver.
pub struct TransactionAuth {
    key_pair: KeyPair,
}

impl TransactionAuth {
    /// Create a transaction authority from a key pair.
    pub fn new(key_pair: KeyPair) -> Self {
        Self { key_pair }
    }

    /// The signing key pair.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Public half of the signing key.
    pub fn public_key(&self) -> PublicKey {
        self.key_pair.public_key()
    }

    /// Hex encoding of the public key, as stored in document records.
    pub fn public_key_hex(&self) -> String {
        self.key_pair.public_key().to_hex()
    }
}

/// The closed set of registry contract mutations.
///
/// Each variant is one ledger transaction; the contract applies it
/// atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContractCall {
    /// Anchor a new identifier with its creation key (assigned id 0).
    CreateWeId { weid: WeId, public_key: String },
    /// Append a key entry, or un-revoke an existing entry with identical
    /// key material. The receipt carries the resulting key id.
    AddPublicKey {
        weid: WeId,
        public_key: String,
        controller: WeId,
    },
    /// Revoke the matching key entry and every authentication that
    /// references it, as one transaction.
    RevokePublicKey { weid: WeId, public_key: String },
    /// Upsert a service endpoint by type.
    SetService {
        weid: WeId,
        service_type: String,
        endpoint: String,
    },
    /// Add or un-revoke an authentication bound to a live key entry.
    SetAuthentication { weid: WeId, public_key: String },
    /// Revoke an authentication; the backing key entry is untouched.
    RevokeAuthentication { weid: WeId, public_key: String },
}

impl ContractCall {
    /// The identifier this call mutates.
    pub fn weid(&self) -> &WeId {
        match self {
            Self::CreateWeId { weid, .. }
            | Self::AddPublicKey { weid, .. }
            | Self::RevokePublicKey { weid, .. }
            | Self::SetService { weid, .. }
            | Self::SetAuthentication { weid, .. }
            | Self::RevokeAuthentication { weid, .. } => weid,
        }
    }

    /// Canonical byte payload signed by the transaction authority.
    pub fn signing_payload(&self) -> Vec<u8> {
        let s = match self {
            Self::CreateWeId { weid, public_key } => {
                format!("createWeId|{}|{}", weid, public_key)
            }
            Self::AddPublicKey {
                weid,
                public_key,
                controller,
            } => format!("addPublicKey|{}|{}|{}", weid, public_key, controller),
            Self::RevokePublicKey { weid, public_key } => {
                format!("revokePublicKey|{}|{}", weid, public_key)
            }
            Self::SetService {
                weid,
                service_type,
                endpoint,
            } => format!("setService|{}|{}|{}", weid, service_type, endpoint),
            Self::SetAuthentication { weid, public_key } => {
                format!("setAuthentication|{}|{}", weid, public_key)
            }
            Self::RevokeAuthentication { weid, public_key } => {
                format!("revokeAuthentication|{}|{}", weid, public_key)
            }
        };
        s.into_bytes()
    }
}

/// Why the contract reverted a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertReason {
    AlreadyExists,
    IdentifierNotFound,
    KeyNotFound,
    KeyRevoked,
    AuthenticationNotFound,
    /// The transaction was ordered after a conflicting write; the caller
    /// must re-read current state before resubmitting.
    StaleState,
}

/// Transaction outcome as reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Confirmed,
    Reverted(RevertReason),
}

/// Inclusion receipt for a submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub index_in_block: u32,
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
    /// Key id assigned or touched by key operations, when applicable.
    pub key_id: Option<u32>,
}

impl Receipt {
    /// Whether the transaction was included and applied.
    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }
}

/// Raw key entry as stored by the registry contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key_id: u32,
    pub public_key: String,
    pub controller: String,
    pub revoked: bool,
}

/// Raw authentication entry as stored by the registry contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    pub public_key_id: u32,
    pub revoked: bool,
}

/// Raw service entry as stored by the registry contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub service_type: String,
    pub endpoint: String,
}

/// Full raw contract state for one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub weid: WeId,
    pub created_at_block: u64,
    pub updated_at_block: u64,
    pub keys: Vec<KeyRecord>,
    pub authentications: Vec<AuthRecord>,
    pub services: Vec<ServiceRecord>,
}

/// One entry of the append-only creation-event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationEvent {
    pub weid: WeId,
    pub block_number: u64,
    pub index_in_block: u32,
    pub timestamp: DateTime<Utc>,
}

impl CreationEvent {
    /// Position of this event in the log.
    pub fn position(&self) -> EventCursor {
        EventCursor {
            block_number: self.block_number,
            index_in_block: self.index_in_block,
        }
    }
}

/// Position within the creation-event log: block height plus in-block
/// index, totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventCursor {
    pub block_number: u64,
    pub index_in_block: u32,
}

/// Traversal direction over the creation-event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}
