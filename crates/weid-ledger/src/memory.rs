use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use weid_core::WeId;
use weid_crypto::{sign, verify};

use crate::error::LedgerError;
use crate::gateway::LedgerGateway;
use crate::types::{
    AuthRecord, ContractCall, CreationEvent, Direction, DocumentRecord, EventCursor, KeyRecord,
    Receipt, RevertReason, ServiceRecord, TransactionAuth, TxStatus,
};

/// In-memory reference chain implementing [`LedgerGateway`].
///
/// Applies every transaction atomically under a single chain lock, so
/// ordering is total per contract exactly as a real ledger guarantees.
/// Transactions are grouped into blocks of `block_capacity` slots, letting
/// several creations share a block height with distinct in-block indices.
pub struct InMemoryLedger {
    chain: Mutex<ChainState>,
    documents: DashMap<WeId, DocumentRecord>,
    /// Hex public key -> identifiers that have ever listed it. Liveness
    /// is not tracked here; readers re-verify against document state.
    key_index: DashMap<String, Vec<WeId>>,
    /// Hex public keys holding committee (delegate) privilege.
    committee: DashMap<String, ()>,
    offline: AtomicBool,
    block_capacity: u32,
}

struct ChainState {
    next_block: u64,
    next_index: u32,
    creation_log: Vec<CreationEvent>,
}

impl InMemoryLedger {
    /// Create an empty chain with the default block capacity.
    pub fn new() -> Self {
        Self::with_block_capacity(10)
    }

    /// Create an empty chain grouping `block_capacity` transactions per
    /// block. Must be at least 1.
    pub fn with_block_capacity(block_capacity: u32) -> Self {
        Self {
            chain: Mutex::new(ChainState {
                next_block: 1,
                next_index: 0,
                creation_log: Vec::new(),
            }),
            documents: DashMap::new(),
            key_index: DashMap::new(),
            committee: DashMap::new(),
            offline: AtomicBool::new(false),
            block_capacity: block_capacity.max(1),
        }
    }

    /// Register a hex public key as a committee (delegate) member.
    pub fn add_committee_member(&self, public_key_hex: impl Into<String>) {
        self.committee.insert(public_key_hex.into(), ());
    }

    /// Simulate a transport outage: while offline every gateway call
    /// returns [`LedgerError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("gateway offline".into()));
        }
        Ok(())
    }

    fn allocate_slot(&self, state: &mut ChainState) -> (u64, u32) {
        let slot = (state.next_block, state.next_index);
        state.next_index += 1;
        if state.next_index >= self.block_capacity {
            state.next_block += 1;
            state.next_index = 0;
        }
        slot
    }

    fn index_key(&self, public_key: &str, weid: &WeId) {
        let mut entry = self.key_index.entry(public_key.to_string()).or_default();
        if !entry.contains(weid) {
            entry.push(weid.clone());
        }
    }

    /// Apply one call against contract state. Returns the status and the
    /// key id touched, if any. Creations also append to the creation log.
    fn apply(
        &self,
        state: &mut ChainState,
        call: &ContractCall,
        block_number: u64,
        index_in_block: u32,
    ) -> (TxStatus, Option<u32>) {
        match call {
            ContractCall::CreateWeId { weid, public_key } => {
                if self.documents.contains_key(weid) {
                    return (TxStatus::Reverted(RevertReason::AlreadyExists), None);
                }
                let record = DocumentRecord {
                    weid: weid.clone(),
                    created_at_block: block_number,
                    updated_at_block: block_number,
                    keys: vec![KeyRecord {
                        key_id: 0,
                        public_key: public_key.clone(),
                        controller: weid.uri().to_string(),
                        revoked: false,
                    }],
                    authentications: vec![AuthRecord {
                        public_key_id: 0,
                        revoked: false,
                    }],
                    services: Vec::new(),
                };
                self.documents.insert(weid.clone(), record);
                self.index_key(public_key, weid);
                state.creation_log.push(CreationEvent {
                    weid: weid.clone(),
                    block_number,
                    index_in_block,
                    timestamp: Utc::now(),
                });
                (TxStatus::Confirmed, Some(0))
            }

            ContractCall::AddPublicKey {
                weid,
                public_key,
                controller,
            } => {
                let Some(mut doc) = self.documents.get_mut(weid) else {
                    return (TxStatus::Reverted(RevertReason::IdentifierNotFound), None);
                };
                if let Some(existing) = doc.keys.iter_mut().find(|k| &k.public_key == public_key) {
                    // Same material present: un-revoke in place, id unchanged.
                    // A live duplicate is a no-op so retries converge.
                    existing.revoked = false;
                    let key_id = existing.key_id;
                    doc.updated_at_block = block_number;
                    return (TxStatus::Confirmed, Some(key_id));
                }
                let key_id = doc.keys.len() as u32;
                doc.keys.push(KeyRecord {
                    key_id,
                    public_key: public_key.clone(),
                    controller: controller.uri().to_string(),
                    revoked: false,
                });
                doc.updated_at_block = block_number;
                drop(doc);
                self.index_key(public_key, weid);
                (TxStatus::Confirmed, Some(key_id))
            }

            ContractCall::RevokePublicKey { weid, public_key } => {
                let Some(mut doc) = self.documents.get_mut(weid) else {
                    return (TxStatus::Reverted(RevertReason::IdentifierNotFound), None);
                };
                let Some(key_id) = doc
                    .keys
                    .iter()
                    .find(|k| &k.public_key == public_key)
                    .map(|k| k.key_id)
                else {
                    return (TxStatus::Reverted(RevertReason::KeyNotFound), None);
                };
                // Key and its authentications fall together, one transaction.
                for key in doc.keys.iter_mut().filter(|k| k.key_id == key_id) {
                    key.revoked = true;
                }
                for auth in doc
                    .authentications
                    .iter_mut()
                    .filter(|a| a.public_key_id == key_id)
                {
                    auth.revoked = true;
                }
                doc.updated_at_block = block_number;
                (TxStatus::Confirmed, Some(key_id))
            }

            ContractCall::SetService {
                weid,
                service_type,
                endpoint,
            } => {
                let Some(mut doc) = self.documents.get_mut(weid) else {
                    return (TxStatus::Reverted(RevertReason::IdentifierNotFound), None);
                };
                if let Some(existing) = doc
                    .services
                    .iter_mut()
                    .find(|s| &s.service_type == service_type)
                {
                    existing.endpoint = endpoint.clone();
                } else {
                    doc.services.push(ServiceRecord {
                        service_type: service_type.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
                doc.updated_at_block = block_number;
                (TxStatus::Confirmed, None)
            }

            ContractCall::SetAuthentication { weid, public_key } => {
                let Some(mut doc) = self.documents.get_mut(weid) else {
                    return (TxStatus::Reverted(RevertReason::IdentifierNotFound), None);
                };
                let Some(key) = doc.keys.iter().find(|k| &k.public_key == public_key) else {
                    return (TxStatus::Reverted(RevertReason::KeyNotFound), None);
                };
                if key.revoked {
                    return (TxStatus::Reverted(RevertReason::KeyRevoked), None);
                }
                let key_id = key.key_id;
                if let Some(auth) = doc
                    .authentications
                    .iter_mut()
                    .find(|a| a.public_key_id == key_id)
                {
                    auth.revoked = false;
                } else {
                    doc.authentications.push(AuthRecord {
                        public_key_id: key_id,
                        revoked: false,
                    });
                }
                doc.updated_at_block = block_number;
                (TxStatus::Confirmed, Some(key_id))
            }

            ContractCall::RevokeAuthentication { weid, public_key } => {
                let Some(mut doc) = self.documents.get_mut(weid) else {
                    return (TxStatus::Reverted(RevertReason::IdentifierNotFound), None);
                };
                let Some(key_id) = doc
                    .keys
                    .iter()
                    .find(|k| &k.public_key == public_key)
                    .map(|k| k.key_id)
                else {
                    return (TxStatus::Reverted(RevertReason::KeyNotFound), None);
                };
                let Some(auth) = doc
                    .authentications
                    .iter_mut()
                    .find(|a| a.public_key_id == key_id)
                else {
                    return (TxStatus::Reverted(RevertReason::AuthenticationNotFound), None);
                };
                auth.revoked = true;
                doc.updated_at_block = block_number;
                (TxStatus::Confirmed, Some(key_id))
            }
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn submit(
        &self,
        call: ContractCall,
        auth: &TransactionAuth,
    ) -> Result<Receipt, LedgerError> {
        self.check_online()?;

        // Sign with the caller's key and verify before inclusion, the
        // same handshake a remote node performs.
        let payload = call.signing_payload();
        let signature = sign(&payload, auth.key_pair());
        verify(&payload, &signature, &auth.public_key())
            .map_err(|e| LedgerError::InvalidTransaction(e.to_string()))?;

        let mut state = self
            .chain
            .lock()
            .map_err(|_| LedgerError::Internal("chain lock poisoned".into()))?;
        let (block_number, index_in_block) = self.allocate_slot(&mut state);
        let (status, key_id) = self.apply(&mut state, &call, block_number, index_in_block);
        drop(state);

        if let TxStatus::Reverted(reason) = status {
            tracing::warn!(weid = %call.weid(), ?reason, "transaction reverted");
        } else {
            tracing::debug!(weid = %call.weid(), block_number, index_in_block, "transaction confirmed");
        }

        Ok(Receipt {
            transaction_hash: format!("0x{}", Uuid::new_v4().simple()),
            block_number,
            index_in_block,
            timestamp: Utc::now(),
            status,
            key_id,
        })
    }

    async fn query_document(&self, weid: &WeId) -> Result<Option<DocumentRecord>, LedgerError> {
        self.check_online()?;
        Ok(self.documents.get(weid).map(|doc| doc.clone()))
    }

    async fn creation_events(
        &self,
        from: EventCursor,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<CreationEvent>, LedgerError> {
        self.check_online()?;
        let state = self
            .chain
            .lock()
            .map_err(|_| LedgerError::Internal("chain lock poisoned".into()))?;
        let log = &state.creation_log;
        let events = match direction {
            Direction::Forward => {
                let start = log.partition_point(|e| e.position() < from);
                log[start..].iter().take(limit).cloned().collect()
            }
            Direction::Backward => {
                let end = log.partition_point(|e| e.position() <= from);
                log[..end].iter().rev().take(limit).cloned().collect()
            }
        };
        Ok(events)
    }

    async fn creation_count(&self) -> Result<u64, LedgerError> {
        self.check_online()?;
        let state = self
            .chain
            .lock()
            .map_err(|_| LedgerError::Internal("chain lock poisoned".into()))?;
        Ok(state.creation_log.len() as u64)
    }

    async fn is_committee_member(&self, public_key_hex: &str) -> Result<bool, LedgerError> {
        self.check_online()?;
        Ok(self.committee.contains_key(public_key_hex))
    }

    async fn weids_listing_key(&self, public_key_hex: &str) -> Result<Vec<WeId>, LedgerError> {
        self.check_online()?;
        Ok(self
            .key_index
            .get(public_key_hex)
            .map(|weids| weids.clone())
            .unwrap_or_default())
    }
}
