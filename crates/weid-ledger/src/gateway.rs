use async_trait::async_trait;

use weid_core::WeId;

use crate::error::LedgerError;
use crate::types::{
    ContractCall, CreationEvent, Direction, DocumentRecord, EventCursor, Receipt, TransactionAuth,
};

/// Async seam to the distributed ledger.
///
/// Every registry read and write goes through this trait. Writes block
/// until the ledger reports inclusion or the gateway times out; a timeout
/// surfaces as [`LedgerError::Unavailable`] and leaves the transaction in
/// an at-least-once state — it may still land on-chain after the caller
/// gives up.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Sign and submit one contract transaction, returning its inclusion
    /// receipt. Reverted transactions still consume a block slot and
    /// return `Ok` with a reverted status.
    async fn submit(
        &self,
        call: ContractCall,
        auth: &TransactionAuth,
    ) -> Result<Receipt, LedgerError>;

    /// Raw contract state for one identifier, `None` if never anchored.
    async fn query_document(&self, weid: &WeId) -> Result<Option<DocumentRecord>, LedgerError>;

    /// Ordered slice of the creation-event log, starting at `from`
    /// (inclusive when an event exists at that exact position) and
    /// walking in `direction`, at most `limit` events.
    async fn creation_events(
        &self,
        from: EventCursor,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<CreationEvent>, LedgerError>;

    /// Total number of anchored identifiers, independent of revocations.
    async fn creation_count(&self) -> Result<u64, LedgerError>;

    /// Whether the hex-encoded public key is registered in the ledger's
    /// committee (delegate) set.
    async fn is_committee_member(&self, public_key_hex: &str) -> Result<bool, LedgerError>;

    /// Candidate identifiers that have ever listed the hex-encoded public
    /// key. Callers must re-verify liveness against the assembled
    /// document; the index does not track revocation.
    async fn weids_listing_key(&self, public_key_hex: &str) -> Result<Vec<WeId>, LedgerError>;
}
