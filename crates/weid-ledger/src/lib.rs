//! WeID Ledger Gateway
//!
//! Boundary between the identifier engine and the distributed ledger:
//! - `LedgerGateway` — the async seam every engine component talks through
//! - `ContractCall` — the closed set of registry mutations
//! - `Receipt` / `TxStatus` — explicit confirmed/reverted transaction outcomes
//! - Raw per-identifier records and the append-only creation-event log
//! - `InMemoryLedger` — reference chain used by tests and local development

pub mod error;
pub mod gateway;
pub mod memory;
pub mod types;

pub use error::LedgerError;
pub use gateway::LedgerGateway;
pub use memory::InMemoryLedger;
pub use types::{
    AuthRecord, ContractCall, CreationEvent, Direction, DocumentRecord, EventCursor, KeyRecord,
    Receipt, RevertReason, ServiceRecord, TransactionAuth, TxStatus,
};
