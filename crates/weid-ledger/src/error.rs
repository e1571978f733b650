/// Ledger gateway errors.
///
/// `Unavailable` is the only retryable kind: the transaction may or may
/// not have landed on-chain, so callers retrying must rely on the
/// idempotent contract semantics of each operation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("transaction rejected before inclusion: {0}")]
    InvalidTransaction(String),

    #[error("ledger internal error: {0}")]
    Internal(String),
}
