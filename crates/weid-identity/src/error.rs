use weid_core::{ErrorCode, ResponseData};
use weid_ledger::LedgerError;

/// Identity-engine errors, mapping 1:1 onto the envelope taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("WeID not found: {0}")]
    NotFound(String),

    #[error("WeID already exists: {0}")]
    AlreadyExists(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dangling reference: {0}")]
    DanglingReference(String),

    #[error("ledger transaction failed: {0}")]
    TransactionFailed(String),

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("internal inconsistency: {0}")]
    Inconsistency(String),
}

impl IdentityError {
    /// Envelope code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::IdentifierNotFound,
            Self::AlreadyExists(_) => ErrorCode::IdentifierAlreadyExists,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::DanglingReference(_) => ErrorCode::DanglingReference,
            Self::TransactionFailed(_) => ErrorCode::LedgerTransactionFailed,
            Self::LedgerUnavailable(_) => ErrorCode::LedgerUnavailable,
            Self::Inconsistency(_) => ErrorCode::InternalInconsistency,
        }
    }
}

impl From<LedgerError> for IdentityError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Unavailable(msg) => Self::LedgerUnavailable(msg),
            LedgerError::InvalidTransaction(msg) | LedgerError::Internal(msg) => {
                Self::TransactionFailed(msg)
            }
        }
    }
}

impl From<weid_crypto::CryptoError> for IdentityError {
    fn from(e: weid_crypto::CryptoError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<weid_core::CoreError> for IdentityError {
    fn from(e: weid_core::CoreError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

/// Fold an engine result into the boundary envelope.
pub fn to_response<T>(result: Result<T, IdentityError>) -> ResponseData<T> {
    match result {
        Ok(value) => ResponseData::success(value),
        Err(e) => {
            tracing::debug!(error = %e, "operation failed");
            ResponseData::failure(e.code(), e.to_string())
        }
    }
}
