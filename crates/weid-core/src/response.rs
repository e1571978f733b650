use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure taxonomy for every service operation.
///
/// Codes are stable integers carried in the response envelope; `Success`
/// is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    IdentifierNotFound,
    IdentifierAlreadyExists,
    Unauthorized,
    InvalidArgument,
    DanglingReference,
    LedgerTransactionFailed,
    LedgerUnavailable,
    InternalInconsistency,
}

impl ErrorCode {
    /// Stable integer code for the envelope.
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::IdentifierNotFound => 1001,
            Self::IdentifierAlreadyExists => 1002,
            Self::Unauthorized => 1003,
            Self::InvalidArgument => 1004,
            Self::DanglingReference => 1005,
            Self::LedgerTransactionFailed => 1006,
            Self::LedgerUnavailable => 1007,
            Self::InternalInconsistency => 1008,
        }
    }

    /// Whether a caller may retry the failed operation as-is.
    /// Only transport-level ledger failures are retryable; authorization
    /// and validation failures are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerUnavailable)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Response envelope returned by every service operation.
///
/// `error_code == 0` denotes success and `result` carries the payload;
/// on failure `result` is `None` and the code maps to [`ErrorCode`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData<T> {
    pub error_code: i32,
    pub error_message: String,
    pub result: Option<T>,
}

impl<T> ResponseData<T> {
    /// Successful response wrapping a payload.
    pub fn success(result: T) -> Self {
        Self {
            error_code: ErrorCode::Success.code(),
            error_message: "success".to_string(),
            result: Some(result),
        }
    }

    /// Failed response with an explicit code and message.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code: code.code(),
            error_message: message.into(),
            result: None,
        }
    }

    /// Whether the envelope carries a successful result.
    pub fn is_success(&self) -> bool {
        self.error_code == ErrorCode::Success.code()
    }
}
