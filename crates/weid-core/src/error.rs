/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid WeID format: {0}")]
    InvalidWeId(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
