use thiserror::Error;

/// Typed failures of the shift-swap workflow. Every operation returns one of
/// these synchronously; nothing is swallowed or retried internally.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not permitted: {0}")]
    Authorization(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The downstream shift reassignment failed after manager approval.
    /// The request remains in PENDING_MANAGER_APPROVAL and the decision
    /// may be retried.
    #[error("shift reassignment failed: {0}")]
    Effectuation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Store(String),
}

pub type SwapResult<T> = Result<T, SwapError>;
