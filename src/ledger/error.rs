use thiserror::Error;

/// Error taxonomy surfaced by the reaction service.
///
/// Validation, conflict, ownership and not-found conditions are detected
/// before (or instead of) any write and carry no side effects. Only
/// `Infrastructure` represents a retryable storage/provider failure.
#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not allowed")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl ReactionError {
    pub fn validation<S: Into<String>>(msg: S) -> ReactionError {
        ReactionError::Validation(msg.into())
    }

    pub fn conflict<S: Into<String>>(msg: S) -> ReactionError {
        ReactionError::Conflict(msg.into())
    }

    /// Stable machine-readable code, used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ReactionError::Validation(_) => "validation_error",
            ReactionError::Conflict(_) => "conflict",
            ReactionError::Unauthorized => "unauthorized",
            ReactionError::NotFound => "not_found",
            ReactionError::Infrastructure(_) => "infrastructure_error",
        }
    }
}
