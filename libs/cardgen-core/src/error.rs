//! Error types for cardgen-core.

use thiserror::Error;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised when a session operation is invoked in the wrong state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("proposal index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("a batch save is already in progress")]
    SaveInProgress,

    #[error("no saveable proposals")]
    NothingToSave,

    #[error("source text does not meet the length requirements")]
    InvalidSourceText,

    #[error("no generation is loaded")]
    NoGeneration,

    #[error("save item {0} is not in a retryable state")]
    NotRetryable(usize),
}
