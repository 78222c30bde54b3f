use thiserror::Error;

use crate::embedding::EncodingError;

#[derive(Debug, Error)]
pub enum MatchError {
    /// The query could not be encoded (caller error, surfaced as a
    /// rejected request; never retried).
    #[error("query rejected: {0}")]
    Encoding(#[from] EncodingError),

    /// A pipeline worker task died.
    #[error("match task failed: {reason}")]
    TaskFailed { reason: String },
}

impl From<tokio::task::JoinError> for MatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        MatchError::TaskFailed {
            reason: err.to_string(),
        }
    }
}
