use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle call exceeded its budget.
    #[error("oracle call timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// The underlying provider returned an error.
    #[error("oracle provider error: {reason}")]
    Provider { reason: String },

    /// The provider answered with no usable text.
    #[error("oracle returned an empty response")]
    EmptyResponse,
}
