use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote document store could not be reached or answered badly.
    /// Transient: callers keep serving the last good snapshot.
    #[error("document store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store answered, but the payload did not parse.
    #[error("malformed store response for collection '{collection}': {reason}")]
    MalformedResponse { collection: String, reason: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable {
            reason: err.to_string(),
        }
    }
}
