use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("fusion model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to read fusion model: {reason}")]
    ReadFailed { reason: String },

    #[error("failed to parse fusion model: {reason}")]
    ParseFailed { reason: String },

    #[error("invalid fusion model: {reason}")]
    InvalidModel { reason: String },
}

impl From<std::io::Error> for FusionError {
    fn from(err: std::io::Error) -> Self {
        FusionError::ReadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FusionError {
    fn from(err: serde_json::Error) -> Self {
        FusionError::ParseFailed {
            reason: err.to_string(),
        }
    }
}
