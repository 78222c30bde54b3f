//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Confidence threshold τ must lie in (0, 1].
    #[error("invalid confidence threshold {value}: must be in (0, 1]")]
    InvalidThreshold { value: f64 },

    /// A sizing value that must be positive was zero.
    #[error("invalid value for {name}: must be greater than zero")]
    ZeroSize { name: &'static str },

    /// Fallback top-k cannot exceed the shortlist size.
    #[error("fallback top-k ({top_k}) exceeds shortlist size ({shortlist})")]
    FallbackExceedsShortlist { top_k: usize, shortlist: usize },

    /// Fallback policy string was not recognized.
    #[error("unknown fallback policy '{value}': expected 'best_available' or 'no_match'")]
    UnknownFallbackPolicy { value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
