//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `NAMESAKE_*` environment
//! variables. The matching core receives this struct explicitly; nothing
//! reads the environment past startup.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_EMBEDDING_DIM, DEFAULT_FALLBACK_TIMEOUT_SECS, DEFAULT_FALLBACK_TOP_K,
    DEFAULT_MAX_SEQ_LEN, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_REFRESH_INTERVAL_SECS,
    DEFAULT_SHORTLIST_SIZE,
};
use crate::oracle::FallbackPolicy;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `NAMESAKE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory holding the sentence-encoder model
    /// (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// Absent means the deterministic stub encoder.
    pub encoder_path: Option<PathBuf>,

    /// Path to the serialized fusion model (gradient-boosted trees, JSON).
    /// Absent means the hand-tuned weighted model.
    pub fusion_model_path: Option<PathBuf>,

    /// Embedding vector dimension. Default: `384`.
    pub embedding_dim: usize,

    /// Max token count per encoded text. Default: `256`.
    pub max_seq_len: usize,

    /// Confidence threshold τ for direct resolution. Default: `0.75`.
    pub confidence_threshold: f64,

    /// Cap on the merged retrieval shortlist. Default: `50`.
    pub shortlist_size: usize,

    /// Candidates offered to the disambiguation oracle. Default: `5`.
    pub fallback_top_k: usize,

    /// Max entries in the result cache. Default: `1_000`.
    pub cache_capacity: u64,

    /// Result cache TTL. Default: 10 minutes.
    pub cache_ttl: Duration,

    /// Budget for a single oracle call. Default: 5 seconds.
    pub fallback_timeout: Duration,

    /// Overall per-query budget, excluding the fallback leg. Default: 2 seconds.
    pub query_timeout: Duration,

    /// Base URL of the canonical-record document store.
    pub store_url: String,

    /// Collection name holding canonical records. Default: `entities`.
    pub store_collection: String,

    /// Interval between snapshot refreshes. Default: 5 minutes.
    pub refresh_interval: Duration,

    /// Model identifier passed to the oracle client. Default: `gpt-4o-mini`.
    pub oracle_model: String,

    /// Degrade behavior when the oracle fails or times out.
    pub fallback_policy: FallbackPolicy,

    /// Metadata feature names fed to the fusion model, in declaration order.
    pub metadata_features: Vec<String>,
}

/// Default store URL used when `NAMESAKE_STORE_URL` is not set.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8900";

/// Default collection holding canonical records.
pub const DEFAULT_STORE_COLLECTION: &str = "entities";

/// Default oracle model identifier.
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-4o-mini";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            encoder_path: None,
            fusion_model_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
            fallback_top_k: DEFAULT_FALLBACK_TOP_K,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            fallback_timeout: Duration::from_secs(DEFAULT_FALLBACK_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            store_url: DEFAULT_STORE_URL.to_string(),
            store_collection: DEFAULT_STORE_COLLECTION.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            oracle_model: DEFAULT_ORACLE_MODEL.to_string(),
            fallback_policy: FallbackPolicy::BestAvailable,
            metadata_features: Vec::new(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "NAMESAKE_PORT";
    const ENV_BIND_ADDR: &'static str = "NAMESAKE_BIND_ADDR";
    const ENV_ENCODER_PATH: &'static str = "NAMESAKE_ENCODER_PATH";
    const ENV_FUSION_MODEL_PATH: &'static str = "NAMESAKE_FUSION_MODEL_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "NAMESAKE_EMBEDDING_DIM";
    const ENV_MAX_SEQ_LEN: &'static str = "NAMESAKE_MAX_SEQ_LEN";
    const ENV_CONFIDENCE_THRESHOLD: &'static str = "NAMESAKE_CONFIDENCE_THRESHOLD";
    const ENV_SHORTLIST_SIZE: &'static str = "NAMESAKE_SHORTLIST_SIZE";
    const ENV_FALLBACK_TOP_K: &'static str = "NAMESAKE_FALLBACK_TOP_K";
    const ENV_CACHE_CAPACITY: &'static str = "NAMESAKE_CACHE_CAPACITY";
    const ENV_CACHE_TTL_SECS: &'static str = "NAMESAKE_CACHE_TTL_SECS";
    const ENV_FALLBACK_TIMEOUT_SECS: &'static str = "NAMESAKE_FALLBACK_TIMEOUT_SECS";
    const ENV_QUERY_TIMEOUT_SECS: &'static str = "NAMESAKE_QUERY_TIMEOUT_SECS";
    const ENV_STORE_URL: &'static str = "NAMESAKE_STORE_URL";
    const ENV_STORE_COLLECTION: &'static str = "NAMESAKE_STORE_COLLECTION";
    const ENV_REFRESH_INTERVAL_SECS: &'static str = "NAMESAKE_REFRESH_INTERVAL_SECS";
    const ENV_ORACLE_MODEL: &'static str = "NAMESAKE_ORACLE_MODEL";
    const ENV_FALLBACK_POLICY: &'static str = "NAMESAKE_FALLBACK_POLICY";
    const ENV_METADATA_FEATURES: &'static str = "NAMESAKE_METADATA_FEATURES";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let encoder_path = Self::parse_optional_path_from_env(Self::ENV_ENCODER_PATH);
        let fusion_model_path = Self::parse_optional_path_from_env(Self::ENV_FUSION_MODEL_PATH);
        let embedding_dim =
            Self::parse_usize_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim);
        let max_seq_len = Self::parse_usize_from_env(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len);
        let confidence_threshold = Self::parse_f64_from_env(
            Self::ENV_CONFIDENCE_THRESHOLD,
            defaults.confidence_threshold,
        );
        let shortlist_size =
            Self::parse_usize_from_env(Self::ENV_SHORTLIST_SIZE, defaults.shortlist_size);
        let fallback_top_k =
            Self::parse_usize_from_env(Self::ENV_FALLBACK_TOP_K, defaults.fallback_top_k);
        let cache_capacity =
            Self::parse_u64_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity);
        let cache_ttl = Self::parse_secs_from_env(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl);
        let fallback_timeout =
            Self::parse_secs_from_env(Self::ENV_FALLBACK_TIMEOUT_SECS, defaults.fallback_timeout);
        let query_timeout =
            Self::parse_secs_from_env(Self::ENV_QUERY_TIMEOUT_SECS, defaults.query_timeout);
        let store_url = Self::parse_string_from_env(Self::ENV_STORE_URL, defaults.store_url);
        let store_collection =
            Self::parse_string_from_env(Self::ENV_STORE_COLLECTION, defaults.store_collection);
        let refresh_interval =
            Self::parse_secs_from_env(Self::ENV_REFRESH_INTERVAL_SECS, defaults.refresh_interval);
        let oracle_model =
            Self::parse_string_from_env(Self::ENV_ORACLE_MODEL, defaults.oracle_model);
        let fallback_policy = Self::parse_fallback_policy_from_env(defaults.fallback_policy)?;
        let metadata_features = Self::parse_list_from_env(Self::ENV_METADATA_FEATURES);

        Ok(Self {
            port,
            bind_addr,
            encoder_path,
            fusion_model_path,
            embedding_dim,
            max_seq_len,
            confidence_threshold,
            shortlist_size,
            fallback_top_k,
            cache_capacity,
            cache_ttl,
            fallback_timeout,
            query_timeout,
            store_url,
            store_collection,
            refresh_interval,
            oracle_model,
            fallback_policy,
            metadata_features,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold {
                value: self.confidence_threshold,
            });
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::ZeroSize {
                name: "embedding_dim",
            });
        }
        if self.shortlist_size == 0 {
            return Err(ConfigError::ZeroSize {
                name: "shortlist_size",
            });
        }
        if self.fallback_top_k == 0 {
            return Err(ConfigError::ZeroSize {
                name: "fallback_top_k",
            });
        }
        if self.fallback_top_k > self.shortlist_size {
            return Err(ConfigError::FallbackExceedsShortlist {
                top_k: self.fallback_top_k,
                shortlist: self.shortlist_size,
            });
        }

        if let Some(ref path) = self.encoder_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.fusion_model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_fallback_policy_from_env(
        default: FallbackPolicy,
    ) -> Result<FallbackPolicy, ConfigError> {
        match env::var(Self::ENV_FALLBACK_POLICY) {
            Ok(value) => match value.as_str() {
                "best_available" => Ok(FallbackPolicy::BestAvailable),
                "no_match" => Ok(FallbackPolicy::NoMatch),
                _ => Err(ConfigError::UnknownFallbackPolicy { value }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_list_from_env(var_name: &str) -> Vec<String> {
        env::var(var_name)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_f64_from_env(var_name: &str, default: f64) -> f64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_secs_from_env(var_name: &str, default: Duration) -> Duration {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(default)
    }
}
