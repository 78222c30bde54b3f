//! Cross-cutting, shared defaults.
//!
//! Every value here is a tunable default, not a hard invariant. The
//! authoritative runtime values flow through [`crate::config::Config`].

/// Output dimension of the default sentence-embedding model.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maximum token count accepted by the encoder; longer inputs are rejected.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Confidence threshold τ separating direct resolution from fallback.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Cap on the merged fuzzy ∪ embedding shortlist handed to the ranker.
pub const DEFAULT_SHORTLIST_SIZE: usize = 50;

/// Candidates forwarded to the disambiguation oracle when below τ.
pub const DEFAULT_FALLBACK_TOP_K: usize = 5;

/// Max entries in the result cache.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Result cache time-to-live.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Per-call budget for the disambiguation oracle.
pub const DEFAULT_FALLBACK_TIMEOUT_SECS: u64 = 5;

/// Overall query budget, excluding the fallback leg.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 2;

/// Interval between canonical-record snapshot refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Refresh retry backoff: initial delay, doubled per attempt up to the cap.
pub const REFRESH_BACKOFF_INITIAL_SECS: u64 = 1;
pub const REFRESH_BACKOFF_MAX_SECS: u64 = 60;

/// Hard floor below which a ranked result is reported as no-match.
pub const CONFIDENCE_FLOOR: f64 = 0.05;

/// Max tokens requested from the oracle for a disambiguation answer.
pub const DEFAULT_ORACLE_MAX_TOKENS: u32 = 32;
