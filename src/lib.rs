//! Namesake library crate (used by the server binary and integration tests).
//!
//! Resolves free-text queries against a canonical record set by fusing
//! lexical (fuzzy) similarity and dense embedding similarity through a
//! learned re-ranking model, with an LLM oracle fallback for low-confidence
//! cases.
//!
//! # Public API Surface
//!
//! ## Core Types (Stable)
//! - [`Config`], [`ConfigError`] - Service configuration
//! - [`CanonicalRecord`], [`Candidate`], [`MatchResult`], [`ResolvedVia`] - Domain model
//! - [`MatchEngine`], [`EngineOptions`] - The resolve pipeline
//!
//! ## Matching & Scoring
//! - [`normalize`] - Text canonicalization
//! - [`fuzzy_score`] - Token-aware lexical similarity
//! - [`TextEncoder`], [`EncoderConfig`] - Sentence embeddings
//! - [`CandidateIndex`], [`IndexSnapshot`], [`Shortlisted`] - Retrieval
//! - [`Ranker`], [`FusionModel`], [`GradientBoostedModel`], [`WeightedFusionModel`] - Fusion
//!
//! ## Caching & Refresh
//! - [`ResultCache`], [`CacheStats`] - Bounded LRU+TTL result cache
//! - [`StoreGateway`], [`RefreshManager`], [`DocumentStore`] - Snapshot loading
//!
//! ## Fallback
//! - [`Disambiguator`], [`CompletionOracle`], [`FallbackPolicy`] - Oracle escalation
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod fuzzy;
pub mod gateway;
pub mod hashing;
pub mod index;
pub mod normalize;
pub mod oracle;
pub mod ranking;
pub mod record;
pub mod store;

pub use cache::{CacheStats, ResultCache};
pub use config::{Config, ConfigError};
pub use embedding::{EncoderConfig, EncodingError, TextEncoder, cosine_similarity};
pub use engine::{EngineOptions, MatchEngine, MatchError};
pub use fuzzy::fuzzy_score;
pub use hashing::{hash_query, hash_record_content, hash_record_id, hash_to_u64};
pub use index::{CandidateIndex, IndexSnapshot, Shortlisted};
pub use normalize::normalize;
pub use oracle::{
    CompletionOracle, DisambiguationOutcome, Disambiguator, FallbackPolicy, GenaiOracle,
    OracleCandidate, OracleError,
};
#[cfg(any(test, feature = "mock"))]
pub use oracle::MockOracle;
pub use ranking::{
    FusionError, FusionModel, GradientBoostedModel, RankVerdict, Ranker, WeightedFusionModel,
};
pub use record::{CanonicalRecord, Candidate, MatchResult, ResolvedVia};
#[cfg(any(test, feature = "mock"))]
pub use store::MockDocumentStore;
pub use store::{
    Document, DocumentStore, RefreshManager, RestDocumentStore, StoreError, StoreGateway,
};
