//! Core domain types shared across the matching pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An authoritative entity entry that queries are matched against.
///
/// Immutable once loaded into a snapshot; refreshes replace whole snapshots,
/// never individual records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Stable numeric id, derived from the store document id.
    pub id: u64,
    /// Original document id in the backing store.
    pub store_id: String,
    /// Name as stored, used for display and oracle prompts.
    pub display_name: String,
    /// [`crate::normalize::normalize`]d form of `display_name`.
    pub normalized_name: String,
    /// L2-normalized embedding of `normalized_name`, length = configured dim.
    pub embedding: Vec<f32>,
    /// Declared metadata features fed to the fusion model, by name.
    pub metadata: BTreeMap<String, f64>,
}

impl CanonicalRecord {
    /// Looks up a metadata feature, defaulting absent ones to 0.0.
    #[inline]
    pub fn feature(&self, name: &str) -> f64 {
        self.metadata.get(name).copied().unwrap_or(0.0)
    }
}

/// A scored candidate for one query. Derived per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub record_id: u64,
    /// Lexical similarity in `[0, 1]`.
    pub fuzzy_score: f64,
    /// Cosine similarity in `[-1, 1]`.
    pub embedding_score: f64,
    /// Fused confidence in `[0, 1]` from the ranking model.
    pub fused_score: f64,
}

/// How a query was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    /// Served from the result cache.
    Cache,
    /// Top fused score met the confidence threshold.
    Direct,
    /// Escalated to the disambiguation oracle.
    Fallback,
}

impl ResolvedVia {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedVia::Cache => "cache",
            ResolvedVia::Direct => "direct",
            ResolvedVia::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final outcome for one query, owned by the result cache once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// The normalized query this result answers.
    pub query: String,
    /// Candidates sorted by `fused_score` descending, ties by `record_id`
    /// ascending. Empty means no match.
    pub candidates: Vec<Candidate>,
    /// Confidence of the best candidate (0.0 when `candidates` is empty).
    pub confidence: f64,
    pub resolved_via: ResolvedVia,
    /// Set when the overall query budget expired before ranking finished.
    pub timed_out: bool,
    /// Unix timestamp (seconds) of when the result was finalized.
    pub timestamp: i64,
}

impl MatchResult {
    /// Builds a finalized result from ranked candidates.
    pub fn new(query: String, candidates: Vec<Candidate>, resolved_via: ResolvedVia) -> Self {
        let confidence = candidates.first().map(|c| c.fused_score).unwrap_or(0.0);
        Self {
            query,
            candidates,
            confidence,
            resolved_via,
            timed_out: false,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// A no-match result (legitimate terminal outcome, not an error).
    pub fn no_match(query: String, resolved_via: ResolvedVia) -> Self {
        Self::new(query, Vec::new(), resolved_via)
    }

    /// A no-match result produced by overall-budget expiry.
    pub fn timed_out(query: String) -> Self {
        Self {
            timed_out: true,
            ..Self::no_match(query, ResolvedVia::Direct)
        }
    }

    /// Re-labels a cached result when served from the cache.
    pub fn as_cache_hit(&self) -> Self {
        Self {
            resolved_via: ResolvedVia::Cache,
            ..self.clone()
        }
    }

    #[inline]
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        !self.candidates.is_empty()
    }
}
