//! The match pipeline.
//!
//! One [`MatchEngine::resolve`] call runs: normalize → result-cache probe →
//! fuzzy scan and embedding encode in parallel → shortlist retrieval →
//! fusion ranking → (below τ) oracle disambiguation → cache write. Every
//! score for one query comes from a single index snapshot.

mod error;

#[cfg(test)]
mod tests;

pub use error::MatchError;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cache::{CacheStats, ResultCache};
use crate::config::Config;
use crate::constants::CONFIDENCE_FLOOR;
use crate::embedding::TextEncoder;
use crate::index::{CandidateIndex, IndexSnapshot};
use crate::normalize::normalize;
use crate::oracle::{DisambiguationOutcome, Disambiguator, FallbackPolicy, OracleCandidate};
use crate::ranking::{RankVerdict, Ranker};
use crate::record::{Candidate, MatchResult, ResolvedVia};

/// Pipeline knobs lifted out of [`Config`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub shortlist_size: usize,
    pub fallback_top_k: usize,
    pub query_timeout: Duration,
    pub fallback_policy: FallbackPolicy,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            shortlist_size: config.shortlist_size,
            fallback_top_k: config.fallback_top_k,
            query_timeout: config.query_timeout,
            fallback_policy: config.fallback_policy,
        }
    }
}

/// Resolves free-text queries against the current canonical snapshot.
///
/// All model state (encoder, fusion model) is constructed once at startup
/// and passed in by reference; the engine itself holds no hidden globals.
pub struct MatchEngine {
    encoder: Arc<TextEncoder>,
    index: Arc<CandidateIndex>,
    ranker: Arc<Ranker>,
    cache: Arc<ResultCache>,
    disambiguator: Disambiguator,
    options: EngineOptions,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("ranker", &self.ranker)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    pub fn new(
        encoder: Arc<TextEncoder>,
        index: Arc<CandidateIndex>,
        ranker: Arc<Ranker>,
        cache: Arc<ResultCache>,
        disambiguator: Disambiguator,
        options: EngineOptions,
    ) -> Self {
        Self {
            encoder,
            index,
            ranker,
            cache,
            disambiguator,
            options,
        }
    }

    /// Resolves one query to a [`MatchResult`].
    ///
    /// Infra failures degrade the result; only malformed input surfaces as
    /// an error. The pre-fallback pipeline runs under `query_timeout`; the
    /// fallback leg carries its own oracle timeout.
    #[instrument(skip(self, raw_text), fields(request_id = %Uuid::new_v4(), query_len = raw_text.len()))]
    pub async fn resolve(&self, raw_text: &str) -> Result<MatchResult, MatchError> {
        let normalized = normalize(raw_text);
        if normalized.is_empty() {
            debug!("Query normalizes to empty, returning no-match");
            return Ok(MatchResult::no_match(normalized, ResolvedVia::Direct));
        }

        if let Some(cached) = self.cache.get(&normalized) {
            info!("Result cache hit");
            return Ok(cached.as_cache_hit());
        }

        let snapshot = self.index.snapshot();
        debug!(
            generation = snapshot.generation(),
            records = snapshot.len(),
            "Resolving against snapshot"
        );

        let ranked = match tokio::time::timeout(
            self.options.query_timeout,
            self.rank_against(&snapshot, &normalized),
        )
        .await
        {
            Ok(ranked) => ranked?,
            Err(_) => {
                warn!(budget = ?self.options.query_timeout, "Query budget exceeded");
                return Ok(MatchResult::timed_out(normalized));
            }
        };

        let result = match self.ranker.verdict(&ranked) {
            RankVerdict::AboveThreshold { .. } => {
                MatchResult::new(normalized.clone(), ranked, ResolvedVia::Direct)
            }
            RankVerdict::NoCandidates => {
                MatchResult::no_match(normalized.clone(), ResolvedVia::Direct)
            }
            RankVerdict::BelowThreshold { top_score } => {
                debug!(top_score, "Escalating to disambiguation fallback");
                self.run_fallback(&snapshot, &normalized, ranked).await
            }
        };

        let result = apply_confidence_floor(result);

        // Only finalized results are cached; timeouts never get here.
        self.cache.put(&normalized, result.clone());
        Ok(result)
    }

    /// Fuzzy scan and embedding encode run concurrently over one snapshot,
    /// then merge into a ranked candidate list.
    async fn rank_against(
        &self,
        snapshot: &Arc<IndexSnapshot>,
        normalized: &str,
    ) -> Result<Vec<Candidate>, MatchError> {
        let encoder = Arc::clone(&self.encoder);
        let encode_text = normalized.to_string();
        let encode_task = tokio::task::spawn_blocking(move || encoder.encode(&encode_text));

        let scan_snapshot = Arc::clone(snapshot);
        let scan_text = normalized.to_string();
        let fuzzy_task =
            tokio::task::spawn_blocking(move || scan_snapshot.fuzzy_scores(&scan_text));

        let (encode_result, fuzzy_result) = tokio::join!(encode_task, fuzzy_task);
        let query_vec = encode_result??;
        let fuzzy = fuzzy_result?;

        let embedding = snapshot.embedding_scores(&query_vec);
        let shortlist = snapshot.shortlist(&fuzzy, &embedding, self.options.shortlist_size);
        debug!(shortlisted = shortlist.len(), "Shortlist retrieved");

        Ok(self.ranker.rank(snapshot, &shortlist))
    }

    /// One oracle call over the top-k candidates; failure degrades per the
    /// configured policy instead of erroring.
    async fn run_fallback(
        &self,
        snapshot: &IndexSnapshot,
        normalized: &str,
        ranked: Vec<Candidate>,
    ) -> MatchResult {
        let offered: Vec<OracleCandidate> = ranked
            .iter()
            .take(self.options.fallback_top_k)
            .filter_map(|c| {
                snapshot.get(c.record_id).map(|r| OracleCandidate {
                    record_id: c.record_id,
                    display_name: r.display_name.clone(),
                })
            })
            .collect();

        match self.disambiguator.disambiguate(normalized, &offered).await {
            DisambiguationOutcome::Chosen(record_id) => {
                info!(record_id, "Oracle chose a candidate");
                MatchResult::new(
                    normalized.to_string(),
                    promote(ranked, record_id),
                    ResolvedVia::Fallback,
                )
            }
            DisambiguationOutcome::DeclaredNoMatch => {
                info!("Oracle declared no match");
                MatchResult::no_match(normalized.to_string(), ResolvedVia::Fallback)
            }
            DisambiguationOutcome::Unavailable => match self.options.fallback_policy {
                FallbackPolicy::BestAvailable => {
                    debug!("Oracle unavailable, returning best-available ranking");
                    MatchResult::new(normalized.to_string(), ranked, ResolvedVia::Fallback)
                }
                FallbackPolicy::NoMatch => {
                    debug!("Oracle unavailable, policy maps to no-match");
                    MatchResult::no_match(normalized.to_string(), ResolvedVia::Fallback)
                }
            },
        }
    }

    /// Current index snapshot (for hydrating responses with record data).
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

/// Moves the oracle's pick to the front, keeping relative order elsewhere.
fn promote(mut ranked: Vec<Candidate>, record_id: u64) -> Vec<Candidate> {
    if let Some(pos) = ranked.iter().position(|c| c.record_id == record_id) {
        let chosen = ranked.remove(pos);
        ranked.insert(0, chosen);
    }
    ranked
}

/// Results whose best confidence sits below the hard floor collapse to an
/// explicit no-match (a legitimate terminal outcome, not an error).
fn apply_confidence_floor(result: MatchResult) -> MatchResult {
    if result.is_match() && result.confidence < CONFIDENCE_FLOOR {
        MatchResult::no_match(result.query.clone(), result.resolved_via)
    } else {
        result
    }
}
