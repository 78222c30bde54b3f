use super::*;
use crate::embedding::EncoderConfig;
use crate::oracle::MockOracle;
use crate::ranking::WeightedFusionModel;
use crate::record::CanonicalRecord;
use std::collections::BTreeMap;

fn encoder() -> Arc<TextEncoder> {
    Arc::new(TextEncoder::load(EncoderConfig::stub()).expect("stub encoder"))
}

fn record(id: u64, name: &str, encoder: &TextEncoder) -> CanonicalRecord {
    let normalized = normalize(name);
    let embedding = encoder.encode(&normalized).expect("encode");
    CanonicalRecord {
        id,
        store_id: format!("doc-{id}"),
        display_name: name.to_string(),
        normalized_name: normalized,
        embedding,
        metadata: BTreeMap::new(),
    }
}

struct Harness {
    engine: MatchEngine,
    index: Arc<CandidateIndex>,
    cache: Arc<ResultCache>,
}

/// The stub encoder produces hash-noise semantics, so the fusion weights
/// lean on the lexical signal to keep threshold partitioning deterministic.
fn harness(oracle: MockOracle, policy: FallbackPolicy) -> Harness {
    let encoder = encoder();
    let index = Arc::new(CandidateIndex::new());
    index.install(vec![
        record(1, "John Smith", &encoder),
        record(2, "Jane Smith", &encoder),
    ]);

    let ranker = Arc::new(Ranker::new(
        Arc::new(WeightedFusionModel::with_weights(0.9, 0.1)),
        0.75,
        Vec::new(),
    ));
    let cache = Arc::new(ResultCache::new());
    let disambiguator = Disambiguator::new(Arc::new(oracle), Duration::from_millis(100));

    let options = EngineOptions {
        shortlist_size: 50,
        fallback_top_k: 5,
        query_timeout: Duration::from_secs(2),
        fallback_policy: policy,
    };

    let engine = MatchEngine::new(
        Arc::clone(&encoder),
        Arc::clone(&index),
        ranker,
        Arc::clone(&cache),
        disambiguator,
        options,
    );

    Harness {
        engine,
        index,
        cache,
    }
}

#[tokio::test]
async fn close_misspelling_resolves_directly() {
    let oracle = MockOracle::failing();
    let h = harness(oracle.clone(), FallbackPolicy::BestAvailable);

    let result = h.engine.resolve("Jon Smyth").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Direct);
    assert_eq!(result.best().map(|c| c.record_id), Some(1));
    assert!(result.confidence >= 0.75, "confidence {}", result.confidence);
    // Direct resolution never touches the oracle.
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn empty_query_is_a_no_match_not_a_crash() {
    let h = harness(MockOracle::failing(), FallbackPolicy::BestAvailable);

    let result = h.engine.resolve("   \t ").await.expect("resolves");
    assert!(!result.is_match());
    assert!(!result.timed_out);
}

#[tokio::test]
async fn second_resolve_hits_the_cache() {
    let h = harness(MockOracle::failing(), FallbackPolicy::BestAvailable);

    let first = h.engine.resolve("Jon Smyth").await.expect("resolves");
    assert_eq!(first.resolved_via, ResolvedVia::Direct);

    let second = h.engine.resolve("jon  SMYTH").await.expect("resolves");
    assert_eq!(second.resolved_via, ResolvedVia::Cache);
    assert_eq!(second.best().map(|c| c.record_id), Some(1));
}

#[tokio::test]
async fn snapshot_swap_clears_cached_results() {
    let h = harness(MockOracle::failing(), FallbackPolicy::BestAvailable);

    let _ = h.engine.resolve("Jon Smyth").await.expect("resolves");

    // Simulate a refresh: install a new snapshot, then invalidate.
    let enc = encoder();
    h.index.install(vec![record(3, "Johnny Smith", &enc)]);
    h.cache.invalidate_all();

    let after = h.engine.resolve("Jon Smyth").await.expect("resolves");
    assert_ne!(after.resolved_via, ResolvedVia::Cache);
    assert_eq!(after.best().map(|c| c.record_id), Some(3));
}

#[tokio::test]
async fn unmatched_query_with_dead_oracle_degrades_to_best_available() {
    let oracle = MockOracle::failing();
    let h = harness(oracle.clone(), FallbackPolicy::BestAvailable);

    let result = h.engine.resolve("Xyzzy Unmatched").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(result.is_match(), "best-available keeps the ranked list");
    assert!(result.confidence < 0.75, "confidence {}", result.confidence);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn unmatched_query_with_no_match_policy_returns_empty() {
    let h = harness(MockOracle::failing(), FallbackPolicy::NoMatch);

    let result = h.engine.resolve("Xyzzy Unmatched").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(!result.is_match());
}

#[tokio::test]
async fn oracle_choice_promotes_the_chosen_candidate() {
    // The oracle picks candidate 2 from the numbered list.
    let oracle = MockOracle::replying("2");
    let h = harness(oracle.clone(), FallbackPolicy::BestAvailable);

    let result = h.engine.resolve("Xyzzy Unmatched").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert_eq!(result.candidates.len(), 2);
    // The oracle picked the second-ranked candidate, so after promotion the
    // list is no longer in descending fused-score order.
    assert!(result.candidates[0].fused_score <= result.candidates[1].fused_score);
    assert_eq!(result.confidence, result.candidates[0].fused_score);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn oracle_none_answer_is_an_explicit_no_match() {
    let oracle = MockOracle::replying("NONE");
    let h = harness(oracle, FallbackPolicy::BestAvailable);

    let result = h.engine.resolve("Xyzzy Unmatched").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(!result.is_match());
}

#[tokio::test]
async fn hanging_oracle_is_bounded_by_its_own_timeout() {
    let oracle = MockOracle::hanging(Duration::from_secs(60));
    let h = harness(oracle, FallbackPolicy::BestAvailable);

    let start = std::time::Instant::now();
    let result = h.engine.resolve("Xyzzy Unmatched").await.expect("resolves");

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(result.is_match());
}

#[tokio::test]
async fn zero_budget_times_out_as_no_match() {
    let mut h = harness(MockOracle::failing(), FallbackPolicy::BestAvailable);
    h.engine.options.query_timeout = Duration::ZERO;

    let result = h.engine.resolve("Jon Smyth").await.expect("resolves");

    assert!(result.timed_out);
    assert!(!result.is_match());
    // Timed-out results are not finalized and must not be cached.
    assert!(h.cache.get("jon smyth").is_none());
}

#[tokio::test]
async fn empty_snapshot_yields_no_match_without_fallback() {
    let oracle = MockOracle::replying("1");
    let encoder = encoder();
    let index = Arc::new(CandidateIndex::new());
    let ranker = Arc::new(Ranker::new(
        Arc::new(WeightedFusionModel::new()),
        0.75,
        Vec::new(),
    ));
    let cache = Arc::new(ResultCache::new());
    let disambiguator = Disambiguator::new(Arc::new(oracle.clone()), Duration::from_millis(50));

    let engine = MatchEngine::new(
        encoder,
        index,
        ranker,
        cache,
        disambiguator,
        EngineOptions {
            shortlist_size: 50,
            fallback_top_k: 5,
            query_timeout: Duration::from_secs(2),
            fallback_policy: FallbackPolicy::BestAvailable,
        },
    );

    let result = engine.resolve("anything").await.expect("resolves");
    assert!(!result.is_match());
    assert_eq!(oracle.call_count(), 0);
}
