//! End-to-end pipeline tests over the mock store and a scriptable oracle.

mod common;

use common::fixtures::{people_documents, service_with};

use namesake::gateway::MatchResponse;
use namesake::oracle::{FallbackPolicy, MockOracle};
use namesake::record::ResolvedVia;
use namesake::store::{Document, StoreError};

#[tokio::test]
async fn misspelled_name_resolves_to_the_right_record() {
    let service = service_with(
        people_documents(),
        MockOracle::failing(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let result = service.engine.resolve("Jon Smyth").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Direct);
    assert!(result.confidence >= 0.75);

    let snapshot = service.engine.snapshot();
    let best = result.best().expect("best candidate");
    let record = snapshot.get(best.record_id).expect("record in snapshot");
    assert_eq!(record.store_id, "doc-1");
    assert_eq!(record.display_name, "John Smith");
}

#[tokio::test]
async fn repeated_queries_come_from_the_cache() {
    let service = service_with(
        people_documents(),
        MockOracle::failing(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let first = service.engine.resolve("Jon Smyth").await.expect("resolves");
    assert_eq!(first.resolved_via, ResolvedVia::Direct);

    // Different raw spelling, same normalized query.
    let second = service.engine.resolve("  JON smyth ").await.expect("resolves");
    assert_eq!(second.resolved_via, ResolvedVia::Cache);

    let stats = service.engine.cache_stats();
    assert_eq!(stats.hit_count, 1);
}

#[tokio::test]
async fn refresh_swaps_snapshot_and_clears_cache() {
    let service = service_with(
        people_documents(),
        MockOracle::failing(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let _ = service.engine.resolve("Jon Smyth").await.expect("resolves");

    // The store now carries a different record set.
    service.store.set_documents(vec![
        Document::new("doc-9", "Johnny Smithers"),
    ]);
    let generation = service.refresher.refresh_once().await.expect("refresh");
    assert_eq!(generation, 2);

    // The previously cached result is gone, and resolution now works
    // against the new snapshot only.
    let result = service.engine.resolve("Jon Smyth").await.expect("resolves");
    assert_ne!(result.resolved_via, ResolvedVia::Cache);

    let snapshot = service.engine.snapshot();
    for candidate in &result.candidates {
        assert!(
            snapshot.get(candidate.record_id).is_some(),
            "candidate references a record outside the current snapshot"
        );
    }
}

#[tokio::test]
async fn store_outage_keeps_serving_the_previous_snapshot() {
    let service = service_with(
        people_documents(),
        MockOracle::failing(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    service.store.set_unavailable(true);
    let refresh_result = service.refresher.refresh_once().await;
    assert!(matches!(refresh_result, Err(StoreError::Unavailable { .. })));

    // Queries keep answering from the prior snapshot; no store error leaks.
    let result = service.engine.resolve("Jon Smyth").await.expect("resolves");
    assert!(result.is_match());
    assert_eq!(service.index.generation(), 1);
}

#[tokio::test]
async fn unmatched_query_degrades_when_oracle_is_dead() {
    let oracle = MockOracle::failing();
    let service = service_with(
        people_documents(),
        oracle.clone(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let result = service
        .engine
        .resolve("Xyzzy Unmatched")
        .await
        .expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(result.is_match());
    assert!(result.confidence < 0.75);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn oracle_pick_resolves_ambiguous_query() {
    // "smith" is ambiguous between John and Jane; the oracle picks #2.
    let oracle = MockOracle::replying("2");
    let service = service_with(
        people_documents(),
        oracle.clone(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let result = service.engine.resolve("smith").await.expect("resolves");

    assert_eq!(result.resolved_via, ResolvedVia::Fallback);
    assert!(result.is_match());
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn match_response_hydrates_store_ids_and_names() {
    let service = service_with(
        people_documents(),
        MockOracle::failing(),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let result = service.engine.resolve("Jon Smyth").await.expect("resolves");
    let snapshot = service.engine.snapshot();
    let response = MatchResponse::from_result(&result, &snapshot);

    assert_eq!(response.resolved_via, ResolvedVia::Direct);
    assert!(!response.timed_out);
    assert!(!response.matches.is_empty());
    assert_eq!(response.matches[0].id, "doc-1");
    assert_eq!(response.matches[0].display_name, "John Smith");
    assert!(response.matches[0].confidence >= 0.75);

    // Serialized shape matches the service contract.
    let json = serde_json::to_value(&response).expect("serializes");
    assert_eq!(json["resolved_via"], "direct");
    assert!(json["matches"].is_array());
    assert!(json.get("timed_out").is_none(), "false timed_out is omitted");
}

#[tokio::test]
async fn empty_store_resolves_to_no_match() {
    let service = service_with(
        Vec::new(),
        MockOracle::replying("1"),
        FallbackPolicy::BestAvailable,
    )
    .await;

    let result = service.engine.resolve("anything at all").await.expect("resolves");
    assert!(!result.is_match());
}
