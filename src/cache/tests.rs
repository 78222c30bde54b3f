use super::*;
use crate::record::{Candidate, ResolvedVia};

fn result_for(query: &str, record_id: u64) -> MatchResult {
    MatchResult::new(
        query.to_string(),
        vec![Candidate {
            record_id,
            fuzzy_score: 0.9,
            embedding_score: 0.8,
            fused_score: 0.85,
        }],
        ResolvedVia::Direct,
    )
}

#[test]
fn put_then_get_round_trips() {
    let cache = ResultCache::new();

    cache.put("john smith", result_for("john smith", 1));

    let hit = cache.get("john smith").expect("cached result");
    assert_eq!(hit.query, "john smith");
    assert_eq!(hit.best().map(|c| c.record_id), Some(1));
}

#[test]
fn absent_key_misses() {
    let cache = ResultCache::new();
    assert!(cache.get("never stored").is_none());
}

#[test]
fn invalidate_all_clears_every_entry() {
    let cache = ResultCache::new();

    cache.put("john smith", result_for("john smith", 1));
    cache.put("jane smith", result_for("jane smith", 2));
    assert_eq!(cache.len(), 2);

    cache.invalidate_all();

    assert!(cache.get("john smith").is_none());
    assert!(cache.get("jane smith").is_none());
    assert!(cache.is_empty());
}

#[test]
fn capacity_bound_evicts() {
    let cache = ResultCache::with_settings(2, Duration::from_secs(600));

    cache.put("one", result_for("one", 1));
    cache.put("two", result_for("two", 2));
    cache.put("three", result_for("three", 3));
    cache.run_pending_tasks();

    assert!(cache.len() <= 2, "len was {}", cache.len());
}

#[test]
fn ttl_expires_entries() {
    let cache = ResultCache::with_settings(10, Duration::from_millis(20));

    cache.put("john smith", result_for("john smith", 1));
    assert!(cache.get("john smith").is_some());

    std::thread::sleep(Duration::from_millis(50));
    cache.run_pending_tasks();

    assert!(cache.get("john smith").is_none());
}

#[test]
fn stats_track_hits_and_misses() {
    let cache = ResultCache::new();
    cache.put("john smith", result_for("john smith", 1));

    let _ = cache.get("john smith");
    let _ = cache.get("john smith");
    let _ = cache.get("unknown");

    let stats = cache.stats();
    assert_eq!(stats.hit_count, 2);
    assert_eq!(stats.miss_count, 1);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.size, 1);
    assert_eq!(stats.ttl_seconds, 600);
}

#[test]
fn fresh_cache_reports_zero_rate() {
    let cache = ResultCache::new();
    let stats = cache.stats();
    assert_eq!(stats.hit_count, 0);
    assert_eq!(stats.miss_count, 0);
    assert_eq!(stats.hit_rate, 0.0);
}
