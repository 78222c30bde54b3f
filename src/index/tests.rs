use super::*;
use crate::embedding::{EncoderConfig, TextEncoder};
use crate::normalize::normalize;
use std::collections::BTreeMap;

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

fn encoder() -> TextEncoder {
    TextEncoder::load(EncoderConfig::stub()).expect("stub encoder")
}

fn people_snapshot(encoder: &TextEncoder) -> IndexSnapshot {
    IndexSnapshot::new(
        1,
        vec![
            record(1, "John Smith", encoder),
            record(2, "Jane Smith", encoder),
            record(3, "Acme Corporation", encoder),
            record(4, "Smithfield Foods", encoder),
        ],
    )
}

#[test]
fn snapshot_dedupes_by_id_keeping_first() {
    let enc = encoder();
    let snapshot = IndexSnapshot::new(
        1,
        vec![
            record(7, "First Entry", &enc),
            record(7, "Second Entry", &enc),
        ],
    );

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(7).map(|r| r.display_name.as_str()), Some("First Entry"));
}

#[test]
fn empty_snapshot_retrieves_nothing() {
    let snapshot = IndexSnapshot::empty();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.generation(), 0);
    assert!(snapshot.shortlist(&[], &[], 10).is_empty());
}

#[test]
fn fuzzy_scan_prefers_lexical_match() {
    let enc = encoder();
    let snapshot = people_snapshot(&enc);

    let scores = snapshot.fuzzy_scores("jon smyth");
    let best = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| snapshot.records()[i].id);
    assert_eq!(best, Some(1));
}

#[test]
fn embedding_scan_puts_identical_text_first() {
    let enc = encoder();
    let snapshot = people_snapshot(&enc);

    let query_vec = enc.encode("acme corporation").expect("encode");
    let scores = snapshot.embedding_scores(&query_vec);
    let best = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| snapshot.records()[i].id);
    assert_eq!(best, Some(3));
}

#[test]
fn shortlist_unions_both_signals_and_dedupes() {
    let enc = encoder();
    let snapshot = people_snapshot(&enc);

    let query = "john smith";
    let query_vec = enc.encode(query).expect("encode");
    let fuzzy = snapshot.fuzzy_scores(query);
    let embedding = snapshot.embedding_scores(&query_vec);

    let shortlist = snapshot.shortlist(&fuzzy, &embedding, 10);

    // Every record id appears at most once.
    let mut ids: Vec<u64> = shortlist.iter().map(|s| s.record_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), shortlist.len());

    // The exact lexical + semantic match leads.
    assert_eq!(shortlist[0].record_id, 1);
    assert!(shortlist[0].fuzzy_score > 0.99);
}

#[test]
fn shortlist_respects_cap() {
    let enc = encoder();
    let snapshot = people_snapshot(&enc);

    let fuzzy = snapshot.fuzzy_scores("smith");
    let query_vec = enc.encode("smith").expect("encode");
    let embedding = snapshot.embedding_scores(&query_vec);

    let shortlist = snapshot.shortlist(&fuzzy, &embedding, 2);
    assert_eq!(shortlist.len(), 2);
}

#[test]
fn install_bumps_generation_and_swaps_contents() {
    let enc = encoder();
    let index = CandidateIndex::new();
    assert_eq!(index.generation(), 0);

    let first_gen = index.install(vec![record(1, "John Smith", &enc)]);
    assert_eq!(first_gen, 1);
    assert_eq!(index.snapshot().len(), 1);

    let second_gen = index.install(vec![
        record(1, "John Smith", &enc),
        record(2, "Jane Smith", &enc),
    ]);
    assert_eq!(second_gen, 2);
    assert_eq!(index.snapshot().len(), 2);
}

#[test]
fn old_snapshot_survives_swap_for_inflight_readers() {
    let enc = encoder();
    let index = CandidateIndex::new();
    index.install(vec![record(1, "John Smith", &enc)]);

    let held = index.snapshot();
    index.install(vec![record(2, "Jane Smith", &enc)]);

    // The in-flight reader still sees generation 1 with its original record.
    assert_eq!(held.generation(), 1);
    assert!(held.get(1).is_some());
    assert!(held.get(2).is_none());

    // New readers see generation 2.
    let fresh = index.snapshot();
    assert_eq!(fresh.generation(), 2);
    assert!(fresh.get(2).is_some());
}
