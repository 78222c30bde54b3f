//! In-memory candidate index over canonical records.
//!
//! An [`IndexSnapshot`] is immutable once built; [`CandidateIndex`] serves an
//! `Arc` to the current snapshot and swaps it wholesale on refresh. Readers
//! holding the old `Arc` keep a consistent view until they drop it:
//! refcounted retirement, no read-path locking beyond the swap itself.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::embedding::cosine_similarity;
use crate::fuzzy::fuzzy_score;
use crate::record::CanonicalRecord;

/// One record surviving shortlist retrieval, with both retrieval signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortlisted {
    pub record_id: u64,
    /// Lexical similarity in `[0, 1]`.
    pub fuzzy_score: f64,
    /// Cosine similarity in `[-1, 1]`.
    pub embedding_score: f64,
}

/// An immutable view of the canonical record set.
#[derive(Debug)]
pub struct IndexSnapshot {
    generation: u64,
    records: Vec<CanonicalRecord>,
    by_id: HashMap<u64, usize>,
}

impl IndexSnapshot {
    /// Builds a snapshot; duplicate record ids keep the first occurrence so
    /// a snapshot always holds exactly one record per id.
    pub fn new(generation: u64, records: Vec<CanonicalRecord>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut deduped = Vec::with_capacity(records.len());

        for record in records {
            if let std::collections::hash_map::Entry::Vacant(slot) = by_id.entry(record.id) {
                slot.insert(deduped.len());
                deduped.push(record);
            }
        }

        Self {
            generation,
            records: deduped,
            by_id,
        }
    }

    /// The empty zeroth snapshot served before the first refresh.
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    #[inline]
    pub fn get(&self, record_id: u64) -> Option<&CanonicalRecord> {
        self.by_id.get(&record_id).map(|&idx| &self.records[idx])
    }

    /// Lexical similarity of the query against every record, by position.
    pub fn fuzzy_scores(&self, normalized_query: &str) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| fuzzy_score(normalized_query, &r.normalized_name))
            .collect()
    }

    /// Cosine similarity of the query vector against every record, by position.
    pub fn embedding_scores(&self, query_vec: &[f32]) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| cosine_similarity(query_vec, &r.embedding) as f64)
            .collect()
    }

    /// Merges per-record score arrays into the retrieval shortlist:
    /// top-`cap` by fuzzy score ∪ top-`cap` by embedding score, deduplicated
    /// by id, capped at `cap`. Output order is deterministic: best combined
    /// signal first, ties broken by ascending record id.
    pub fn shortlist(&self, fuzzy: &[f64], embedding: &[f64], cap: usize) -> Vec<Shortlisted> {
        debug_assert_eq!(fuzzy.len(), self.records.len());
        debug_assert_eq!(embedding.len(), self.records.len());

        if cap == 0 || self.records.is_empty() {
            return Vec::new();
        }

        let fuzzy_top = top_positions(fuzzy, cap, &self.records);
        let embed_top = top_positions(embedding, cap, &self.records);

        let mut picked: Vec<usize> = Vec::with_capacity(fuzzy_top.len() + embed_top.len());
        let mut seen = std::collections::HashSet::with_capacity(picked.capacity());
        for pos in fuzzy_top.into_iter().chain(embed_top) {
            if seen.insert(self.records[pos].id) {
                picked.push(pos);
            }
        }

        let mut entries: Vec<Shortlisted> = picked
            .into_iter()
            .map(|pos| Shortlisted {
                record_id: self.records[pos].id,
                fuzzy_score: fuzzy[pos],
                embedding_score: embedding[pos],
            })
            .collect();

        entries.sort_by(|a, b| {
            combined_signal(b)
                .total_cmp(&combined_signal(a))
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        entries.truncate(cap);
        entries
    }
}

/// Best single retrieval signal, with cosine rescaled onto `[0, 1]` so the
/// two sides are comparable when capping the union.
#[inline]
fn combined_signal(entry: &Shortlisted) -> f64 {
    entry.fuzzy_score.max((entry.embedding_score + 1.0) / 2.0)
}

fn top_positions(scores: &[f64], cap: usize, records: &[CanonicalRecord]) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..scores.len()).collect();
    positions.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| records[a].id.cmp(&records[b].id))
    });
    positions.truncate(cap);
    positions
}

/// Shared handle to the currently served [`IndexSnapshot`].
pub struct CandidateIndex {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl CandidateIndex {
    /// Starts with the empty zeroth snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
        }
    }

    /// Returns the current snapshot. The returned `Arc` stays valid across
    /// any number of subsequent swaps.
    #[inline]
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Atomically replaces the served snapshot with a freshly built one.
    /// Returns the new generation.
    pub fn install(&self, records: Vec<CanonicalRecord>) -> u64 {
        let next_gen = self.current.read().generation() + 1;
        let snapshot = Arc::new(IndexSnapshot::new(next_gen, records));
        let count = snapshot.len();

        *self.current.write() = snapshot;

        info!(generation = next_gen, records = count, "Index snapshot installed");
        next_gen
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.current.read().generation()
    }
}

impl Default for CandidateIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CandidateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CandidateIndex")
            .field("generation", &snapshot.generation())
            .field("records", &snapshot.len())
            .finish()
    }
}
