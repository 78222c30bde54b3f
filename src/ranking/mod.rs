//! Score fusion and candidate ranking.
//!
//! The [`Ranker`] turns a retrieval shortlist into an ordered candidate list
//! by feeding `[fuzzy_score, embedding_score, metadata features…]` through a
//! [`FusionModel`], then applies the confidence threshold τ to decide
//! between direct resolution and oracle escalation.

pub mod error;
pub mod model;


pub use error::FusionError;
pub use model::{FusionModel, GradientBoostedModel, WeightedFusionModel};

use std::sync::Arc;

use tracing::{debug, info};

use crate::index::{IndexSnapshot, Shortlisted};
use crate::record::Candidate;

/// Outcome of applying the confidence threshold to a ranked list.
#[derive(Debug, Clone, PartialEq)]
pub enum RankVerdict {
    /// Top candidate meets τ; resolve directly.
    AboveThreshold {
        /// Fused score of the winning candidate.
        score: f64,
    },
    /// Top candidate is below τ; escalate to disambiguation.
    BelowThreshold {
        /// Best fused score observed.
        top_score: f64,
    },
    /// The shortlist was empty.
    NoCandidates,
}

impl RankVerdict {
    /// Returns `true` if the threshold was met.
    pub fn is_confident(&self) -> bool {
        matches!(self, RankVerdict::AboveThreshold { .. })
    }

    /// Returns the observed score (if any candidates existed).
    pub fn score(&self) -> Option<f64> {
        match self {
            RankVerdict::AboveThreshold { score }
            | RankVerdict::BelowThreshold { top_score: score } => Some(*score),
            RankVerdict::NoCandidates => None,
        }
    }
}

impl std::fmt::Display for RankVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankVerdict::AboveThreshold { score } => write!(f, "CONFIDENT (score: {:.4})", score),
            RankVerdict::BelowThreshold { top_score } => {
                write!(f, "ESCALATE (top_score: {:.4})", top_score)
            }
            RankVerdict::NoCandidates => write!(f, "NO_CANDIDATES"),
        }
    }
}

/// Fuses retrieval signals into confidence scores and orders candidates.
pub struct Ranker {
    fusion: Arc<dyn FusionModel>,
    threshold: f64,
    feature_names: Vec<String>,
}

impl std::fmt::Debug for Ranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ranker")
            .field("fusion", &self.fusion.name())
            .field("threshold", &self.threshold)
            .field("feature_names", &self.feature_names)
            .finish()
    }
}

impl Ranker {
    pub fn new(fusion: Arc<dyn FusionModel>, threshold: f64, feature_names: Vec<String>) -> Self {
        Self {
            fusion,
            threshold,
            feature_names,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores and orders a shortlist.
    ///
    /// Output is sorted by fused score descending, ties broken by ascending
    /// record id, so identical inputs always produce identical orderings.
    pub fn rank(&self, snapshot: &IndexSnapshot, shortlist: &[Shortlisted]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = shortlist
            .iter()
            .map(|entry| {
                let features = self.features_for(snapshot, entry);
                let fused = self.fusion.predict(&features).clamp(0.0, 1.0);
                Candidate {
                    record_id: entry.record_id,
                    fuzzy_score: entry.fuzzy_score,
                    embedding_score: entry.embedding_score,
                    fused_score: fused,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.fused_score
                .total_cmp(&a.fused_score)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });

        debug!(
            shortlisted = shortlist.len(),
            best_score = candidates.first().map(|c| c.fused_score),
            model = self.fusion.name(),
            "Shortlist ranked"
        );

        candidates
    }

    /// Applies τ to an already-ranked candidate list.
    pub fn verdict(&self, candidates: &[Candidate]) -> RankVerdict {
        let Some(top) = candidates.first() else {
            return RankVerdict::NoCandidates;
        };

        if top.fused_score >= self.threshold {
            info!(
                score = top.fused_score,
                threshold = self.threshold,
                record_id = top.record_id,
                "Direct resolution"
            );
            RankVerdict::AboveThreshold {
                score: top.fused_score,
            }
        } else {
            debug!(
                top_score = top.fused_score,
                threshold = self.threshold,
                "Below threshold, escalating"
            );
            RankVerdict::BelowThreshold {
                top_score: top.fused_score,
            }
        }
    }

    fn features_for(&self, snapshot: &IndexSnapshot, entry: &Shortlisted) -> Vec<f64> {
        let mut features = Vec::with_capacity(2 + self.feature_names.len());
        features.push(entry.fuzzy_score);
        features.push(entry.embedding_score);

        if !self.feature_names.is_empty() {
            let record = snapshot.get(entry.record_id);
            for name in &self.feature_names {
                features.push(record.map(|r| r.feature(name)).unwrap_or(0.0));
            }
        }

        features
    }
}
