use serde::{Deserialize, Serialize};

use crate::record::{MatchResult, ResolvedVia};

/// Request body for `POST /v1/match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub query_text: String,
}

/// One resolved entity in a match response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    /// Store document id of the canonical record.
    pub id: String,
    pub display_name: String,
    pub confidence: f64,
}

/// Response body for `POST /v1/match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchEntry>,
    pub resolved_via: ResolvedVia,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl MatchResponse {
    /// Hydrates candidate ids into store ids and display names.
    ///
    /// Candidates whose record left the snapshot between ranking and
    /// hydration are dropped rather than served with stale ids.
    pub fn from_result(result: &MatchResult, snapshot: &crate::index::IndexSnapshot) -> Self {
        let matches = result
            .candidates
            .iter()
            .filter_map(|candidate| {
                snapshot.get(candidate.record_id).map(|record| MatchEntry {
                    id: record.store_id.clone(),
                    display_name: record.display_name.clone(),
                    confidence: candidate.fused_score,
                })
            })
            .collect();

        Self {
            matches,
            resolved_via: result.resolved_via,
            timed_out: result.timed_out,
        }
    }
}
