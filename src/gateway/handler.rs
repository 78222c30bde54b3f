use axum::{Json, extract::State};
use serde_json::json;
use tracing::instrument;

use crate::cache::CacheStats;

use super::error::GatewayError;
use super::payload::{MatchRequest, MatchResponse};
use super::state::GatewayState;

#[instrument(skip(state, request), fields(query_len = request.query_text.len()))]
pub async fn match_handler(
    State(state): State<GatewayState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, GatewayError> {
    if request.query_text.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "query_text must not be empty".to_string(),
        ));
    }

    let result = state.engine.resolve(&request.query_text).await?;
    let snapshot = state.engine.snapshot();

    Ok(Json(MatchResponse::from_result(&result, &snapshot)))
}

pub async fn health_handler(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.snapshot();
    Json(json!({
        "status": "ok",
        "snapshot_generation": snapshot.generation(),
        "records": snapshot.len(),
    }))
}

pub async fn cache_stats_handler(State(state): State<GatewayState>) -> Json<CacheStats> {
    Json(state.engine.cache_stats())
}
