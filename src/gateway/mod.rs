//! Thin HTTP boundary over the match engine.
//!
//! `POST /v1/match` resolves a query; `GET /health` and
//! `GET /v1/cache/stats` expose liveness and cache counters. Auth and
//! multi-tenancy are deliberately absent here.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

pub use error::GatewayError;
pub use payload::{MatchEntry, MatchRequest, MatchResponse};
pub use state::GatewayState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the service router with tracing and permissive CORS.
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/match", post(handler::match_handler))
        .route("/health", get(handler::health_handler))
        .route("/v1/cache/stats", get(handler::cache_stats_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
