use std::sync::Arc;

use crate::engine::MatchEngine;

/// Shared state handed to every gateway handler.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<MatchEngine>,
}

impl GatewayState {
    pub fn new(engine: Arc<MatchEngine>) -> Self {
        Self { engine }
    }
}
