use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use threadrelay_agent::MentionPipeline;
use threadrelay_core::RelayConfig;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: RelayConfig,
    pub pipeline: MentionPipeline,
}

impl AppState {
    pub fn new(config: RelayConfig, pipeline: MentionPipeline) -> Self {
        Self { config, pipeline }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/slack/events", post(crate::http::events::events_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
