use axum::{
    routing::{get, post},
    Router,
};
use notify_relay_agent::CompletionClient;
use notify_relay_pipeline::EventPipeline;
use std::sync::Arc;

/// Shared by every handler as `Arc<AppState>`.
pub struct AppState {
    pub pipeline: Arc<EventPipeline>,
    pub client: CompletionClient,
}

impl AppState {
    pub fn new(pipeline: Arc<EventPipeline>, client: CompletionClient) -> Self {
        Self { pipeline, client }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/events", post(crate::http::events::events_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
