use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness check with relay status.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "target": state.pipeline.target(),
        "consumer_registered": state.pipeline.queue().has_consumer(),
        "in_flight": state.client.in_flight(),
    }))
}
