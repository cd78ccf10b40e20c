//! Event ingress endpoint: POST /events
//!
//! The device-side notification listener posts each raw event here.
//!
//! Request:  `{"source_id": "com.tencent.mm", "text_fragments": ["alice:hi"]}`
//! Response: `202 {"payloads": 1}` once the originals are relayed and the
//! completion calls are dispatched. The response never waits on them.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use notify_relay_core::types::RawEvent;

use crate::app::AppState;

#[derive(Serialize)]
pub struct EventReceipt {
    pub payloads: usize,
}

/// POST /events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<RawEvent>,
) -> (StatusCode, Json<EventReceipt>) {
    let payloads = state.pipeline.on_event(event);
    (StatusCode::ACCEPTED, Json(EventReceipt { payloads }))
}
