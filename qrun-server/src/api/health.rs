//! Health Check API Handler
//!
//! Liveness endpoint for monitoring; also reports the pending job count.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "queue_length": state.jobs.get_queue_length(None),
    }))
}
