use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Live WebSocket sessions
    pub sessions: usize,
    /// Whether a listener is currently designated
    pub listening: bool,
}

/// `GET /health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        sessions: state.hub.session_count(),
        listening: state.hub.snapshot().is_listening(),
    })
}
