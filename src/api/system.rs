//! Liveness endpoint.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
}

/// `GET /health` and `GET /api/health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        message: "Server is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.start_time.elapsed().as_secs_f64(),
    })
}
