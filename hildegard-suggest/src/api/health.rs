//! Health check endpoint
//!
//! Reports `degraded` while submissions are disabled; the wizard itself
//! still works in that mode.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub destination: String,
    pub matcher: &'static str,
    pub active_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.destination.is_ready() {
            "ok"
        } else {
            "degraded"
        },
        module: "hildegard-suggest",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.startup_time.elapsed().as_secs(),
        destination: state.destination.describe(),
        matcher: state.matcher.name(),
        active_sessions: state.sessions.len().await,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
