//! Health check endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use pulse_services::Capabilities;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    capabilities: Capabilities,
}

/// Health check handler. Fallback mode is still healthy, just degraded.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.caps.is_live() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        capabilities: state.caps,
    })
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
