//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub provider_configured: bool,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        provider_configured: state.provider.is_configured(),
    })
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Video Analysis API".to_string(),
        status: "running".to_string(),
    })
}
