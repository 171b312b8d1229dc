//! Liveness probe.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /health`: always answers while the process is serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: moon_core::version().to_string(),
    })
}
