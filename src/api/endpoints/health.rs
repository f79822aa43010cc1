//! Health check endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::types::{ApiContext, HealthResponse};

/// `GET /health` — liveness plus remote-adapter visibility.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        remote_configured: ctx.config.remote_enabled(),
        version: crate::config::APP_VERSION,
    })
}
