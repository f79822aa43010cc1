//! Expiry estimation endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, EstimateRequest, EstimateResponse};
use crate::estimator::EstimateSource;

/// `POST /estimate` — estimate remaining shelf life from an image reference.
pub async fn estimate(
    State(ctx): State<ApiContext>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    if request.image_url.trim().is_empty() {
        return Err(ApiError::BadRequest("image_url must not be empty".into()));
    }

    let result = ctx.estimator.estimate_expiry(&request.image_url).await?;
    let notes = match result.source {
        EstimateSource::Remote => "Remote model estimate",
        EstimateSource::Heuristic => "Fallback image heuristics (no remote answer)",
    };

    Ok(Json(EstimateResponse {
        estimated_days: result.estimated_days,
        source: result.source,
        notes,
        vision: result.diagnostics,
    }))
}
