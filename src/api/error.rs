//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::estimator::EstimationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
///
/// Client-input problems (bad image, bad reference) are kept distinct from
/// upstream-dependency problems (remote inference) so operators can tell
/// them apart from the status code alone.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Provided file is not a valid image")]
    InvalidImage,
    #[error("Unable to download image")]
    DownloadFailed(u16),
    #[error("Invalid image URL or unreachable host")]
    UnreachableHost,
    #[error("Remote inference failed")]
    RemoteUnavailable,
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<EstimationError> for ApiError {
    fn from(err: EstimationError) -> Self {
        match err {
            EstimationError::InvalidImage => ApiError::InvalidImage,
            EstimationError::DownloadFailed { status } => ApiError::DownloadFailed(status),
            EstimationError::UnreachableHost => ApiError::UnreachableHost,
            EstimationError::RemoteInference(detail) => {
                // Full detail stays in the logs; the response carries a
                // generic message so endpoint internals never leak out.
                tracing::error!(detail = %detail, "Remote inference failure");
                ApiError::RemoteUnavailable
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidImage => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_IMAGE",
                self.to_string(),
            ),
            // The upstream status is passed through so callers see what the
            // image host answered.
            ApiError::DownloadFailed(upstream) => (
                StatusCode::from_u16(*upstream).unwrap_or(StatusCode::BAD_GATEWAY),
                "DOWNLOAD_FAILED",
                self.to_string(),
            ),
            ApiError::UnreachableHost => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREACHABLE_HOST",
                self.to_string(),
            ),
            ApiError::RemoteUnavailable => (
                StatusCode::BAD_GATEWAY,
                "REMOTE_INFERENCE",
                self.to_string(),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}
