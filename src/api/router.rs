//! Service router.

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the service router.
///
/// Returns a `Router` with all endpoints mounted at the root, ready to be
/// served (or exercised in-process by tests via `tower::ServiceExt`).
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/estimate", post(endpoints::estimate::estimate))
        .route("/chat", post(endpoints::chat::send))
        .with_state(ctx)
}
