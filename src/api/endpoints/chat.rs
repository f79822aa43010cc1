//! Chat endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ChatRequest, ChatResponse};

/// `POST /chat` — converse with the remote model, optionally about an image.
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let reply = ctx
        .chat
        .chat(&request.message, request.image_url.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        model: reply.model,
    }))
}
