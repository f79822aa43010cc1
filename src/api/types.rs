//! Shared types for the HTTP API layer: the request context plus the
//! request/response schemas.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat::ChatService;
use crate::config::EstimatorConfig;
use crate::estimator::{EstimateSource, ExpiryEstimator, HttpImageFetcher, ImageDiagnostics};

/// Shared context for all API routes. Read-only after construction.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<EstimatorConfig>,
    pub estimator: Arc<ExpiryEstimator>,
    pub chat: Arc<ChatService>,
}

impl ApiContext {
    /// Production wiring: one HTTP fetcher shared by estimation and chat.
    pub fn from_config(config: Arc<EstimatorConfig>) -> Self {
        let fetcher = Arc::new(HttpImageFetcher::new(&config));
        Self::new(
            config.clone(),
            Arc::new(ExpiryEstimator::from_config(config.clone(), fetcher.clone())),
            Arc::new(ChatService::from_config(config, fetcher)),
        )
    }

    pub fn new(
        config: Arc<EstimatorConfig>,
        estimator: Arc<ExpiryEstimator>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            config,
            estimator,
            chat,
        }
    }
}

// ──────────────────────────────────────────────
// Schemas
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimated_days: u32,
    pub source: EstimateSource,
    /// Short human-readable provenance sentence.
    pub notes: &'static str,
    pub vision: ImageDiagnostics,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub remote_configured: bool,
    pub version: &'static str,
}
