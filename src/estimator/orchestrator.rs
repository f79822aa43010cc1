//! Composes the fetcher, the diagnostics extractor, and the provider chain
//! into the final estimation policy.
//!
//! The fallback policy lives here and nowhere else: providers are consulted
//! in order, the first `Some` wins and stamps its provenance on the result.
//! The chain ends in the heuristic provider, which always answers.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use super::diagnostics;
use super::fetch::ImageFetcher;
use super::heuristic;
use super::remote::RemoteEstimator;
use super::types::{EstimateSource, EstimationResult, ImageDiagnostics};
use super::EstimationError;
use crate::config::EstimatorConfig;

/// Request-local inputs shared by every provider.
pub struct EstimationContext<'a> {
    pub image_url: &'a str,
    pub image_bytes: &'a [u8],
    pub diagnostics: &'a ImageDiagnostics,
}

/// One way of producing a day-count.
///
/// `Ok(None)` means "no answer, try the next provider". `Err` aborts the
/// request; a failing dependency is reported, never silently skipped.
pub trait ExpiryProvider: Send + Sync {
    fn source(&self) -> EstimateSource;
    fn estimate_days<'a>(
        &'a self,
        ctx: &'a EstimationContext<'a>,
    ) -> BoxFuture<'a, Result<Option<u32>, EstimationError>>;
}

/// Remote model provider. Answers when the adapter is configured and the
/// model returns something usable.
pub struct RemoteProvider {
    inner: RemoteEstimator,
}

impl RemoteProvider {
    pub fn new(inner: RemoteEstimator) -> Self {
        Self { inner }
    }
}

impl ExpiryProvider for RemoteProvider {
    fn source(&self) -> EstimateSource {
        EstimateSource::Remote
    }

    fn estimate_days<'a>(
        &'a self,
        ctx: &'a EstimationContext<'a>,
    ) -> BoxFuture<'a, Result<Option<u32>, EstimationError>> {
        Box::pin(self.inner.estimate(ctx.image_url, ctx.image_bytes, ctx.diagnostics))
    }
}

/// Heuristic provider. Total: it always answers.
pub struct HeuristicProvider {
    config: Arc<EstimatorConfig>,
}

impl HeuristicProvider {
    pub fn new(config: Arc<EstimatorConfig>) -> Self {
        Self { config }
    }
}

impl ExpiryProvider for HeuristicProvider {
    fn source(&self) -> EstimateSource {
        EstimateSource::Heuristic
    }

    fn estimate_days<'a>(
        &'a self,
        ctx: &'a EstimationContext<'a>,
    ) -> BoxFuture<'a, Result<Option<u32>, EstimationError>> {
        let days = heuristic::score(ctx.diagnostics, &self.config);
        Box::pin(async move { Ok(Some(days)) })
    }
}

/// The estimation orchestrator. One per process, shared across requests;
/// holds only read-only state.
pub struct ExpiryEstimator {
    fetcher: Arc<dyn ImageFetcher>,
    providers: Vec<Box<dyn ExpiryProvider>>,
    config: Arc<EstimatorConfig>,
}

impl ExpiryEstimator {
    /// Standard wiring over an injected fetcher: remote provider first,
    /// heuristic last.
    pub fn from_config(config: Arc<EstimatorConfig>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let providers: Vec<Box<dyn ExpiryProvider>> = vec![
            Box::new(RemoteProvider::new(RemoteEstimator::from_config(config.clone()))),
            Box::new(HeuristicProvider::new(config.clone())),
        ];
        Self::new(fetcher, providers, config)
    }

    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        providers: Vec<Box<dyn ExpiryProvider>>,
        config: Arc<EstimatorConfig>,
    ) -> Self {
        Self {
            fetcher,
            providers,
            config,
        }
    }

    /// Estimate remaining shelf life for an image reference.
    ///
    /// Download and decode failures abort before any estimate is produced;
    /// a remote transport failure aborts before the heuristic is attempted.
    pub async fn estimate_expiry(
        &self,
        image_url: &str,
    ) -> Result<EstimationResult, EstimationError> {
        let image_bytes = self.fetcher.fetch(image_url).await?;
        let diagnostics = diagnostics::extract(&image_bytes)?;

        let ctx = EstimationContext {
            image_url,
            image_bytes: &image_bytes,
            diagnostics: &diagnostics,
        };

        for provider in &self.providers {
            if let Some(days) = provider.estimate_days(&ctx).await? {
                info!(days, source = ?provider.source(), "Expiry estimated");
                return Ok(EstimationResult {
                    estimated_days: days,
                    source: provider.source(),
                    diagnostics,
                });
            }
        }

        // Terminal guarantee for chains assembled without the heuristic.
        let days = heuristic::score(&diagnostics, &self.config);
        info!(days, source = ?EstimateSource::Heuristic, "Expiry estimated");
        Ok(EstimationResult {
            estimated_days: days,
            source: EstimateSource::Heuristic,
            diagnostics,
        })
    }
}
