//! Image download collaborator.

use futures_util::future::BoxFuture;
use tracing::debug;

use super::EstimationError;
use crate::config::EstimatorConfig;

/// Fetches raw image bytes for an image reference.
///
/// Abstracted so the pipeline can be exercised without network access.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, EstimationError>>;
}

/// Production fetcher over `reqwest` with the configured download timeout.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(config: &EstimatorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, EstimationError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|_| EstimationError::UnreachableHost)?;

            let status = response.status();
            if !status.is_success() {
                return Err(EstimationError::DownloadFailed {
                    status: status.as_u16(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|_| EstimationError::UnreachableHost)?;
            debug!(url, size = bytes.len(), "Image downloaded");
            Ok(bytes.to_vec())
        })
    }
}

/// Mock fetcher for tests: serves canned bytes or a canned failure.
pub struct MockImageFetcher {
    outcome: MockFetchOutcome,
}

enum MockFetchOutcome {
    Bytes(Vec<u8>),
    Status(u16),
    Unreachable,
}

impl MockImageFetcher {
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self {
            outcome: MockFetchOutcome::Bytes(bytes),
        }
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self {
            outcome: MockFetchOutcome::Status(status),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            outcome: MockFetchOutcome::Unreachable,
        }
    }
}

impl ImageFetcher for MockImageFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, EstimationError>> {
        Box::pin(async move {
            match &self.outcome {
                MockFetchOutcome::Bytes(bytes) => Ok(bytes.clone()),
                MockFetchOutcome::Status(status) => {
                    Err(EstimationError::DownloadFailed { status: *status })
                }
                MockFetchOutcome::Unreachable => Err(EstimationError::UnreachableHost),
            }
        })
    }
}
