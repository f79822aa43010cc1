//! Remote vision-model adapter: prompt construction, chat-completions
//! transport, and defensive day-count extraction.
//!
//! The remote model is an untrusted text generator. The parser tolerates a
//! dedicated integer field, free text, or nothing at all, and the clamp
//! guarantees any accepted answer lands in `[1, max_shelf_life_days]`.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use base64::Engine as _;
use futures_util::future::BoxFuture;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, Instrument};

use super::types::ImageDiagnostics;
use super::EstimationError;
use crate::config::{EstimatorConfig, RemoteEndpoint};

/// System instruction for the expiry estimation request.
const ESTIMATE_SYSTEM_PROMPT: &str = "You return expiry estimates in integer days.";

/// First signed integer substring in free text. Fixed, literal contract:
/// the remote answer is expected to be a bare number of days, and prose
/// around it is tolerated rather than interpreted.
static FIRST_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());

// ──────────────────────────────────────────────
// Request payload
// ──────────────────────────────────────────────

/// Chat-completions request body sent to the remote endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One element of a multi-modal user message.
///
/// Exactly one payload field is set per part; the rest are skipped during
/// serialization. Image parts exist in three shapes because endpoints
/// differ in which input encodings they accept.
#[derive(Debug, Serialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ContentPart {
    pub fn text(text: String) -> Self {
        Self {
            kind: "text",
            text: Some(text),
            image_url: None,
            image_base64: None,
            image: None,
        }
    }

    /// Image by reference.
    pub fn image_url(url: &str) -> Self {
        Self {
            kind: "input_image",
            text: None,
            image_url: Some(url.to_string()),
            image_base64: None,
            image: None,
        }
    }

    /// Image by value, under the `image_base64` key.
    pub fn image_base64(encoded: String) -> Self {
        Self {
            kind: "input_image",
            text: None,
            image_url: None,
            image_base64: Some(encoded),
            image: None,
        }
    }

    /// Image by value, under the `image` key (the shape chat attachments
    /// use).
    pub fn image(encoded: String) -> Self {
        Self {
            kind: "input_image",
            text: None,
            image_url: None,
            image_base64: None,
            image: Some(encoded),
        }
    }
}

// ──────────────────────────────────────────────
// Transport
// ──────────────────────────────────────────────

/// Transport for chat-completions requests. Abstracted so both estimation
/// and chat can be exercised without a live endpoint.
pub trait ChatCompleter: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<Value, EstimationError>>;
}

/// Production completer: POSTs to the configured endpoint with bearer auth
/// and a client-level timeout.
pub struct HttpChatCompleter {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpChatCompleter {
    pub fn new(endpoint: &RemoteEndpoint, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            url: endpoint.url.clone(),
            api_key: endpoint.api_key.clone(),
            timeout_secs: timeout.as_secs(),
        }
    }
}

impl ChatCompleter for HttpChatCompleter {
    fn complete<'a>(
        &'a self,
        request: &'a ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<Value, EstimationError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        EstimationError::RemoteInference(format!(
                            "request timed out after {}s",
                            self.timeout_secs
                        ))
                    } else if e.is_connect() {
                        EstimationError::RemoteInference("endpoint unreachable".into())
                    } else {
                        EstimationError::RemoteInference(format!("transport error: {e}"))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(EstimationError::RemoteInference(format!(
                    "endpoint returned status {status}"
                )));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| EstimationError::RemoteInference(format!("invalid JSON response: {e}")))
        })
    }
}

// ──────────────────────────────────────────────
// RemoteEstimator
// ──────────────────────────────────────────────

/// Remote inference adapter.
///
/// Disabled (no transport wired) when no endpoint/credential is configured;
/// then `estimate` returns `Ok(None)` without any network call. Transport
/// failures are errors, not `None`: a broken dependency is reported, not
/// masked as a heuristic answer.
pub struct RemoteEstimator {
    config: Arc<EstimatorConfig>,
    completer: Option<Arc<dyn ChatCompleter>>,
}

impl RemoteEstimator {
    /// Wire an HTTP transport when the endpoint is configured; otherwise
    /// stay disabled.
    pub fn from_config(config: Arc<EstimatorConfig>) -> Self {
        let completer = config.remote.as_ref().map(|endpoint| {
            Arc::new(HttpChatCompleter::new(endpoint, config.remote_timeout))
                as Arc<dyn ChatCompleter>
        });
        Self { config, completer }
    }

    /// Construct with an explicit transport (tests, alternative clients).
    pub fn with_completer(config: Arc<EstimatorConfig>, completer: Arc<dyn ChatCompleter>) -> Self {
        Self {
            config,
            completer: Some(completer),
        }
    }

    /// Ask the remote model for a day-count.
    ///
    /// `Ok(None)` means "no usable answer" (disabled, or the response held
    /// nothing parseable or a non-positive number); the caller falls back
    /// to the heuristic. Any returned value is already in
    /// `[1, max_shelf_life_days]`.
    pub async fn estimate(
        &self,
        image_url: &str,
        image_bytes: &[u8],
        diagnostics: &ImageDiagnostics,
    ) -> Result<Option<u32>, EstimationError> {
        let Some(completer) = &self.completer else {
            debug!("Remote adapter disabled; skipping inference");
            return Ok(None);
        };

        let request = build_estimate_request(
            &self.config.remote_model,
            image_url,
            image_bytes,
            diagnostics,
        );

        let span = tracing::info_span!(
            "remote_estimate",
            model = %self.config.remote_model,
            image_size = image_bytes.len(),
        );
        let payload = completer.complete(&request).instrument(span).await?;
        let extracted = extract_days(&payload);
        debug!(?extracted, "Remote completion parsed");

        Ok(extracted
            .filter(|days| *days > 0)
            .map(|days| clamp_days(days, self.config.max_shelf_life_days)))
    }
}

/// Build the multi-modal estimation request: instruction text with the
/// diagnostics inlined, plus the image by reference and by value.
fn build_estimate_request(
    model: &str,
    image_url: &str,
    image_bytes: &[u8],
    diagnostics: &ImageDiagnostics,
) -> ChatCompletionRequest {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
    let prompt = format!(
        "You are estimating how soon food should be consumed. \
         If you find a date in the picture, convert it into how many days remain from today. \
         If no date is visible, make a conservative guess based on whether the item looks fresh, canned, or packaged. \
         Brightness: {}, Contrast: {}, Text regions: {}. \
         Answer only with an integer number of days, no extra text.",
        diagnostics.brightness, diagnostics.contrast, diagnostics.text_regions
    );

    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(ESTIMATE_SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::text(prompt),
                    ContentPart::image_url(image_url),
                    ContentPart::image_base64(encoded),
                ]),
            },
        ],
        stream: false,
        temperature: None,
    }
}

/// Pull a day-count out of a loosely structured completion payload.
///
/// Prefers a dedicated top-level `estimated_days` integer; otherwise scans
/// the first choice's message content for the first signed integer
/// substring. `None` when neither yields anything.
fn extract_days(payload: &Value) -> Option<i64> {
    if let Some(days) = payload.get("estimated_days").and_then(Value::as_i64) {
        return Some(days);
    }
    first_choice_content(payload).and_then(first_integer)
}

/// The first choice's message content string, if the payload has one.
pub(crate) fn first_choice_content(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

fn first_integer(text: &str) -> Option<i64> {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Saturate into `[1, max_days]`.
fn clamp_days(days: i64, max_days: u32) -> u32 {
    days.clamp(1, max_days as i64) as u32
}

// ──────────────────────────────────────────────
// Mocks (testing)
// ──────────────────────────────────────────────

/// Mock transport returning a canned payload.
pub struct MockChatCompleter {
    payload: Value,
}

impl MockChatCompleter {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Canned free-text completion in the standard choices shape.
    pub fn with_text(content: &str) -> Self {
        Self::new(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }
}

impl ChatCompleter for MockChatCompleter {
    fn complete<'a>(
        &'a self,
        _request: &'a ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<Value, EstimationError>> {
        Box::pin(async move { Ok(self.payload.clone()) })
    }
}

/// Mock transport that always fails, as a timed-out or refused call would.
pub struct FailingChatCompleter;

impl ChatCompleter for FailingChatCompleter {
    fn complete<'a>(
        &'a self,
        _request: &'a ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<Value, EstimationError>> {
        Box::pin(async move {
            Err(EstimationError::RemoteInference(
                "mock transport failure".into(),
            ))
        })
    }
}
