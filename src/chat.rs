//! Free-form chat with the remote model, optionally grounded on an image.
//!
//! Unlike the estimation path there is no heuristic to fall back to: chat
//! requires the remote endpoint and reports an upstream-dependency error
//! when it is absent or unreachable.

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::config::EstimatorConfig;
use crate::estimator::remote::{
    first_choice_content, ChatCompleter, ChatCompletionRequest, ChatMessage, ContentPart,
    HttpChatCompleter, MessageContent,
};
use crate::estimator::{EstimationError, ImageFetcher};

/// Sampling temperature for conversational replies.
const CHAT_TEMPERATURE: f32 = 0.2;

/// A completed chat exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

/// Chat service over the shared remote transport and image fetcher.
pub struct ChatService {
    config: Arc<EstimatorConfig>,
    completer: Option<Arc<dyn ChatCompleter>>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl ChatService {
    /// Wire an HTTP transport when the endpoint is configured; otherwise
    /// every chat call reports the missing dependency.
    pub fn from_config(config: Arc<EstimatorConfig>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let completer = config.remote.as_ref().map(|endpoint| {
            Arc::new(HttpChatCompleter::new(endpoint, config.remote_timeout))
                as Arc<dyn ChatCompleter>
        });
        Self {
            config,
            completer,
            fetcher,
        }
    }

    /// Construct with an explicit transport (tests, alternative clients).
    pub fn with_completer(
        config: Arc<EstimatorConfig>,
        completer: Arc<dyn ChatCompleter>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            config,
            completer: Some(completer),
            fetcher,
        }
    }

    /// Send a message, optionally attaching the image behind `image_url`.
    ///
    /// Attachment bytes that fail to decode are skipped (the chat proceeds
    /// text-only); a failed download surfaces as an error.
    pub async fn chat(
        &self,
        message: &str,
        image_url: Option<&str>,
    ) -> Result<ChatReply, EstimationError> {
        let Some(completer) = &self.completer else {
            return Err(EstimationError::RemoteInference(
                "no remote endpoint configured".into(),
            ));
        };

        let mut parts = vec![ContentPart::text(message.to_string())];
        if let Some(url) = image_url {
            match self.encode_attachment(url).await? {
                Some(encoded) => parts.push(ContentPart::image(encoded)),
                None => warn!(url, "Attachment is not a decodable image; sending text only"),
            }
        }

        let request = ChatCompletionRequest {
            model: self.config.remote_model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(parts),
            }],
            stream: false,
            temperature: Some(CHAT_TEMPERATURE),
        };

        let payload = completer.complete(&request).await?;
        let reply = first_choice_content(&payload)
            .map(str::to_string)
            .ok_or_else(|| {
                EstimationError::RemoteInference("no choices in completion response".into())
            })?;

        debug!(reply_len = reply.len(), "Chat reply received");
        Ok(ChatReply {
            reply,
            model: self.config.remote_model.clone(),
        })
    }

    /// Download the referenced image and re-encode it as base64 JPEG.
    ///
    /// Normalizing to JPEG keeps attachments in a shape every endpoint
    /// accepts. `Ok(None)` when the bytes do not decode as an image.
    async fn encode_attachment(&self, url: &str) -> Result<Option<String>, EstimationError> {
        let bytes = self.fetcher.fetch(url).await?;

        let Ok(decoded) = image::load_from_memory(&bytes) else {
            return Ok(None);
        };

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let mut cursor = Cursor::new(Vec::new());
        if rgb.write_to(&mut cursor, ImageFormat::Jpeg).is_err() {
            return Ok(None);
        }

        Ok(Some(
            base64::engine::general_purpose::STANDARD.encode(cursor.into_inner()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use image::{Rgb, RgbImage};
    use serde_json::json;

    use super::*;
    use crate::estimator::fetch::MockImageFetcher;
    use crate::estimator::remote::{FailingChatCompleter, MockChatCompleter};

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 16, Rgb([200, 60, 60]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn service(completer: Arc<dyn ChatCompleter>, fetcher: MockImageFetcher) -> ChatService {
        ChatService::with_completer(
            Arc::new(EstimatorConfig::default()),
            completer,
            Arc::new(fetcher),
        )
    }

    #[tokio::test]
    async fn disabled_chat_reports_missing_dependency() {
        let chat = ChatService::from_config(
            Arc::new(EstimatorConfig::default()),
            Arc::new(MockImageFetcher::serving(vec![])),
        );
        let err = chat.chat("hello", None).await.unwrap_err();
        assert!(matches!(err, EstimationError::RemoteInference(_)));
    }

    #[tokio::test]
    async fn text_only_chat_returns_first_choice() {
        let chat = service(
            Arc::new(MockChatCompleter::with_text("Store it in the fridge.")),
            MockImageFetcher::serving(vec![]),
        );
        let reply = chat.chat("how should I store milk?", None).await.unwrap();
        assert_eq!(reply.reply, "Store it in the fridge.");
        assert_eq!(reply.model, "grok-1");
    }

    #[tokio::test]
    async fn missing_choices_is_an_error() {
        let chat = service(
            Arc::new(MockChatCompleter::new(json!({"choices": []}))),
            MockImageFetcher::serving(vec![]),
        );
        let err = chat.chat("hello", None).await.unwrap_err();
        assert!(matches!(err, EstimationError::RemoteInference(_)));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let chat = service(
            Arc::new(FailingChatCompleter),
            MockImageFetcher::serving(vec![]),
        );
        let err = chat.chat("hello", None).await.unwrap_err();
        assert!(matches!(err, EstimationError::RemoteInference(_)));
    }

    #[tokio::test]
    async fn undecodable_attachment_degrades_to_text_only() {
        let chat = service(
            Arc::new(MockChatCompleter::with_text("Looks tasty.")),
            MockImageFetcher::serving(b"definitely not an image".to_vec()),
        );
        let reply = chat
            .chat("what is this?", Some("http://img.example/junk.bin"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "Looks tasty.");
    }

    #[tokio::test]
    async fn attachment_download_failure_propagates() {
        let chat = service(
            Arc::new(MockChatCompleter::with_text("unused")),
            MockImageFetcher::failing_with_status(403),
        );
        let err = chat
            .chat("what is this?", Some("http://img.example/a.png"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EstimationError::DownloadFailed { status: 403 }
        ));
    }

    #[tokio::test]
    async fn valid_attachment_is_reencoded_as_jpeg() {
        let chat = service(
            Arc::new(MockChatCompleter::with_text("unused")),
            MockImageFetcher::serving(png_bytes()),
        );
        let encoded = chat
            .encode_attachment("http://img.example/a.png")
            .await
            .unwrap()
            .unwrap();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        // JPEG magic bytes.
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }
}
