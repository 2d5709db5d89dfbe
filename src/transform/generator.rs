//! Image generation behind a narrow trait, with one HTTP implementation for an
//! OpenAI-compatible chat-completions gateway that returns images inline.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AiConfig, MissingCredential};
use crate::imaging::{parse_data_url, to_data_url};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Credential(#[from] MissingCredential),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable provider response: {0}")]
    Decode(String),
    #[error("provider response contained no image")]
    NoImage,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        source: &[u8],
        source_mime: &str,
        prompt: &str,
    ) -> Result<GeneratedImage, GeneratorError>;
}

pub struct HttpImageGenerator {
    client: Client,
    endpoint: String,
    config: AiConfig,
}

impl HttpImageGenerator {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    modalities: [&'a str; 2],
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: [ContentPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    images: Vec<ResponseImage>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    image_url: ImageUrl,
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(
        &self,
        source: &[u8],
        source_mime: &str,
        prompt: &str,
    ) -> Result<GeneratedImage, GeneratorError> {
        let api_key = self.config.api_key()?;
        let body = ChatRequest {
            model: &self.config.model,
            modalities: ["image", "text"],
            messages: [ChatMessage {
                role: "user",
                content: [
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: to_data_url(source_mime, source),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let raw = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &raw));
        }
        parse_generated_image(&raw)
    }
}

fn parse_generated_image(raw: &[u8]) -> Result<GeneratedImage, GeneratorError> {
    let parsed: ChatResponse =
        serde_json::from_slice(raw).map_err(|e| GeneratorError::Decode(e.to_string()))?;
    let url = parsed
        .choices
        .into_iter()
        .flat_map(|c| c.message.images)
        .map(|img| img.image_url.url)
        .next()
        .ok_or(GeneratorError::NoImage)?;
    let decoded = parse_data_url(&url).map_err(|e| GeneratorError::Decode(e.to_string()))?;
    Ok(GeneratedImage {
        bytes: Bytes::from(decoded.bytes),
        content_type: decoded.mime,
    })
}

fn map_transport_error(error: reqwest::Error) -> GeneratorError {
    if error.is_timeout() {
        GeneratorError::Timeout(error.to_string())
    } else {
        GeneratorError::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GeneratorError {
    const PREVIEW_CHAR_LIMIT: usize = 200;
    let text = String::from_utf8_lossy(body);
    let preview: String = text.chars().take(PREVIEW_CHAR_LIMIT).collect();
    GeneratorError::Status {
        status: status.as_u16(),
        body: preview,
    }
}
