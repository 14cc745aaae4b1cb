//! Score extraction: send the report-card image to a vision model and get
//! its raw text answer back.
//!
//! [`ScoreExtractor`] is the seam the session depends on; tests plug in
//! stubs, production uses [`GeminiExtractor`], which speaks the
//! `generateContent` wire format:
//!
//! ```text
//! POST {base}/v1/models/{model}:generateContent?key=…
//! { "contents": [ { "parts": [ { "inlineData": { "mimeType", "data" } },
//!                              { "text": instruction } ] } ] }
//!
//! 200 → candidates[0].content.parts[0].text
//! ```
//!
//! One request per submission: no retries. A non-success status, a transport
//! error, a timeout, or an undecodable body all fail the submission.

use super::encode::{encode_image, InlineImage};
use super::input::ImageInput;
use crate::config::SgpaConfig;
use crate::error::SgpaError;
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Turns an image into the model's raw text answer.
pub trait ScoreExtractor: Send + Sync {
    fn extract(&self, image: &ImageInput) -> impl Future<Output = Result<String, SgpaError>> + Send;
}

/// Extraction client for the Gemini `generateContent` endpoint.
pub struct GeminiExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    instruction: String,
    timeout_secs: u64,
}

impl GeminiExtractor {
    /// Build a client from the session configuration.
    ///
    /// Fails with [`SgpaError::ProviderNotConfigured`] when no API key is set.
    pub fn from_config(config: &SgpaConfig) -> Result<Self, SgpaError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SgpaError::ProviderNotConfigured {
                hint: "Set GEMINI_API_KEY or pass --api-key.".into(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| SgpaError::Internal(format!("HTTP client: {}", e.without_url())))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/models/{}:generateContent",
                config.api_base_url, config.model
            ),
            api_key,
            instruction: config
                .instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTRACTION_PROMPT.to_string()),
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Request URL without the key.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> SgpaError {
        if e.is_timeout() {
            SgpaError::ApiTimeout {
                secs: self.timeout_secs,
            }
        } else {
            // The URL carries the key; keep it out of messages.
            SgpaError::ExtractionTransport {
                message: e.without_url().to_string(),
            }
        }
    }
}

impl ScoreExtractor for GeminiExtractor {
    async fn extract(&self, image: &ImageInput) -> Result<String, SgpaError> {
        let start = Instant::now();
        let inline = encode_image(image);
        let body = build_request(&inline, &self.instruction);

        info!("Requesting extraction from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .map(|body| error_message(&body))
                .unwrap_or_default();
            warn!("Extraction endpoint answered HTTP {}", status.as_u16());
            return Err(SgpaError::ExtractionStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| SgpaError::ExtractionTransport {
                message: format!("response body is not valid JSON: {e}"),
            })?;

        let generated = parsed.first_text();
        debug!(
            "Extraction returned {} chars in {:?}",
            generated.len(),
            start.elapsed()
        );
        Ok(generated)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Image {
        #[serde(rename = "inlineData")]
        inline_data: &'a InlineImage,
    },
    Text {
        text: &'a str,
    },
}

fn build_request<'a>(image: &'a InlineImage, instruction: &'a str) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![
                RequestPart::Image { inline_data: image },
                RequestPart::Text { text: instruction },
            ],
        }],
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, or empty when any step is
    /// missing. Empty text then fails in the parser.
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Pull `error.message` out of an error body, if there is one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_default()
}
