// External dependencies
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

// Internal dependencies
use crate::ai::Backend;
use crate::config::settings::ModelConfig;
use crate::config::Credential;
use crate::error::BackendError;

pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

// ============================================================================
// Gemini API Structures
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    status: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    base_url: Url,
    model_name: String,
    temperature: f32,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl GeminiClient {
    /// Builds a client from the `[model]` settings; `GEMINI_BASE_URL`
    /// overrides the configured endpoint.
    pub fn new(model: &ModelConfig) -> Result<Self> {
        let base = std::env::var(BASE_URL_ENV_VAR).unwrap_or_else(|_| model.base_url.clone());
        Self::with_base_url(&base, model)
    }

    pub fn with_base_url(base: &str, model: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(model.request_timeout_secs.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        // Trailing slash so `join` appends instead of replacing the last segment.
        let base_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))
            .with_context(|| format!("Invalid Gemini base URL: {base}"))?;

        Ok(Self {
            client,
            base_url,
            model_name: model.name.trim_start_matches("models/").to_string(),
            temperature: model.temperature,
        })
    }

    fn endpoint(&self, credential: &Credential) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(&format!("models/{}:generateContent", self.model_name))
            .map_err(|e| BackendError::Other(format!("Failed to build request URL: {e}")))?;
        url.query_pairs_mut().append_pair("key", credential.expose());
        Ok(url)
    }
}

#[async_trait]
impl Backend for GeminiClient {
    async fn send(&self, prompt: &str, credential: &Credential) -> Result<String, BackendError> {
        let url = self.endpoint(credential)?;
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!(
            "Sending request to Gemini model {}, prompt length: {}, key {}",
            self.model_name,
            prompt.len(),
            credential
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = extract_api_error(&body);
            warn!("Gemini request failed with {status}: {message}");
            return Err(classify_status(status, message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::Other(format!("Failed to parse Gemini response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .map(|candidate| {
                if let Some(reason) = &candidate.finish_reason {
                    debug!("Finish reason: {reason}");
                }
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!(" (blocked: {r})"))
                .unwrap_or_default();
            return Err(BackendError::Other(format!(
                "Gemini returned no text{reason}"
            )));
        }

        info!("Received {} bytes from Gemini", text.len());
        Ok(text)
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    // Never echo the URL: it carries the key as a query parameter.
    let e = e.without_url();
    if e.is_timeout() || e.is_connect() || e.is_request() {
        BackendError::Unavailable(e.to_string())
    } else {
        BackendError::Other(e.to_string())
    }
}

/// Maps an HTTP failure onto the sub-kind shown to the user.
pub fn classify_status(status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(message),
        // Gemini answers a bad key with 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if message.to_lowercase().contains("api key") => {
            BackendError::Unauthorized(message)
        }
        StatusCode::TOO_MANY_REQUESTS => BackendError::QuotaExceeded(message),
        s if s.is_server_error() => BackendError::Unavailable(message),
        _ => BackendError::Other(message),
    }
}

fn extract_api_error(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Some(ApiError { message, status }),
        }) => {
            let message = message.unwrap_or_else(|| "unknown error".to_string());
            match status {
                Some(status) => format!("{message} (status={status})"),
                None => message,
            }
        }
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}
