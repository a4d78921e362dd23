//! Claude API client for content generation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ContentConfig;
use crate::services::content::{ContentError, GenerationOptions, TextGenerator};

use super::types::{ApiErrorResponse, Message, MessagesRequest, MessagesResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const SYSTEM_PROMPT: &str = "You write concise, accurate e-commerce copy optimized for search \
engines. Never invent product facts that are not in the prompt.";

/// Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Unauthorized` if the API key is not a valid
    /// header value, or `ContentError::Http` if the client cannot be built.
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        Self::with_base_url(config, ANTHROPIC_API_URL)
    }

    /// Create a client against another base URL.
    ///
    /// # Errors
    ///
    /// Same as [`ClaudeClient::new`].
    pub fn with_base_url(config: &ContentConfig, base_url: &str) -> Result<Self, ContentError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
                ContentError::Unauthorized("API key is not a valid header value".to_string())
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        // The caller enforces the deadline; this bound only catches hung connections.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout * 2)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Send one user message and return the full response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, prompt), fields(model = %self.inner.model))]
    pub async fn complete(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<MessagesResponse, ContentError> {
        let request = MessagesRequest {
            model: self.inner.model.clone(),
            max_tokens: options.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![Message::user(prompt)],
            system: Some(SYSTEM_PROMPT.to_string()),
            temperature: options.temperature,
        };

        let response = self
            .inner
            .client
            .post(format!("{}/v1/messages", self.inner.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ContentError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(Self::handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ContentError {
        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ContentError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ContentError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => ContentError::Api {
                    error_type: api_error.error.error_type,
                    message: api_error.error.message,
                },
                Err(_) => ContentError::Api {
                    error_type: "unknown".to_string(),
                    message: body,
                },
            },
            Err(e) => ContentError::Http(e),
        }
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ContentError> {
        let response = self.complete(prompt, options).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ContentError::Empty);
        }
        Ok(text)
    }
}
