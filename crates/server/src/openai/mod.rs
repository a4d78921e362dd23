//! `OpenAI` images API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::OpenAIConfig;
use crate::services::content::{ContentError, ImageGenerator};

const OPENAI_API_URL: &str = "https://api.openai.com";
const IMAGE_MODEL: &str = "dall-e-3";
const IMAGE_SIZE: &str = "1024x1024";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

/// `OpenAI` image generation client.
#[derive(Clone)]
pub struct OpenAIClient {
    inner: Arc<OpenAIClientInner>,
}

struct OpenAIClientInner {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAIClient {
    /// Create a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &OpenAIConfig) -> Result<Self, ContentError> {
        Self::with_base_url(config, OPENAI_API_URL)
    }

    /// Create a client against another base URL.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(config: &OpenAIConfig, base_url: &str) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAIClientInner {
                client,
                api_key: config.api_key.clone(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAIClient {
    #[instrument(skip(self, prompt))]
    async fn generate_image(&self, prompt: &str) -> Result<String, ContentError> {
        let response = self
            .inner
            .client
            .post(format!("{}/v1/images/generations", self.inner.base_url))
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(&ImageRequest {
                model: IMAGE_MODEL,
                prompt,
                n: 1,
                size: IMAGE_SIZE,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ContentError::Unauthorized("Invalid API key".to_string()));
        }
        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(e) => ContentError::Api {
                    error_type: e.error.error_type.unwrap_or_else(|| status.to_string()),
                    message: e.error.message,
                },
                Err(_) => ContentError::Api {
                    error_type: status.to_string(),
                    message: body,
                },
            });
        }

        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| ContentError::Parse(e.to_string()))?;
        parsed
            .data
            .into_iter()
            .find_map(|image| image.url)
            .ok_or(ContentError::Empty)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> OpenAIClient {
        let config = OpenAIConfig {
            api_key: SecretString::from("sk-test-openai"),
        };
        OpenAIClient::with_base_url(&config, &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_image_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(header("authorization", "Bearer sk-test-openai"))
            .and(body_partial_json(json!({ "prompt": "linen shirt on a beach", "size": "1024x1024" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1,
                "data": [{ "url": "https://images.example/abc.png" }]
            })))
            .mount(&server)
            .await;

        let url = client(&server)
            .generate_image("linen shirt on a beach")
            .await
            .unwrap();
        assert_eq!(url, "https://images.example/abc.png");
    }

    #[tokio::test]
    async fn test_policy_rejection_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Your request was rejected", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_image("x").await.unwrap_err();
        assert!(matches!(err, ContentError::Api { ref message, .. } if message == "Your request was rejected"));
    }
}
