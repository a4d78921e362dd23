//! Generated copy with a placeholder fallback.
//!
//! Generation never fails from the caller's point of view: a missing
//! provider, an upstream error or a timeout all produce
//! [`GeneratedContent::Fallback`] whose text starts with [`PLACEHOLDER_MARKER`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use shopseo_core::seo::text::truncate_words;

/// Prefix of every fallback text.
pub const PLACEHOLDER_MARKER: &str = "[Draft placeholder]";

const FALLBACK_PROMPT_EXCERPT: usize = 120;
const DEFAULT_ARTICLE_WORDS: u32 = 800;
const DEFAULT_ARTICLE_TONE: &str = "informative";

/// Errors from generative providers.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error body.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The response held no usable output.
    #[error("empty response")]
    Empty,
}

/// Sampling options for one generation.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// Produces text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ContentError>;
}

/// Produces an image URL from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<String, ContentError>;
}

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedContent {
    Generated {
        success: bool,
        content: String,
    },
    Fallback {
        success: bool,
        error: String,
        #[serde(rename = "fallbackContent")]
        fallback_content: String,
    },
}

impl GeneratedContent {
    fn generated(content: String) -> Self {
        Self::Generated {
            success: true,
            content,
        }
    }

    fn fallback(prompt: &str, error: String) -> Self {
        Self::Fallback {
            success: false,
            error,
            fallback_content: fallback_text(prompt),
        }
    }

    /// The text to show, generated or not.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Generated { content, .. } => content,
            Self::Fallback {
                fallback_content, ..
            } => fallback_content,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Placeholder copy for `prompt`.
#[must_use]
pub fn fallback_text(prompt: &str) -> String {
    format!(
        "{PLACEHOLDER_MARKER} Content generation is unavailable right now. \
         Replace this text before publishing. Topic: {}",
        truncate_words(prompt.trim(), FALLBACK_PROMPT_EXCERPT)
    )
}

/// Parameters for a blog article prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRequest {
    pub keyword: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub word_count: Option<u32>,
}

/// Build a prompt asking for an SEO blog article.
#[must_use]
pub fn article_prompt(request: &ArticleRequest) -> String {
    let tone = request
        .tone
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_ARTICLE_TONE);
    let words = request.word_count.unwrap_or(DEFAULT_ARTICLE_WORDS);

    format!(
        "Write an SEO-optimized blog article of about {words} words about \"{keyword}\".\n\
         Use a {tone} tone. Start with a single H1 title, use H2 subheadings, \
         mention \"{keyword}\" naturally in the first paragraph and in at least one \
         subheading, and end with a short call to action. Return HTML only.",
        keyword = request.keyword.trim(),
    )
}

/// Generates copy through an optional provider with a deadline.
pub struct ContentService<'a> {
    generator: Option<&'a dyn TextGenerator>,
    timeout: Duration,
}

impl<'a> ContentService<'a> {
    #[must_use]
    pub const fn new(generator: Option<&'a dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generate text for `prompt`, falling back to placeholder copy on any failure.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str, options: GenerationOptions) -> GeneratedContent {
        let Some(generator) = self.generator else {
            return GeneratedContent::fallback(
                prompt,
                "content generation is not configured".to_string(),
            );
        };

        match tokio::time::timeout(self.timeout, generator.generate(prompt, options)).await {
            Ok(Ok(content)) if !content.trim().is_empty() => GeneratedContent::generated(content),
            Ok(Ok(_)) => {
                tracing::warn!("Content provider returned empty text");
                GeneratedContent::fallback(prompt, ContentError::Empty.to_string())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Content generation failed");
                GeneratedContent::fallback(prompt, e.to_string())
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Content generation timed out");
                GeneratedContent::fallback(
                    prompt,
                    format!(
                        "content generation timed out after {} seconds",
                        self.timeout.as_secs()
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, ()>);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(
            &self,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<String, ContentError> {
            self.0
                .map(str::to_string)
                .map_err(|()| ContentError::Unauthorized("bad key".to_string()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn generate(
            &self,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<String, ContentError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_generated_text_passes_through() {
        let generator = Fixed(Ok("Fresh copy"));
        let service = ContentService::new(Some(&generator), Duration::from_secs(5));

        let result = service.generate("tees", GenerationOptions::default()).await;
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({ "success": true, "content": "Fresh copy" })
        );
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let generator = Fixed(Err(()));
        let service = ContentService::new(Some(&generator), Duration::from_secs(5));

        let result = service.generate("tees", GenerationOptions::default()).await;
        assert!(result.is_fallback());
        assert!(result.text().starts_with(PLACEHOLDER_MARKER));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["fallbackContent"].as_str().unwrap().contains("tees"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let service = ContentService::new(Some(&Stalled), Duration::from_secs(20));

        let result = service.generate("summer tees", GenerationOptions::default()).await;
        assert!(result.is_fallback());
        assert!(result.text().starts_with(PLACEHOLDER_MARKER));
    }

    #[tokio::test]
    async fn test_missing_provider_falls_back() {
        let service = ContentService::new(None, Duration::from_secs(20));
        let result = service.generate("tees", GenerationOptions::default()).await;
        assert!(result.text().starts_with(PLACEHOLDER_MARKER));
    }

    #[test]
    fn test_article_prompt_defaults() {
        let prompt = article_prompt(&ArticleRequest {
            keyword: " linen shirts ".to_string(),
            tone: None,
            word_count: None,
        });
        assert!(prompt.contains("about 800 words"));
        assert!(prompt.contains("\"linen shirts\""));
        assert!(prompt.contains("informative tone"));
    }
}
