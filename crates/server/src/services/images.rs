//! Generated images with a placeholder fallback.

use serde::Serialize;
use tracing::instrument;

use super::content::ImageGenerator;

const PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/1024x1024";

/// Result of an image request. `fallback` is set when `image_url` is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub success: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Placeholder image URL labelled with `prompt`.
#[must_use]
pub fn placeholder_url(prompt: &str) -> String {
    format!(
        "{PLACEHOLDER_IMAGE_BASE}?text={}",
        urlencoding::encode(prompt.trim())
    )
}

/// Generates images through an optional provider.
pub struct ImageService<'a> {
    generator: Option<&'a dyn ImageGenerator>,
}

impl<'a> ImageService<'a> {
    #[must_use]
    pub const fn new(generator: Option<&'a dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    /// Generate an image, falling back to a placeholder URL on any failure.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> GeneratedImage {
        let result = match self.generator {
            Some(generator) => generator.generate_image(prompt).await.map_err(|e| {
                tracing::warn!(error = %e, "Image generation failed");
                e.to_string()
            }),
            None => Err("image generation is not configured".to_string()),
        };

        match result {
            Ok(image_url) => GeneratedImage {
                success: true,
                image_url,
                fallback: false,
                error: None,
            },
            Err(error) => GeneratedImage {
                success: false,
                image_url: placeholder_url(prompt),
                fallback: true,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_url_encodes_prompt() {
        assert_eq!(
            placeholder_url("red & blue tee"),
            "https://placehold.co/1024x1024?text=red%20%26%20blue%20tee"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_provider_uses_placeholder() {
        let image = ImageService::new(None).generate("summer tee").await;
        assert!(!image.success);
        assert!(image.fallback);
        assert!(image.image_url.starts_with("https://placehold.co/1024x1024?text="));
    }
}
