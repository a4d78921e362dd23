//! Generated copy, images and search with and without providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::json;

use shopseo_integration_tests::TestApp;
use shopseo_server::services::{
    ContentError, GenerationOptions, ImageGenerator, PLACEHOLDER_MARKER, TextGenerator,
};

/// Answers after `delay`.
struct SlowWriter {
    delay: Duration,
}

#[async_trait]
impl TextGenerator for SlowWriter {
    async fn generate(
        &self,
        prompt: &str,
        _options: GenerationOptions,
    ) -> Result<String, ContentError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("Copy about {prompt}"))
    }
}

struct BrokenPainter;

#[async_trait]
impl ImageGenerator for BrokenPainter {
    async fn generate_image(&self, _prompt: &str) -> Result<String, ContentError> {
        Err(ContentError::RateLimited(30))
    }
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_generation_falls_back() {
    let app = TestApp::with(|c| {
        c.text_generator = Some(Arc::new(SlowWriter {
            delay: Duration::from_secs(60),
        }));
        c.content_timeout = Duration::from_secs(5);
    })
    .await;

    let content = app
        .state
        .content()
        .generate("linen bedding", GenerationOptions::default())
        .await;

    assert!(content.is_fallback());
    assert!(content.text().starts_with(PLACEHOLDER_MARKER));
}

#[tokio::test(start_paused = true)]
async fn test_generation_within_deadline_succeeds() {
    let app = TestApp::with(|c| {
        c.text_generator = Some(Arc::new(SlowWriter {
            delay: Duration::from_secs(1),
        }));
    })
    .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/content",
            Some(json!({ "prompt": "linen bedding", "temperature": 0.4 })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "content": "Copy about linen bedding" }));
}

#[tokio::test]
async fn test_unconfigured_content_returns_placeholder_over_http() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/content",
            Some(json!({ "article": { "keyword": "wool socks", "tone": "playful" } })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(
        body["fallbackContent"]
            .as_str()
            .unwrap()
            .starts_with(PLACEHOLDER_MARKER)
    );

    let (status, _) = app
        .request(Method::POST, "/api/content", Some(json!({ "prompt": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_image_falls_back_to_placeholder() {
    let app = TestApp::with(|c| c.image_generator = Some(Arc::new(BrokenPainter))).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/images",
            Some(json!({ "prompt": "blue mug on oak" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["fallback"], true);
    assert_eq!(
        body["imageUrl"],
        "https://placehold.co/1024x1024?text=blue%20mug%20on%20oak"
    );
    assert!(body.get("image_url").is_none());
}

#[tokio::test]
async fn test_unconfigured_search_is_bad_gateway() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/api/search", Some(json!({ "keyword": "wool socks" })))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request(Method::POST, "/api/search", Some(json!({ "keyword": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
