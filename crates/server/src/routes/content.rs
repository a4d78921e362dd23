//! Generated copy handler.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::{
    error::AppError,
    middleware::RequireUser,
    services::{ArticleRequest, GeneratedContent, GenerationOptions},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/content", post(generate_content))
}

/// Request for generated copy: a free-form prompt or an article brief.
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub article: Option<ArticleRequest>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl ContentRequest {
    fn prompt(&self) -> Option<String> {
        if let Some(article) = self.article.as_ref().filter(|a| !a.keyword.trim().is_empty()) {
            return Some(crate::services::content::article_prompt(article));
        }
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
    }
}

/// Generate copy. Provider failures come back as placeholder text.
///
/// # Errors
///
/// Returns 400 if neither a prompt nor an article keyword is given.
pub async fn generate_content(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<ContentRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    let prompt = body
        .prompt()
        .ok_or_else(|| AppError::BadRequest("prompt or article keyword is required".to_string()))?;
    Ok(Json(state.content().generate(&prompt, body.options).await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_prefers_article() {
        let body: ContentRequest = serde_json::from_value(serde_json::json!({
            "prompt": "ignored",
            "article": { "keyword": "linen sheets" },
            "temperature": 0.3
        }))
        .unwrap();

        assert!(body.prompt().unwrap().contains("\"linen sheets\""));
        assert_eq!(body.options.temperature, Some(0.3));
    }

    #[test]
    fn test_blank_prompt_is_missing() {
        let body: ContentRequest =
            serde_json::from_value(serde_json::json!({ "prompt": "   " })).unwrap();
        assert!(body.prompt().is_none());
    }
}
