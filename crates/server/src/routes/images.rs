//! Generated image handler.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::{error::AppError, middleware::RequireUser, services::GeneratedImage, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/images", post(generate_image))
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

/// Generate an image. Provider failures come back as a placeholder URL.
///
/// # Errors
///
/// Returns 400 for an empty prompt.
pub async fn generate_image(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<ImageRequest>,
) -> Result<Json<GeneratedImage>, AppError> {
    if body.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt is required".to_string()));
    }
    Ok(Json(state.images().generate(&body.prompt).await))
}
