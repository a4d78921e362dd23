//! Keyword search handler.

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    error::AppError,
    middleware::RequireUser,
    serpapi::{SearchRequest, SearchResults},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/search", post(search))
}

/// Organic results, related questions and autocomplete for a keyword.
///
/// # Errors
///
/// Returns 400 for an empty keyword and 502 if SerpApi fails or is not configured.
pub async fn search(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    let results = state.search().search(&body).await?;
    Ok(Json(results))
}
