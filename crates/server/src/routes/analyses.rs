//! SEO analysis handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use shopseo_core::StoreId;

use crate::{
    error::AppError, middleware::RequireUser, models::StoredAnalysis, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/stores/{store_id}/products/{product_id}/analysis",
            post(analyze_product),
        )
        .route("/api/stores/{store_id}/analyses", get(list_analyses))
}

/// Analyze a product and store the result, replacing any earlier one.
///
/// # Errors
///
/// Returns 404 if the store or product does not exist and 502 if Shopify fails.
pub async fn analyze_product(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(StoreId, i64)>,
) -> Result<Json<StoredAnalysis>, AppError> {
    let analysis = state
        .analysis()
        .analyze(user.id, store_id, product_id)
        .await?;
    Ok(Json(analysis))
}

/// Stored analyses for a store.
///
/// # Errors
///
/// Returns 404 if the caller has no such store.
pub async fn list_analyses(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<StoredAnalysis>>, AppError> {
    let analyses = state.analysis().list(user.id, store_id).await?;
    Ok(Json(analyses))
}
