//! Product listing handler.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use shopseo_core::StoreId;

use crate::{
    error::AppError, middleware::RequireUser, services::ProductPageResult, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stores/{store_id}/products", get(list_products))
}

/// Query parameters for product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of a store's products.
///
/// Shopify failures come back as 200 with `success: false`.
///
/// # Errors
///
/// Returns 404 if the caller has no such store.
pub async fn list_products(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPageResult>, AppError> {
    let result = state
        .products()
        .fetch_products(user.id, store_id, query.page, query.limit)
        .await?;
    Ok(Json(result))
}
