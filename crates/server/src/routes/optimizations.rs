//! Optimization handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use shopseo_core::StoreId;

use crate::{
    error::AppError,
    middleware::RequireUser,
    models::HistoryRecord,
    services::{ApplyRequest, BulkOptimizeReport},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores/{store_id}/optimizations", post(apply_optimization))
        .route(
            "/api/stores/{store_id}/optimizations/bulk",
            post(bulk_optimize),
        )
}

/// Push one change to Shopify and record it.
///
/// # Errors
///
/// Returns 409 if the same change is already applied and 502 if the write fails.
pub async fn apply_optimization(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(body): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<HistoryRecord>), AppError> {
    let record = state.optimizer().apply(user.id, store_id, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Apply every pending optimization of every analyzed product.
///
/// # Errors
///
/// Returns 404 if the caller has no such store. Per-product failures are
/// reported in the body.
pub async fn bulk_optimize(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<BulkOptimizeReport>, AppError> {
    let report = state.optimizer().bulk_optimize(user.id, store_id).await?;
    Ok(Json(report))
}
