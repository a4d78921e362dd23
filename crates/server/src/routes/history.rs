//! Optimization history handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use shopseo_core::{HistoryId, StoreId};

use crate::{
    error::AppError, middleware::RequireUser, models::HistoryRecord, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores/{store_id}/history", get(list_history))
        .route("/api/history/{history_id}/revert", post(revert))
}

/// Applied changes for a store, newest first.
///
/// # Errors
///
/// Returns 404 if the caller has no such store.
pub async fn list_history(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let records = state.history().list(user.id, store_id).await?;
    Ok(Json(records))
}

/// Restore the original value of a change.
///
/// # Errors
///
/// Returns 404 for an unknown record, 409 if it was already reverted and 502
/// if Shopify rejects the write.
pub async fn revert(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(history_id): Path<HistoryId>,
) -> Result<Json<HistoryRecord>, AppError> {
    let record = state.history().revert(user.id, history_id).await?;
    Ok(Json(record))
}
