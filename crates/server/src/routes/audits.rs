//! Website audit handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use shopseo_core::StoreId;

use crate::{
    error::AppError, middleware::RequireUser, models::WebsiteSeoAudit, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/stores/{store_id}/audits",
        get(audit_history).post(run_audit),
    )
}

/// Audit the whole store and keep a snapshot.
///
/// # Errors
///
/// Returns 404 if the caller has no such store and 502 if Shopify fails.
pub async fn run_audit(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<(StatusCode, Json<WebsiteSeoAudit>), AppError> {
    let audit = state.audits().run(user.id, store_id).await?;
    Ok((StatusCode::CREATED, Json(audit)))
}

/// Earlier audits, newest first.
///
/// # Errors
///
/// Returns 404 if the caller has no such store.
pub async fn audit_history(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<WebsiteSeoAudit>>, AppError> {
    let audits = state.audits().history(user.id, store_id).await?;
    Ok(Json(audits))
}
