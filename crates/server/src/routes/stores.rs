//! Store connection handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::Deserialize;
use shopseo_core::StoreId;

use super::Ack;
use crate::{error::AppError, middleware::RequireUser, models::Store, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list_stores).post(connect_store))
        .route("/api/stores/{store_id}", delete(disconnect_store))
}

/// Request for connecting a store.
#[derive(Debug, Deserialize)]
pub struct ConnectStoreRequest {
    pub store_url: String,
    pub access_token: String,
}

/// List the caller's stores, oldest first.
///
/// # Errors
///
/// Returns an error if the stores cannot be loaded.
pub async fn list_stores(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Store>>, AppError> {
    let stores = state.stores().list(user.id).await?;
    Ok(Json(stores))
}

/// Verify credentials against Shopify and save the store.
///
/// # Errors
///
/// Returns 400 for a malformed URL, 401 for rejected credentials and 409 if
/// the store is already connected.
pub async fn connect_store(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<ConnectStoreRequest>,
) -> Result<(StatusCode, Json<Store>), AppError> {
    let store = state
        .stores()
        .connect(user.id, &body.store_url, &body.access_token)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// Disconnect a store and everything recorded for it.
///
/// # Errors
///
/// Returns 404 if the caller has no such store.
pub async fn disconnect_store(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Ack>, AppError> {
    state.stores().disconnect(user.id, store_id).await?;
    Ok(Json(Ack::OK))
}
