//! Billing webhook handler.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    error::AppError,
    services::{BillingOutcome, ServiceError},
    state::AppState,
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/billing", post(billing_webhook))
}

/// Receive a Stripe event. The body is taken raw so the signature can be checked.
///
/// # Errors
///
/// Returns 400 for a missing or invalid signature and 404 when billing is not
/// configured.
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<BillingOutcome>, AppError> {
    let billing = state
        .billing()
        .ok_or_else(|| ServiceError::NotFound("billing webhook".to_string()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = billing.handle_webhook(signature, &body).await?;
    Ok(Json(outcome))
}
