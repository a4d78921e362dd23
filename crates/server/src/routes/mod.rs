//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                          - Liveness
//! GET    /health/ready                                    - Database check
//!
//! # Stores
//! GET    /api/stores                                      - List connected stores
//! POST   /api/stores                                      - Connect a store
//! DELETE /api/stores/{store_id}                           - Disconnect a store
//!
//! # Products and analysis
//! GET    /api/stores/{store_id}/products?page&limit       - Page of products
//! POST   /api/stores/{store_id}/products/{product_id}/analysis - Analyze one product
//! GET    /api/stores/{store_id}/analyses                  - Stored analyses
//!
//! # Optimizations
//! POST   /api/stores/{store_id}/optimizations             - Apply one change
//! POST   /api/stores/{store_id}/optimizations/bulk        - Apply all pending changes
//! GET    /api/stores/{store_id}/history                   - Applied changes
//! POST   /api/history/{history_id}/revert                 - Undo one change
//!
//! # Audits
//! POST   /api/stores/{store_id}/audits                    - Run a website audit
//! GET    /api/stores/{store_id}/audits                    - Audit history
//!
//! # Generation and research
//! POST   /api/content                                     - Generate copy
//! POST   /api/images                                      - Generate an image
//! POST   /api/search                                      - Search results for a keyword
//!
//! # Billing
//! POST   /webhooks/billing                                - Stripe subscription events
//! ```

use axum::{Router, middleware::from_fn};
use serde::Serialize;

use crate::middleware::security_headers;
use crate::state::AppState;

pub mod analyses;
pub mod audits;
pub mod content;
pub mod health;
pub mod history;
pub mod images;
pub mod optimizations;
pub mod products;
pub mod search;
pub mod stores;
pub mod webhooks;

/// Acknowledgement body for requests with nothing else to return.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Self = Self { success: true };
}

/// Build the full route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(stores::router())
        .merge(products::router())
        .merge(analyses::router())
        .merge(optimizations::router())
        .merge(history::router())
        .merge(audits::router())
        .merge(content::router())
        .merge(images::router())
        .merge(search::router())
        .merge(webhooks::router())
}

/// The application with state and response headers applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(security_headers::middleware))
        .with_state(state)
}
