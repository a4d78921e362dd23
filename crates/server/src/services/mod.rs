//! Business logic services.
//!
//! # Services
//!
//! - `registry` - Connect, list and disconnect Shopify stores
//! - `catalog` - Page through a store's products
//! - `analysis` - Run and store per-product SEO analysis
//! - `optimizer` - Apply single and bulk optimizations
//! - `history` - Optimization ledger and revert
//! - `audit` - Store-wide audits and payload upgrades
//! - `content` - Generated copy with placeholder fallback
//! - `images` - Generated images with placeholder fallback
//! - `search` - Search engine results
//! - `billing` - Subscription webhook handling
//! - `profiles` - API users and bearer tokens
//!
//! Services borrow the repository and remote clients from
//! [`AppState`](crate::state::AppState) for the duration of one request.

pub mod analysis;
pub mod audit;
pub mod billing;
pub mod catalog;
pub mod content;
pub mod history;
pub mod images;
pub mod optimizer;
pub mod profiles;
pub mod registry;
pub mod search;

use thiserror::Error;

use shopseo_core::{StoreId, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::Store;
use crate::shopify::ShopifyError;

pub use analysis::AnalysisService;
pub use audit::{AuditService, upgrade_stored_audits};
pub use billing::{BillingError, BillingOutcome, BillingService};
pub use catalog::{ProductPage, ProductPageResult, ProductService};
pub use content::{
    ArticleRequest, ContentError, ContentService, GeneratedContent, GenerationOptions,
    ImageGenerator, PLACEHOLDER_MARKER, TextGenerator,
};
pub use history::HistoryService;
pub use images::{GeneratedImage, ImageService};
pub use optimizer::{ApplyRequest, BulkOptimizeReport, BulkProductResult, OptimizerService};
pub use profiles::{NewUser, ProfileService, generate_token, hash_token};
pub use registry::StoreService;
pub use search::SearchService;

/// Errors surfaced by services to the HTTP and CLI layers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No valid bearer token.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Shopify or another upstream API failed.
    #[error("remote API error: {0}")]
    RemoteApi(String),

    /// Input rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity missing or not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// The requested transition already happened.
    #[error("{0}")]
    DuplicateState(String),

    /// Shopify rejected the access token.
    #[error("invalid store credentials")]
    InvalidCredentials,

    /// Storage failure.
    #[error("database error: {0}")]
    Database(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_string()),
            RepositoryError::Conflict(message) => Self::DuplicateState(message),
            other => Self::Database(other),
        }
    }
}

impl From<ShopifyError> for ServiceError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UnsupportedField { .. } => Self::Validation(err.to_string()),
            other => Self::RemoteApi(other.to_string()),
        }
    }
}

/// Load a store and check that `user_id` owns it.
///
/// Stores owned by someone else are reported as missing.
pub(crate) async fn owned_store(
    repo: &dyn Repository,
    user_id: UserId,
    store_id: StoreId,
) -> Result<Store, ServiceError> {
    repo.get_store(store_id)
        .await?
        .filter(|store| store.user_id == user_id)
        .ok_or_else(|| ServiceError::NotFound(format!("store {store_id}")))
}
