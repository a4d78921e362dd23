//! Persistence for stores, analyses, optimization history, audits and profiles.
//!
//! ## Tables
//!
//! - `profiles` - API users, token hashes and subscription state
//! - `stores` - Connected Shopify stores (unique per user and domain)
//! - `seo_analyses` - Latest analysis per (store, product), JSONB issues/optimizations
//! - `optimization_history` - Append-only ledger of applied optimizations
//! - `site_audits` - Versioned JSONB audit snapshots
//!
//! Deleting a store cascades to its analyses, history and audits.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shopseo-cli -- migrate
//! ```
//!
//! The repository traits are the seam between services and storage:
//! [`PgRepository`] backs production and [`memory::MemoryRepository`] backs
//! tests and local experiments.

pub mod analyses;
pub mod audits;
pub mod history;
pub mod memory;
pub mod profiles;
pub mod stores;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopseo_core::audit::AuditFindings;
use shopseo_core::seo::{OptimizationField, SeoAnalysisResult};
use shopseo_core::{AuditId, HistoryId, StoreId, UserId};

use crate::models::{
    HistoryRecord, NewHistoryRecord, NewStore, Profile, Store, StoredAnalysis, StoredAudit,
    SubscriptionUpdate,
};

pub use memory::MemoryRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate store or idempotency key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`].
    fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Repository traits
// =============================================================================

/// Connected stores.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Insert a store. Fails with `Conflict` if the user already connected this domain.
    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError>;

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Stores owned by `user_id`, oldest first.
    async fn list_stores(&self, user_id: UserId) -> Result<Vec<Store>, RepositoryError>;

    /// Delete a store owned by `user_id`. Returns `false` if nothing matched.
    async fn delete_store(&self, user_id: UserId, id: StoreId) -> Result<bool, RepositoryError>;
}

/// Latest analysis per product.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Insert or replace the analysis for `(store_id, result.product_id)`.
    async fn upsert_analysis(
        &self,
        store_id: StoreId,
        result: &SeoAnalysisResult,
    ) -> Result<StoredAnalysis, RepositoryError>;

    async fn get_analysis(
        &self,
        store_id: StoreId,
        product_id: i64,
    ) -> Result<Option<StoredAnalysis>, RepositoryError>;

    /// All analyses for a store, lowest score first.
    async fn list_analyses(&self, store_id: StoreId)
    -> Result<Vec<StoredAnalysis>, RepositoryError>;

    /// Set `applied` on the optimization matching `field` and `suggestion`.
    ///
    /// Returns `false` if no stored analysis or optimization matched.
    async fn set_optimization_applied(
        &self,
        store_id: StoreId,
        product_id: i64,
        field: OptimizationField,
        suggestion: &str,
        applied: bool,
    ) -> Result<bool, RepositoryError>;
}

/// Optimization history ledger.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a record. Fails with `Conflict` if an un-reverted record has the same key.
    async fn insert_history(&self, record: NewHistoryRecord)
    -> Result<HistoryRecord, RepositoryError>;

    async fn get_history_record(&self, id: HistoryId)
    -> Result<Option<HistoryRecord>, RepositoryError>;

    /// The un-reverted record carrying `idempotency_key`, if any.
    async fn find_active_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<HistoryRecord>, RepositoryError>;

    /// Records for a store, most recently applied first.
    async fn list_history(&self, store_id: StoreId) -> Result<Vec<HistoryRecord>, RepositoryError>;

    /// Stamp `reverted_at = now()` if the record is not yet reverted.
    ///
    /// Returns `None` when the record does not exist or was already reverted.
    async fn mark_reverted(&self, id: HistoryId) -> Result<Option<HistoryRecord>, RepositoryError>;
}

/// Website audit snapshots.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert_audit(
        &self,
        store_id: StoreId,
        findings: &AuditFindings,
        schema_version: i32,
    ) -> Result<StoredAudit, RepositoryError>;

    /// Audits for a store, newest first.
    async fn list_audits(&self, store_id: StoreId) -> Result<Vec<StoredAudit>, RepositoryError>;

    /// Audits across all stores written with a schema older than `version`.
    async fn list_audits_below_version(
        &self,
        version: i32,
    ) -> Result<Vec<StoredAudit>, RepositoryError>;

    async fn update_audit_payload(
        &self,
        id: AuditId,
        payload: &serde_json::Value,
        schema_version: i32,
    ) -> Result<(), RepositoryError>;
}

/// API users.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a profile. Fails with `Conflict` if the email is taken.
    async fn create_profile(
        &self,
        email: &str,
        api_token_hash: &str,
    ) -> Result<Profile, RepositoryError>;

    async fn find_profile_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> Result<Option<Profile>, RepositoryError>;

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError>;

    async fn find_profile_by_customer(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Returns `false` if the profile does not exist.
    async fn update_subscription(
        &self,
        id: UserId,
        update: &SubscriptionUpdate,
    ) -> Result<bool, RepositoryError>;
}

/// Everything the services need from storage.
#[async_trait]
pub trait Repository:
    StoreRepository + AnalysisRepository + HistoryRepository + AuditRepository + ProfileRepository
{
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL`-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
