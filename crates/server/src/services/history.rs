//! Optimization history and revert.

use tracing::instrument;

use shopseo_core::{EntityType, HistoryId, StoreId, UserId};

use crate::db::Repository;
use crate::models::HistoryRecord;
use crate::shopify::ShopifyApi;

use super::{ServiceError, owned_store};

/// Reads the ledger and reverts applied optimizations.
pub struct HistoryService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> HistoryService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// History for a store, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store is not the caller's.
    pub async fn list(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<HistoryRecord>, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        Ok(self.repo.list_history(store.id).await?)
    }

    /// Restore the original value in Shopify, then mark the record reverted.
    ///
    /// The matching stored optimization goes back to unapplied so it can be
    /// applied again later.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record is missing or belongs to another user's store
    /// - `DuplicateState` if the record is already reverted
    /// - `RemoteApi` if the Shopify write fails (the record is left untouched)
    #[instrument(skip(self), fields(user_id = %user_id, history_id = %history_id))]
    pub async fn revert(
        &self,
        user_id: UserId,
        history_id: HistoryId,
    ) -> Result<HistoryRecord, ServiceError> {
        let not_found = || ServiceError::NotFound(format!("history record {history_id}"));

        let record = self
            .repo
            .get_history_record(history_id)
            .await?
            .ok_or_else(not_found)?;
        let store = owned_store(self.repo, user_id, record.store_id)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => not_found(),
                other => other,
            })?;

        if record.is_reverted() {
            return Err(already_reverted());
        }

        self.shopify
            .update_field(
                &store.credentials(),
                record.entity_type,
                record.entity_id,
                record.field,
                &record.original_value,
            )
            .await?;

        let reverted = self
            .repo
            .mark_reverted(history_id)
            .await?
            .ok_or_else(already_reverted)?;

        if reverted.entity_type == EntityType::Product {
            if let Err(e) = self
                .repo
                .set_optimization_applied(
                    store.id,
                    reverted.entity_id,
                    reverted.field,
                    &reverted.new_value,
                    false,
                )
                .await
            {
                tracing::error!(error = %e, "Failed to reset stored optimization after revert");
            }
        }

        tracing::info!(entity_id = reverted.entity_id, field = %reverted.field, "Optimization reverted");
        Ok(reverted)
    }
}

fn already_reverted() -> ServiceError {
    ServiceError::DuplicateState("optimization already reverted".to_string())
}
