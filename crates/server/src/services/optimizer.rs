//! Optimization applier and bulk optimizer.
//!
//! Applying an optimization is a remote write followed by two local writes:
//!
//! 1. `PUT` the new value to Shopify
//! 2. append a history record carrying the idempotency key
//! 3. flag the matching stored optimization as applied
//!
//! A duplicate apply is rejected before step 1, either because an un-reverted
//! history record has the same key or because the stored analysis already
//! marks the optimization applied.
//!
//! The value recorded as `original_value` is what a revert writes back, so it
//! never comes from the caller. It is the original captured by the stored
//! analysis when the change matches one of its optimizations, and otherwise
//! the live value read from Shopify before the write.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopseo_core::seo::{IssueType, OptimizationField, SeoOptimization};
use shopseo_core::{EntityType, StoreId, UserId};

use crate::db::Repository;
use crate::models::{HistoryRecord, NewHistoryRecord, Store, StoreCredentials, idempotency_key};
use crate::shopify::ShopifyApi;

use super::{ServiceError, owned_store};

const fn default_entity_type() -> EntityType {
    EntityType::Product
}

/// One field change to push to Shopify.
///
/// The replaced value is resolved server-side; an `original` sent by the
/// caller is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    #[serde(default = "default_entity_type")]
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub field: OptimizationField,
    pub suggestion: String,
    pub optimization_type: IssueType,
}

/// Outcome for one product in a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkProductResult {
    pub product_id: i64,
    pub title: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOptimizeReport {
    pub total: usize,
    pub results: Vec<BulkProductResult>,
}

/// Applies optimizations to a store.
pub struct OptimizerService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> OptimizerService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// Apply one optimization and record it in the history ledger.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the store is not the caller's
    /// - `Validation` for an empty suggestion or a field the entity cannot take
    /// - `DuplicateState` if the same change is already applied
    /// - `NotFound` if the target entity or image does not exist in Shopify
    /// - `RemoteApi` if reading the current value or the Shopify write fails
    ///   (nothing is recorded)
    pub async fn apply(
        &self,
        user_id: UserId,
        store_id: StoreId,
        request: &ApplyRequest,
    ) -> Result<HistoryRecord, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        self.apply_to_store(&store, user_id, request).await
    }

    #[instrument(
        skip(self, store, request),
        fields(
            store_id = %store.id,
            entity_type = %request.entity_type,
            entity_id = request.entity_id,
            field = %request.field,
        )
    )]
    async fn apply_to_store(
        &self,
        store: &Store,
        user_id: UserId,
        request: &ApplyRequest,
    ) -> Result<HistoryRecord, ServiceError> {
        if request.suggestion.trim().is_empty() {
            return Err(ServiceError::Validation(
                "suggestion must not be empty".to_string(),
            ));
        }

        let key = idempotency_key(
            store.id,
            request.entity_type,
            request.entity_id,
            request.field,
            &request.suggestion,
        );

        if let Some(existing) = self.repo.find_active_by_key(&key).await? {
            return Err(ServiceError::DuplicateState(format!(
                "optimization already applied (history record {})",
                existing.id
            )));
        }

        let stored = self.stored_optimization(store.id, request).await?;
        if stored.as_ref().is_some_and(|o| o.applied) {
            return Err(ServiceError::DuplicateState(
                "optimization already applied".to_string(),
            ));
        }

        let creds = store.credentials();
        let original = match stored {
            Some(optimization) => optimization.original,
            None => {
                self.current_value(&creds, request.entity_type, request.entity_id, request.field)
                    .await?
            }
        };

        self.shopify
            .update_field(
                &creds,
                request.entity_type,
                request.entity_id,
                request.field,
                &request.suggestion,
            )
            .await?;

        let record = self
            .repo
            .insert_history(NewHistoryRecord {
                store_id: store.id,
                entity_id: request.entity_id,
                entity_type: request.entity_type,
                field: request.field,
                original_value: original,
                new_value: request.suggestion.clone(),
                applied_by: user_id,
                optimization_type: request.optimization_type,
                idempotency_key: key,
            })
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    "Shopify field updated but history record was not written"
                );
            })?;

        if request.entity_type == EntityType::Product {
            match self
                .repo
                .set_optimization_applied(
                    store.id,
                    request.entity_id,
                    request.field,
                    &request.suggestion,
                    true,
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => tracing::debug!("No stored optimization matched the applied change"),
                Err(e) => tracing::error!(error = %e, "Failed to flag stored optimization"),
            }
        }

        tracing::info!(history_id = %record.id, "Optimization applied");
        Ok(record)
    }

    /// The optimization in the product's stored analysis that proposes this change.
    async fn stored_optimization(
        &self,
        store_id: StoreId,
        request: &ApplyRequest,
    ) -> Result<Option<SeoOptimization>, ServiceError> {
        if request.entity_type != EntityType::Product {
            return Ok(None);
        }
        Ok(self
            .repo
            .get_analysis(store_id, request.entity_id)
            .await?
            .and_then(|a| a.result.find(request.field, &request.suggestion).cloned()))
    }

    /// Live value of `field` in Shopify. Unset optional fields read as empty.
    async fn current_value(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
        field: OptimizationField,
    ) -> Result<String, ServiceError> {
        let missing = || ServiceError::NotFound(format!("{entity_type} {entity_id}"));

        if let OptimizationField::MetaTitle | OptimizationField::MetaDescription = field {
            let seo = self
                .shopify
                .get_seo_metafields(creds, entity_type, entity_id)
                .await?;
            let value = if field == OptimizationField::MetaTitle {
                seo.title_tag
            } else {
                seo.description_tag
            };
            return Ok(value.unwrap_or_default());
        }

        let value = match entity_type {
            EntityType::Product => {
                let product = self
                    .shopify
                    .get_product(creds, entity_id)
                    .await?
                    .ok_or_else(missing)?;
                match field {
                    OptimizationField::Title => Some(product.title),
                    OptimizationField::Handle => Some(product.handle),
                    OptimizationField::BodyHtml => Some(product.body_html.unwrap_or_default()),
                    OptimizationField::ImageAlt { image_id } => {
                        let image = product
                            .images
                            .into_iter()
                            .find(|i| i.id == image_id)
                            .ok_or_else(|| ServiceError::NotFound(format!("image {image_id}")))?;
                        Some(image.alt.unwrap_or_default())
                    }
                    OptimizationField::MetaTitle | OptimizationField::MetaDescription => None,
                }
            }
            EntityType::Page => {
                let page = self
                    .shopify
                    .list_pages(creds)
                    .await?
                    .into_iter()
                    .find(|p| p.id == entity_id)
                    .ok_or_else(missing)?;
                match field {
                    OptimizationField::Title => Some(page.title),
                    OptimizationField::Handle => Some(page.handle),
                    OptimizationField::BodyHtml => Some(page.body_html.unwrap_or_default()),
                    _ => None,
                }
            }
            EntityType::Blog => {
                let blog = self
                    .shopify
                    .list_blogs(creds)
                    .await?
                    .into_iter()
                    .find(|b| b.id == entity_id)
                    .ok_or_else(missing)?;
                match field {
                    OptimizationField::Title => Some(blog.title),
                    OptimizationField::Handle => Some(blog.handle),
                    _ => None,
                }
            }
        };

        value.ok_or_else(|| {
            ServiceError::Validation(format!("field {field} cannot be updated on a {entity_type}"))
        })
    }

    /// Apply every pending optimization of every analyzed product, one at a time.
    ///
    /// A product succeeds only when all of its pending optimizations apply;
    /// its `error` is the first failure. One product failing never stops the
    /// others.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store is not the caller's, or `Database` if
    /// the analyses cannot be loaded.
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn bulk_optimize(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<BulkOptimizeReport, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        let analyses = self.repo.list_analyses(store.id).await?;

        let mut results = Vec::new();
        for analysis in analyses.iter().filter(|a| a.result.has_pending()) {
            let product = &analysis.result;
            let mut first_error = None;

            for optimization in product.pending() {
                let request = ApplyRequest {
                    entity_type: EntityType::Product,
                    entity_id: product.product_id,
                    field: optimization.field,
                    suggestion: optimization.suggestion.clone(),
                    optimization_type: optimization.optimization_type,
                };

                if let Err(e) = self.apply_to_store(&store, user_id, &request).await {
                    tracing::warn!(
                        product_id = product.product_id,
                        field = %optimization.field,
                        error = %e,
                        "Bulk optimization failed"
                    );
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }

            results.push(BulkProductResult {
                product_id: product.product_id,
                title: product.title.clone(),
                success: first_error.is_none(),
                error: first_error,
            });
        }

        let failed = results.iter().filter(|r| !r.success).count();
        tracing::info!(products = results.len(), failed, "Bulk optimization finished");

        Ok(BulkOptimizeReport {
            total: results.len(),
            results,
        })
    }
}
