//! Per-product SEO analysis.

use tracing::instrument;

use shopseo_core::seo::analyze_product;
use shopseo_core::{EntityType, StoreId, UserId};

use crate::db::Repository;
use crate::models::StoredAnalysis;
use crate::shopify::ShopifyApi;

use super::{ServiceError, owned_store};

/// Runs the analyzer against live product data and stores the result.
pub struct AnalysisService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> AnalysisService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// Analyze one product, replacing any earlier analysis of it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the store is not the caller's or the product is gone
    /// - `RemoteApi` if Shopify fails
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn analyze(
        &self,
        user_id: UserId,
        store_id: StoreId,
        product_id: i64,
    ) -> Result<StoredAnalysis, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        let creds = store.credentials();

        let product = self
            .shopify
            .get_product(&creds, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;
        let seo = self
            .shopify
            .get_seo_metafields(&creds, EntityType::Product, product_id)
            .await?;

        let result = analyze_product(&product.into_snapshot(seo));
        let stored = self.repo.upsert_analysis(store.id, &result).await?;

        tracing::info!(
            product_id,
            score = stored.result.score,
            issues = stored.result.issues.len(),
            "Product analyzed"
        );
        Ok(stored)
    }

    /// Stored analyses for a store, worst score first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store is not the caller's.
    pub async fn list(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<StoredAnalysis>, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        Ok(self.repo.list_analyses(store.id).await?)
    }
}
