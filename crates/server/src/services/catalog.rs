//! Product fetcher.

use serde::Serialize;
use tracing::instrument;

use shopseo_core::{StoreId, UserId};

use crate::db::Repository;
use crate::shopify::{MAX_PAGE_SIZE, Product, ShopifyApi};

use super::{ServiceError, owned_store};

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page of a store's products.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

/// Product listing as returned to clients.
///
/// Shopify failures are reported in-band so a client can keep showing what it
/// already has.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProductPageResult {
    Loaded {
        success: bool,
        #[serde(flatten)]
        page: ProductPage,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl ProductPageResult {
    #[must_use]
    pub const fn loaded(page: ProductPage) -> Self {
        Self::Loaded {
            success: true,
            page,
        }
    }

    #[must_use]
    pub const fn failed(error: String) -> Self {
        Self::Failed {
            success: false,
            error,
        }
    }
}

/// Reads products from a connected store.
pub struct ProductService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// Fetch one page of products with the store's total count.
    ///
    /// `page` is 1-based and raised to 1; `limit` is clamped to 1..=250.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller does not own the store. Shopify
    /// failures come back as [`ProductPageResult::Failed`].
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn fetch_products(
        &self,
        user_id: UserId,
        store_id: StoreId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ProductPageResult, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        let creds = store.credentials();

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let fetched = async {
            let total = self.shopify.count_products(&creds).await?;
            let products = self.shopify.list_products(&creds, page, limit).await?;
            Ok::<_, crate::shopify::ShopifyError>(ProductPage {
                products,
                page,
                limit,
                total,
            })
        }
        .await;

        Ok(match fetched {
            Ok(page) => ProductPageResult::loaded(page),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch products");
                ProductPageResult::failed(e.to_string())
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_result_shapes() {
        let loaded = ProductPageResult::loaded(ProductPage {
            products: Vec::new(),
            page: 2,
            limit: 20,
            total: 45,
        });
        let json = serde_json::to_value(&loaded).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["page"], 2);
        assert_eq!(json["total"], 45);
        assert!(json["products"].as_array().unwrap().is_empty());

        let failed = serde_json::to_value(ProductPageResult::failed("boom".to_string())).unwrap();
        assert_eq!(failed, serde_json::json!({ "success": false, "error": "boom" }));
    }
}
