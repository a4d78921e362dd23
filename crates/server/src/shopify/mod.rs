//! Shopify Admin REST API access.
//!
//! Every call carries the store's own credentials: the server talks to many
//! stores, each with an access token saved when the store was connected.
//!
//! [`ShopifyApi`] is the seam the services depend on. [`ShopifyClient`] is
//! the production implementation; tests substitute scripted fakes.

mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use shopseo_core::EntityType;
use shopseo_core::seo::OptimizationField;

use crate::models::StoreCredentials;

pub use client::{MAX_PAGE_SIZE, ShopifyClient, parse_next_link};
pub use types::{Blog, Page, Product, ProductImage, SeoMetafields, Shop};

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("Shopify API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or summary.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The field cannot be written on this kind of resource.
    #[error("Field {field} cannot be updated on a {entity_type}")]
    UnsupportedField {
        /// Resource kind.
        entity_type: EntityType,
        /// Requested field.
        field: OptimizationField,
    },
}

/// Shopify Admin operations used by the SEO workflow.
#[async_trait]
pub trait ShopifyApi: Send + Sync {
    /// `GET shop.json`; also used to verify credentials.
    async fn get_shop(&self, creds: &StoreCredentials) -> Result<Shop, ShopifyError>;

    /// `GET products/count.json`.
    async fn count_products(&self, creds: &StoreCredentials) -> Result<u64, ShopifyError>;

    /// One page of products using 1-based offset paging.
    ///
    /// Pages past the end return an empty list.
    async fn list_products(
        &self,
        creds: &StoreCredentials,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Product>, ShopifyError>;

    /// `GET products/{id}.json`; `None` on 404.
    async fn get_product(
        &self,
        creds: &StoreCredentials,
        product_id: i64,
    ) -> Result<Option<Product>, ShopifyError>;

    /// SEO title and description metafields of a product, page or blog.
    async fn get_seo_metafields(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<SeoMetafields, ShopifyError>;

    /// Write one field of a product, page or blog.
    async fn update_field(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
        field: OptimizationField,
        value: &str,
    ) -> Result<(), ShopifyError>;

    async fn list_pages(&self, creds: &StoreCredentials) -> Result<Vec<Page>, ShopifyError>;

    async fn list_blogs(&self, creds: &StoreCredentials) -> Result<Vec<Blog>, ShopifyError>;

    async fn count_articles(
        &self,
        creds: &StoreCredentials,
        blog_id: i64,
    ) -> Result<u64, ShopifyError>;
}
