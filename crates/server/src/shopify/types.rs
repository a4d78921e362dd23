//! Shopify Admin REST resources.
//!
//! Only the fields the SEO workflow reads are modeled; Shopify sends many more
//! and serde ignores them.

use serde::{Deserialize, Serialize};

use shopseo_core::audit::{PageSnapshot, ShopSnapshot};
use shopseo_core::seo::{ImageSnapshot, ProductSnapshot};

// =============================================================================
// Shop
// =============================================================================

/// Store settings from `shop.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shop_owner: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    pub myshopify_domain: String,
    #[serde(default)]
    pub password_enabled: bool,
}

impl From<&Shop> for ShopSnapshot {
    fn from(shop: &Shop) -> Self {
        Self {
            name: shop.name.clone(),
            primary_domain: shop
                .domain
                .clone()
                .unwrap_or_else(|| shop.myshopify_domain.clone()),
            password_enabled: shop.password_enabled,
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A product as listed by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Product {
    /// Combine with the SEO metafields into the analyzer's input.
    #[must_use]
    pub fn into_snapshot(self, seo: SeoMetafields) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            title: self.title,
            handle: self.handle,
            body_html: self.body_html.unwrap_or_default(),
            product_type: self.product_type,
            vendor: self.vendor,
            meta_title: seo.title_tag,
            meta_description: seo.description_tag,
            images: self
                .images
                .into_iter()
                .map(|i| ImageSnapshot {
                    id: i.id,
                    position: i.position,
                    alt: i.alt,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Pages and blogs
// =============================================================================

/// An online-store page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
}

impl Page {
    #[must_use]
    pub fn into_snapshot(self, seo: SeoMetafields) -> PageSnapshot {
        PageSnapshot {
            id: self.id,
            title: self.title,
            handle: self.handle,
            body_html: self.body_html.unwrap_or_default(),
            meta_description: seo.description_tag,
        }
    }
}

/// A blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
}

// =============================================================================
// Metafields
// =============================================================================

/// Namespace Shopify uses for the SEO title and description.
pub const SEO_NAMESPACE: &str = "global";
/// Metafield key holding the SEO title.
pub const TITLE_TAG_KEY: &str = "title_tag";
/// Metafield key holding the SEO description.
pub const DESCRIPTION_TAG_KEY: &str = "description_tag";

/// A metafield attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// SEO title and description of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoMetafields {
    pub title_tag: Option<String>,
    pub description_tag: Option<String>,
}

impl SeoMetafields {
    /// Pick the `global.title_tag` and `global.description_tag` values.
    #[must_use]
    pub fn from_metafields(metafields: &[Metafield]) -> Self {
        let find = |key: &str| {
            metafields
                .iter()
                .find(|m| m.namespace == SEO_NAMESPACE && m.key == key)
                .and_then(|m| m.value.as_ref())
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.trim().is_empty())
        };

        Self {
            title_tag: find(TITLE_TAG_KEY),
            description_tag: find(DESCRIPTION_TAG_KEY),
        }
    }
}

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct ShopEnvelope {
    pub shop: Shop,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductsEnvelope {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PagesEnvelope {
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BlogsEnvelope {
    pub blogs: Vec<Blog>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MetafieldsEnvelope {
    pub metafields: Vec<Metafield>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CountEnvelope {
    pub count: u64,
}
