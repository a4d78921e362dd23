//! Shopify Admin REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use tracing::instrument;

use shopseo_core::EntityType;
use shopseo_core::seo::OptimizationField;

use crate::config::ShopifyConfig;
use crate::models::StoreCredentials;

use super::types::{
    Blog, BlogsEnvelope, CountEnvelope, MetafieldsEnvelope, Page, PagesEnvelope, Product,
    ProductEnvelope, ProductsEnvelope, SEO_NAMESPACE, SeoMetafields, Shop, ShopEnvelope,
};
use super::{ShopifyApi, ShopifyError};

/// Largest page Shopify will return.
pub const MAX_PAGE_SIZE: u32 = 250;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;
const MAX_ERROR_BODY: usize = 500;

/// Shopify Admin REST client.
///
/// Holds no credentials itself; every method takes the store's
/// [`StoreCredentials`].
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_version: String,
    /// Overrides `https://{shop}` (used against mock servers).
    base_url: Option<String>,
}

/// A write to perform against the REST API.
#[derive(Debug, PartialEq)]
struct WriteRequest {
    path: String,
    body: serde_json::Value,
}

impl ShopifyClient {
    /// Create a client that talks to `https://{shop}.myshopify.com`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::build(config, None)
    }

    /// Create a client that sends every request to `base_url` instead of the shop's domain.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(config: &ShopifyConfig, base_url: &str) -> Result<Self, ShopifyError> {
        Self::build(config, Some(base_url.trim_end_matches('/').to_string()))
    }

    fn build(config: &ShopifyConfig, base_url: Option<String>) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, "application/json".parse().map_err(|_| {
            ShopifyError::Parse("invalid accept header".to_string())
        })?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                api_version: config.api_version.clone(),
                base_url,
            }),
        })
    }

    fn endpoint(&self, creds: &StoreCredentials, path: &str) -> String {
        let base = self
            .inner
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", creds.domain));
        format!("{base}/admin/api/{}/{path}", self.inner.api_version)
    }

    // =========================================================================
    // Request execution
    // =========================================================================

    async fn send(
        &self,
        creds: &StoreCredentials,
        request: RequestBuilder,
    ) -> Result<Response, ShopifyError> {
        let response = request
            .header(ACCESS_TOKEN_HEADER, creds.access_token.expose_secret())
            .send()
            .await?;

        check_status(response).await
    }

    /// GET a JSON body, returning it with the `rel="next"` link if present.
    async fn get_page<T: DeserializeOwned>(
        &self,
        creds: &StoreCredentials,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(T, Option<String>), ShopifyError> {
        let request = self.inner.client.get(self.endpoint(creds, path)).query(query);
        let response = self.send(creds, request).await?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let text = response.text().await?;
        let body = serde_json::from_str(&text).map_err(|e| ShopifyError::Parse(e.to_string()))?;
        Ok((body, next))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        creds: &StoreCredentials,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ShopifyError> {
        self.get_page(creds, path, query).await.map(|(body, _)| body)
    }
}

#[async_trait]
impl ShopifyApi for ShopifyClient {
    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn get_shop(&self, creds: &StoreCredentials) -> Result<Shop, ShopifyError> {
        let envelope: ShopEnvelope = self.get_json(creds, "shop.json", &[]).await?;
        Ok(envelope.shop)
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn count_products(&self, creds: &StoreCredentials) -> Result<u64, ShopifyError> {
        let envelope: CountEnvelope = self.get_json(creds, "products/count.json", &[]).await?;
        Ok(envelope.count)
    }

    /// Shopify only offers cursor paging, so page `n` is reached by walking
    /// `n - 1` cursors with an id-only projection first.
    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn list_products(
        &self,
        creds: &StoreCredentials,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Product>, ShopifyError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);

        let mut page_info: Option<String> = None;
        for _ in 1..page {
            let mut query = vec![("limit", limit.to_string()), ("fields", "id".to_string())];
            if let Some(cursor) = &page_info {
                query.push(("page_info", cursor.clone()));
            }

            let (_, next) = self
                .get_page::<IgnoredAny>(creds, "products.json", &query)
                .await?;

            match next.as_deref().and_then(page_info_param) {
                Some(cursor) => page_info = Some(cursor),
                None => return Ok(Vec::new()),
            }
        }

        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = page_info {
            query.push(("page_info", cursor));
        }
        let envelope: ProductsEnvelope = self.get_json(creds, "products.json", &query).await?;
        Ok(envelope.products)
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn get_product(
        &self,
        creds: &StoreCredentials,
        product_id: i64,
    ) -> Result<Option<Product>, ShopifyError> {
        match self
            .get_json::<ProductEnvelope>(creds, &format!("products/{product_id}.json"), &[])
            .await
        {
            Ok(envelope) => Ok(Some(envelope.product)),
            Err(ShopifyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn get_seo_metafields(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<SeoMetafields, ShopifyError> {
        let (collection, _) = resource_names(entity_type);
        let envelope: MetafieldsEnvelope = self
            .get_json(
                creds,
                &format!("{collection}/{entity_id}/metafields.json"),
                &[("namespace", SEO_NAMESPACE.to_string())],
            )
            .await?;
        Ok(SeoMetafields::from_metafields(&envelope.metafields))
    }

    #[instrument(skip(self, creds, value), fields(shop = %creds.domain, %field))]
    async fn update_field(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
        field: OptimizationField,
        value: &str,
    ) -> Result<(), ShopifyError> {
        let write = write_request(entity_type, entity_id, field, value)?;
        let request = self
            .inner
            .client
            .put(self.endpoint(creds, &write.path))
            .json(&write.body);

        self.send(creds, request).await?;
        tracing::info!(entity_id, %entity_type, "Shopify field updated");
        Ok(())
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn list_pages(&self, creds: &StoreCredentials) -> Result<Vec<Page>, ShopifyError> {
        let envelope: PagesEnvelope = self
            .get_json(creds, "pages.json", &[("limit", MAX_PAGE_SIZE.to_string())])
            .await?;
        Ok(envelope.pages)
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn list_blogs(&self, creds: &StoreCredentials) -> Result<Vec<Blog>, ShopifyError> {
        let envelope: BlogsEnvelope = self
            .get_json(creds, "blogs.json", &[("limit", MAX_PAGE_SIZE.to_string())])
            .await?;
        Ok(envelope.blogs)
    }

    #[instrument(skip(self, creds), fields(shop = %creds.domain))]
    async fn count_articles(
        &self,
        creds: &StoreCredentials,
        blog_id: i64,
    ) -> Result<u64, ShopifyError> {
        let envelope: CountEnvelope = self
            .get_json(creds, &format!("blogs/{blog_id}/articles/count.json"), &[])
            .await?;
        Ok(envelope.count)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map error statuses to [`ShopifyError`] variants.
async fn check_status(response: Response) -> Result<Response, ShopifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split('.').next())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(ShopifyError::RateLimited(retry_after))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ShopifyError::Unauthorized(
            "Invalid or revoked access token".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(ShopifyError::NotFound(response.url().path().to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = body.chars().take(MAX_ERROR_BODY).collect();
            Err(ShopifyError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// REST collection and singular names for an entity type.
const fn resource_names(entity_type: EntityType) -> (&'static str, &'static str) {
    match entity_type {
        EntityType::Product => ("products", "product"),
        EntityType::Page => ("pages", "page"),
        EntityType::Blog => ("blogs", "blog"),
    }
}

/// Build the PUT that writes `field` on an entity.
fn write_request(
    entity_type: EntityType,
    entity_id: i64,
    field: OptimizationField,
    value: &str,
) -> Result<WriteRequest, ShopifyError> {
    let unsupported = || ShopifyError::UnsupportedField { entity_type, field };

    let attribute = match field {
        OptimizationField::ImageAlt { image_id } => {
            if entity_type != EntityType::Product {
                return Err(unsupported());
            }
            return Ok(WriteRequest {
                path: format!("products/{entity_id}/images/{image_id}.json"),
                body: json!({ "image": { "id": image_id, "alt": value } }),
            });
        }
        OptimizationField::BodyHtml if entity_type == EntityType::Blog => {
            return Err(unsupported());
        }
        OptimizationField::Title => "title",
        OptimizationField::Handle => "handle",
        OptimizationField::BodyHtml => "body_html",
        OptimizationField::MetaTitle => "metafields_global_title_tag",
        OptimizationField::MetaDescription => "metafields_global_description_tag",
    };

    let (collection, singular) = resource_names(entity_type);
    let mut resource = serde_json::Map::new();
    resource.insert("id".to_string(), json!(entity_id));
    resource.insert(attribute.to_string(), json!(value));

    Ok(WriteRequest {
        path: format!("{collection}/{entity_id}.json"),
        body: json!({ singular: resource }),
    })
}

/// Extract the `rel="next"` URL from a `Link` header.
#[must_use]
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

/// The `page_info` cursor carried by a pagination URL.
fn page_info_param(link: &str) -> Option<String> {
    let url = url::Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page_info")
        .map(|(_, v)| v.into_owned())
}
