//! Workflow tests for Shopseo.
//!
//! Tests run against the real services and router with an in-memory
//! repository and a scripted Shopify store, so no database or network is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopseo-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use shopseo_core::EntityType;
use shopseo_core::seo::OptimizationField;
use shopseo_server::db::MemoryRepository;
use shopseo_server::models::{Profile, Store, StoreCredentials};
use shopseo_server::routes;
use shopseo_server::shopify::{
    Blog, Page, Product, ProductImage, SeoMetafields, Shop, ShopifyApi, ShopifyError,
};
use shopseo_server::state::{AppComponents, AppState};

/// A field write received by [`FakeShopify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub field: OptimizationField,
    pub value: String,
}

#[derive(Default)]
struct ShopState {
    products: BTreeMap<i64, Product>,
    pages: Vec<Page>,
    blogs: Vec<(Blog, u64)>,
    seo: HashMap<(EntityType, i64), SeoMetafields>,
    failing_writes: HashSet<i64>,
    listing_down: bool,
    writes: Vec<Write>,
}

/// Scripted Shopify store.
///
/// Writes are applied to the in-memory products so reverts can be observed.
pub struct FakeShopify {
    valid_token: String,
    state: Mutex<ShopState>,
}

impl FakeShopify {
    pub const VALID_TOKEN: &'static str = "shpat_valid";

    #[must_use]
    pub fn new() -> Self {
        Self {
            valid_token: Self::VALID_TOKEN.to_string(),
            state: Mutex::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, product: Product) {
        self.state().products.insert(product.id, product);
    }

    pub fn set_seo(&self, entity_type: EntityType, id: i64, seo: SeoMetafields) {
        self.state().seo.insert((entity_type, id), seo);
    }

    pub fn add_page(&self, page: Page) {
        self.state().pages.push(page);
    }

    pub fn add_blog(&self, blog: Blog, articles: u64) {
        self.state().blogs.push((blog, articles));
    }

    /// Make every write to `entity_id` fail.
    pub fn fail_writes_to(&self, entity_id: i64) {
        self.state().failing_writes.insert(entity_id);
    }

    /// Make product listing fail.
    pub fn take_listing_down(&self) {
        self.state().listing_down = true;
    }

    #[must_use]
    pub fn writes(&self) -> Vec<Write> {
        self.state().writes.clone()
    }

    #[must_use]
    pub fn product(&self, id: i64) -> Option<Product> {
        self.state().products.get(&id).cloned()
    }

    #[must_use]
    pub fn seo(&self, entity_type: EntityType, id: i64) -> SeoMetafields {
        self.state()
            .seo
            .get(&(entity_type, id))
            .cloned()
            .unwrap_or_default()
    }

    fn authorize(&self, creds: &StoreCredentials) -> Result<(), ShopifyError> {
        use secrecy::ExposeSecret;

        if creds.access_token.expose_secret() == self.valid_token {
            Ok(())
        } else {
            Err(ShopifyError::Unauthorized("invalid access token".to_string()))
        }
    }
}

impl Default for FakeShopify {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl ShopifyApi for FakeShopify {
    async fn get_shop(&self, creds: &StoreCredentials) -> Result<Shop, ShopifyError> {
        self.authorize(creds)?;
        Ok(Shop {
            id: 1,
            name: "Acme Outfitters".to_string(),
            email: Some("owner@acme.test".to_string()),
            shop_owner: Some("Robin Reyes".to_string()),
            domain: None,
            myshopify_domain: creds.domain.to_string(),
            password_enabled: false,
        })
    }

    async fn count_products(&self, creds: &StoreCredentials) -> Result<u64, ShopifyError> {
        self.authorize(creds)?;
        Ok(self.state().products.len() as u64)
    }

    async fn list_products(
        &self,
        creds: &StoreCredentials,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Product>, ShopifyError> {
        self.authorize(creds)?;
        let state = self.state();
        if state.listing_down {
            return Err(ShopifyError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        let skip = (page.max(1) as usize - 1) * limit as usize;
        Ok(state
            .products
            .values()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_product(
        &self,
        creds: &StoreCredentials,
        product_id: i64,
    ) -> Result<Option<Product>, ShopifyError> {
        self.authorize(creds)?;
        Ok(self.product(product_id))
    }

    async fn get_seo_metafields(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<SeoMetafields, ShopifyError> {
        self.authorize(creds)?;
        Ok(self.seo(entity_type, entity_id))
    }

    async fn update_field(
        &self,
        creds: &StoreCredentials,
        entity_type: EntityType,
        entity_id: i64,
        field: OptimizationField,
        value: &str,
    ) -> Result<(), ShopifyError> {
        self.authorize(creds)?;
        let mut state = self.state();
        if state.failing_writes.contains(&entity_id) {
            return Err(ShopifyError::Api {
                status: 422,
                message: "Unprocessable Entity".to_string(),
            });
        }

        match field {
            OptimizationField::MetaTitle => {
                state.seo.entry((entity_type, entity_id)).or_default().title_tag = non_empty(value);
            }
            OptimizationField::MetaDescription => {
                state
                    .seo
                    .entry((entity_type, entity_id))
                    .or_default()
                    .description_tag = non_empty(value);
            }
            _ if entity_type == EntityType::Product => {
                let product = state
                    .products
                    .get_mut(&entity_id)
                    .ok_or_else(|| ShopifyError::NotFound(format!("products/{entity_id}")))?;
                match field {
                    OptimizationField::Title => product.title = value.to_string(),
                    OptimizationField::Handle => product.handle = value.to_string(),
                    OptimizationField::BodyHtml => product.body_html = non_empty(value),
                    OptimizationField::ImageAlt { image_id } => {
                        let image = product
                            .images
                            .iter_mut()
                            .find(|i| i.id == image_id)
                            .ok_or_else(|| ShopifyError::NotFound(format!("images/{image_id}")))?;
                        image.alt = non_empty(value);
                    }
                    OptimizationField::MetaTitle | OptimizationField::MetaDescription => {}
                }
            }
            _ => {}
        }

        state.writes.push(Write {
            entity_type,
            entity_id,
            field,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn list_pages(&self, creds: &StoreCredentials) -> Result<Vec<Page>, ShopifyError> {
        self.authorize(creds)?;
        Ok(self.state().pages.clone())
    }

    async fn list_blogs(&self, creds: &StoreCredentials) -> Result<Vec<Blog>, ShopifyError> {
        self.authorize(creds)?;
        Ok(self.state().blogs.iter().map(|(b, _)| b.clone()).collect())
    }

    async fn count_articles(
        &self,
        creds: &StoreCredentials,
        blog_id: i64,
    ) -> Result<u64, ShopifyError> {
        self.authorize(creds)?;
        Ok(self
            .state()
            .blogs
            .iter()
            .find(|(b, _)| b.id == blog_id)
            .map_or(0, |(_, n)| *n))
    }
}

/// A product with healthy copy and one image without alt text.
#[must_use]
pub fn product(id: i64, title: &str) -> Product {
    let body = "Soft organic cotton, cut for an easy fit and built to last. ".repeat(20);
    Product {
        id,
        title: title.to_string(),
        handle: title.to_lowercase().replace(' ', "-"),
        body_html: Some(format!("<p>{body}</p>")),
        product_type: "Shirts".to_string(),
        vendor: "Acme".to_string(),
        status: Some("active".to_string()),
        images: vec![ProductImage {
            id: id * 10,
            position: 1,
            src: format!("https://cdn.shopify.test/{id}.jpg"),
            alt: None,
        }],
        created_at: None,
        updated_at: None,
    }
}

/// Services, router and a signed-in user over fakes.
pub struct TestApp {
    pub repo: Arc<MemoryRepository>,
    pub shopify: Arc<FakeShopify>,
    pub state: AppState,
    pub user: Profile,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(|_| {}).await
    }

    /// Build with extra integrations set on the components.
    pub async fn with(configure: impl FnOnce(&mut AppComponents)) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let shopify = Arc::new(FakeShopify::new());

        let mut components = AppComponents::new(repo.clone(), shopify.clone());
        configure(&mut components);
        let state = AppState::new(components);

        let created = state
            .profiles()
            .create_user("owner@acme.test")
            .await
            .unwrap();

        Self {
            repo,
            shopify,
            state,
            user: created.profile,
            token: created.token,
        }
    }

    /// Connect `acme.myshopify.com` with the valid token.
    pub async fn connect_store(&self) -> Store {
        self.state
            .stores()
            .connect(self.user.id, "acme", FakeShopify::VALID_TOKEN)
            .await
            .unwrap()
    }

    /// Send an authenticated JSON request through the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        send(&self.state, builder.body(body).unwrap()).await
    }
}

/// Send any request through the router and decode the JSON body.
///
/// Non-JSON bodies come back as a JSON string.
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = routes::app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}
