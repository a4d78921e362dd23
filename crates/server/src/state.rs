//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::claude::ClaudeClient;
use crate::config::{BillingConfig, ServerConfig};
use crate::db::Repository;
use crate::openai::OpenAIClient;
use crate::serpapi::{SearchError, SerpApiClient};
use crate::services::{
    AnalysisService, AuditService, BillingService, ContentError, ContentService, HistoryService,
    ImageGenerator, ImageService, OptimizerService, ProductService, ProfileService, SearchService,
    StoreService, TextGenerator,
};
use crate::shopify::{ShopifyApi, ShopifyClient, ShopifyError};

/// Deadline for generated content when no provider config sets one.
const DEFAULT_CONTENT_TIMEOUT: Duration = Duration::from_secs(20);

/// Error building the remote clients.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("content client: {0}")]
    Content(#[from] ContentError),
    #[error("search client: {0}")]
    Search(#[from] SearchError),
}

/// Everything [`AppState`] is assembled from.
///
/// Production code builds this from [`ServerConfig`]; tests fill it with
/// in-memory and fake implementations.
pub struct AppComponents {
    pub repository: Arc<dyn Repository>,
    pub shopify: Arc<dyn ShopifyApi>,
    pub text_generator: Option<Arc<dyn TextGenerator>>,
    pub image_generator: Option<Arc<dyn ImageGenerator>>,
    pub search: Option<SerpApiClient>,
    pub billing: Option<BillingConfig>,
    pub content_timeout: Duration,
}

impl AppComponents {
    /// Components with no optional integrations.
    #[must_use]
    pub fn new(repository: Arc<dyn Repository>, shopify: Arc<dyn ShopifyApi>) -> Self {
        Self {
            repository,
            shopify,
            text_generator: None,
            image_generator: None,
            search: None,
            billing: None,
            content_timeout: DEFAULT_CONTENT_TIMEOUT,
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out per-request
/// services borrowing the shared clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppComponents>,
}

impl AppState {
    #[must_use]
    pub fn new(components: AppComponents) -> Self {
        Self {
            inner: Arc::new(components),
        }
    }

    /// Build production clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(
        config: &ServerConfig,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify)?;

        let mut components = AppComponents::new(repository, Arc::new(shopify));
        if let Some(content) = &config.content {
            components.text_generator = Some(Arc::new(ClaudeClient::new(content)?));
            components.content_timeout = content.timeout;
        }
        if let Some(openai) = &config.openai {
            components.image_generator = Some(Arc::new(OpenAIClient::new(openai)?));
        }
        if let Some(search) = &config.search {
            components.search = Some(SerpApiClient::new(search)?);
        }
        components.billing.clone_from(&config.billing);

        tracing::info!(
            content = components.text_generator.is_some(),
            images = components.image_generator.is_some(),
            search = components.search.is_some(),
            billing = components.billing.is_some(),
            "Integrations configured"
        );
        Ok(Self::new(components))
    }

    #[must_use]
    pub fn repository(&self) -> &dyn Repository {
        self.inner.repository.as_ref()
    }

    fn shopify(&self) -> &dyn ShopifyApi {
        self.inner.shopify.as_ref()
    }

    #[must_use]
    pub fn stores(&self) -> StoreService<'_> {
        StoreService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn analysis(&self) -> AnalysisService<'_> {
        AnalysisService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn optimizer(&self) -> OptimizerService<'_> {
        OptimizerService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn history(&self) -> HistoryService<'_> {
        HistoryService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn audits(&self) -> AuditService<'_> {
        AuditService::new(self.repository(), self.shopify())
    }

    #[must_use]
    pub fn content(&self) -> ContentService<'_> {
        ContentService::new(
            self.inner.text_generator.as_deref(),
            self.inner.content_timeout,
        )
    }

    #[must_use]
    pub fn images(&self) -> ImageService<'_> {
        ImageService::new(self.inner.image_generator.as_deref())
    }

    #[must_use]
    pub fn search(&self) -> SearchService<'_> {
        SearchService::new(self.inner.search.as_ref())
    }

    /// `None` when no webhook secret is configured.
    #[must_use]
    pub fn billing(&self) -> Option<BillingService<'_>> {
        self.inner
            .billing
            .as_ref()
            .map(|config| BillingService::new(self.repository(), config))
    }

    #[must_use]
    pub fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(self.repository())
    }
}
