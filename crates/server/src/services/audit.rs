//! Store-wide SEO audits.
//!
//! Audits are stored as versioned JSON. Rows written before the current
//! schema are upgraded with [`upgrade_payload`] and written back once, either
//! the first time they are read or in bulk by [`upgrade_stored_audits`].

use tracing::instrument;

use shopseo_core::audit::{
    AUDIT_SCHEMA_VERSION, AuditFindings, SiteSnapshot, run_audit, upgrade_payload,
};
use shopseo_core::{EntityType, StoreId, UserId};

use crate::db::{AuditRepository, Repository, RepositoryError};
use crate::models::{StoreCredentials, StoredAudit, WebsiteSeoAudit};
use crate::shopify::{ShopifyApi, ShopifyError};

use super::{ServiceError, owned_store};

/// How many products an audit inspects in detail.
pub const AUDIT_PRODUCT_SAMPLE: u32 = 50;

/// Runs and reads website audits.
pub struct AuditService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> AuditService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// Collect a site snapshot, score it and store the result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store is not the caller's, `RemoteApi` if
    /// Shopify fails, or `Database` if the audit cannot be stored.
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn run(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<WebsiteSeoAudit, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;
        let site = self.collect(&store.credentials()).await?;

        let findings = run_audit(&site);
        let stored = self
            .repo
            .insert_audit(store.id, &findings, AUDIT_SCHEMA_VERSION)
            .await?;

        tracing::info!(
            audit_id = %stored.id,
            score = findings.score,
            issues = findings.issues.len(),
            "Website audit stored"
        );
        Ok(decode(stored)?)
    }

    /// Audits for a store, newest first, upgrading old rows on the way.
    ///
    /// A row whose payload cannot be upgraded or decoded is logged and left
    /// out of the result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store is not the caller's, or `Database` if
    /// rows cannot be read or an upgraded row cannot be written back.
    pub async fn history(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<WebsiteSeoAudit>, ServiceError> {
        let store = owned_store(self.repo, user_id, store_id).await?;

        let mut audits = Vec::new();
        for row in self.repo.list_audits(store.id).await? {
            let audit_id = row.id;
            match upgrade_row(self.repo, row).await.and_then(decode) {
                Ok(audit) => audits.push(audit),
                Err(RepositoryError::DataCorruption(reason)) => {
                    tracing::error!(%audit_id, %reason, "Skipping unreadable stored audit");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(audits)
    }

    async fn collect(&self, creds: &StoreCredentials) -> Result<SiteSnapshot, ShopifyError> {
        let shop = self.shopify.get_shop(creds).await?;
        let products_count = self.shopify.count_products(creds).await?;

        let mut products = Vec::new();
        for product in self
            .shopify
            .list_products(creds, 1, AUDIT_PRODUCT_SAMPLE)
            .await?
        {
            let seo = self
                .shopify
                .get_seo_metafields(creds, EntityType::Product, product.id)
                .await?;
            products.push(product.into_snapshot(seo));
        }

        let mut pages = Vec::new();
        for page in self.shopify.list_pages(creds).await? {
            let seo = self
                .shopify
                .get_seo_metafields(creds, EntityType::Page, page.id)
                .await?;
            pages.push(page.into_snapshot(seo));
        }

        let blogs = self.shopify.list_blogs(creds).await?;
        let mut articles_count = 0u64;
        for blog in &blogs {
            articles_count += self.shopify.count_articles(creds, blog.id).await?;
        }

        Ok(SiteSnapshot {
            shop: (&shop).into(),
            pages,
            blogs_count: u32::try_from(blogs.len()).unwrap_or(u32::MAX),
            articles_count: saturating_u32(articles_count),
            products_count: saturating_u32(products_count),
            products,
        })
    }
}

/// Upgrade every stored audit older than the current schema.
///
/// Returns how many rows were rewritten.
///
/// # Errors
///
/// Stops at the first row that cannot be upgraded or written.
pub async fn upgrade_stored_audits<R>(repo: &R) -> Result<usize, ServiceError>
where
    R: AuditRepository + ?Sized,
{
    let rows = repo.list_audits_below_version(AUDIT_SCHEMA_VERSION).await?;
    let mut upgraded = 0;
    for row in rows {
        upgrade_row(repo, row).await?;
        upgraded += 1;
    }
    tracing::info!(upgraded, "Stored audits upgraded");
    Ok(upgraded)
}

async fn upgrade_row<R>(repo: &R, mut row: StoredAudit) -> Result<StoredAudit, RepositoryError>
where
    R: AuditRepository + ?Sized,
{
    if row.schema_version >= AUDIT_SCHEMA_VERSION {
        return Ok(row);
    }

    let changed = upgrade_payload(&mut row.payload, row.schema_version).map_err(|e| {
        RepositoryError::DataCorruption(format!("audit {}: {e}", row.id))
    })?;
    if changed {
        repo.update_audit_payload(row.id, &row.payload, AUDIT_SCHEMA_VERSION)
            .await?;
    }

    tracing::debug!(audit_id = %row.id, from = row.schema_version, "Audit payload upgraded");
    row.schema_version = AUDIT_SCHEMA_VERSION;
    Ok(row)
}

fn decode(row: StoredAudit) -> Result<WebsiteSeoAudit, RepositoryError> {
    let findings: AuditFindings = serde_json::from_value(row.payload)
        .map_err(|e| RepositoryError::DataCorruption(format!("audit {}: {e}", row.id)))?;

    Ok(WebsiteSeoAudit {
        id: row.id,
        store_id: row.store_id,
        created_at: row.created_at,
        score: findings.score,
        issues: findings.issues,
        optimizations: findings.optimizations,
        meta: findings.meta,
        schema_version: row.schema_version,
    })
}

fn saturating_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
