//! Store registry: connecting Shopify stores to a user.

use secrecy::SecretString;
use tracing::instrument;

use shopseo_core::{ShopDomain, StoreId, UserId};

use crate::db::Repository;
use crate::models::{NewStore, Store, StoreCredentials};
use crate::shopify::{ShopifyApi, ShopifyError};

use super::ServiceError;

/// Connects, lists and disconnects stores.
pub struct StoreService<'a> {
    repo: &'a dyn Repository,
    shopify: &'a dyn ShopifyApi,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, shopify: &'a dyn ShopifyApi) -> Self {
        Self { repo, shopify }
    }

    /// Connect a store after verifying its credentials against `shop.json`.
    ///
    /// `store_url` may be a bare shop name, a `*.myshopify.com` host or a full
    /// URL; it is normalized before anything else happens.
    ///
    /// # Errors
    ///
    /// - `Validation` if the URL or token is malformed
    /// - `InvalidCredentials` if Shopify rejects the token
    /// - `RemoteApi` for any other Shopify failure
    /// - `DuplicateState` if the user already connected this store
    #[instrument(skip(self, access_token), fields(user_id = %user_id))]
    pub async fn connect(
        &self,
        user_id: UserId,
        store_url: &str,
        access_token: &str,
    ) -> Result<Store, ServiceError> {
        let domain =
            ShopDomain::parse(store_url).map_err(|e| ServiceError::Validation(e.to_string()))?;
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ServiceError::Validation(
                "access token is required".to_string(),
            ));
        }

        let creds = StoreCredentials {
            domain: domain.clone(),
            access_token: SecretString::from(access_token.to_string()),
        };

        let shop = match self.shopify.get_shop(&creds).await {
            Ok(shop) => shop,
            Err(ShopifyError::Unauthorized(_)) => {
                tracing::warn!(shop = %domain, "Shopify rejected store credentials");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let store = self
            .repo
            .insert_store(NewStore {
                user_id,
                store_url: domain,
                access_token: creds.access_token,
                store_name: Some(shop.name),
                store_owner: shop.shop_owner,
                email: shop.email,
            })
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::DuplicateState(_) => {
                    ServiceError::DuplicateState("store is already connected".to_string())
                }
                other => other,
            })?;

        tracing::info!(store_id = %store.id, shop = %store.store_url, "Store connected");
        Ok(store)
    }

    /// The caller's stores, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Store>, ServiceError> {
        Ok(self.repo.list_stores(user_id).await?)
    }

    /// Remove a store; analyses, history and audits go with it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store does not exist or belongs to someone else.
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn disconnect(&self, user_id: UserId, store_id: StoreId) -> Result<(), ServiceError> {
        if !self.repo.delete_store(user_id, store_id).await? {
            return Err(ServiceError::NotFound(format!("store {store_id}")));
        }
        tracing::info!("Store disconnected");
        Ok(())
    }
}
