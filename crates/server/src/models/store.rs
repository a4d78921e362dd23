//! Connected store domain types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use shopseo_core::{ShopDomain, StoreId, UserId};

/// A Shopify store connected by a user.
///
/// The access token never leaves the server: it is skipped during
/// serialization and redacted from `Debug` output.
#[derive(Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub user_id: UserId,
    pub store_url: ShopDomain,
    #[serde(skip)]
    pub access_token: SecretString,
    pub store_name: Option<String>,
    pub store_owner: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("store_url", &self.store_url)
            .field("access_token", &"[REDACTED]")
            .field("store_name", &self.store_name)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Credentials for calling the Shopify Admin API on this store's behalf.
    #[must_use]
    pub fn credentials(&self) -> StoreCredentials {
        StoreCredentials {
            domain: self.store_url.clone(),
            access_token: self.access_token.clone(),
        }
    }
}

/// Domain and token pair handed to the Shopify client per call.
#[derive(Clone)]
pub struct StoreCredentials {
    pub domain: ShopDomain,
    pub access_token: SecretString,
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("domain", &self.domain)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Parameters for inserting a store.
pub struct NewStore {
    pub user_id: UserId,
    pub store_url: ShopDomain,
    pub access_token: SecretString,
    pub store_name: Option<String>,
    pub store_owner: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_hides_access_token() {
        let store = Store {
            id: StoreId::new(1),
            user_id: UserId::new(7),
            store_url: ShopDomain::parse("acme").unwrap(),
            access_token: SecretString::from("shpat_0123456789abcdef"),
            store_name: Some("Acme".to_string()),
            store_owner: None,
            email: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&store).unwrap();
        assert!(json.contains("acme.myshopify.com"));
        assert!(!json.contains("shpat_"));
        assert!(!format!("{store:?}").contains("shpat_"));
        assert!(!format!("{:?}", store.credentials()).contains("shpat_"));
    }
}
