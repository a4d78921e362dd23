//! Store queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use shopseo_core::{ShopDomain, StoreId, UserId};

use super::{PgRepository, RepositoryError, StoreRepository};
use crate::models::{NewStore, Store};

/// Internal row type for `PostgreSQL` store queries.
#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    user_id: UserId,
    store_url: String,
    access_token: String,
    store_name: Option<String>,
    store_owner: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let store_url = ShopDomain::parse(&row.store_url).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid store url in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            store_url,
            access_token: SecretString::from(row.access_token),
            store_name: row.store_name,
            store_owner: row.store_owner,
            email: row.email,
            created_at: row.created_at,
        })
    }
}

const STORE_COLUMNS: &str =
    "id, user_id, store_url, access_token, store_name, store_owner, email, created_at";

#[async_trait]
impl StoreRepository for PgRepository {
    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO stores (user_id, store_url, access_token, store_name, store_owner, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(store.user_id)
        .bind(store.store_url.as_str())
        .bind(store.access_token.expose_secret())
        .bind(store.store_name)
        .bind(store.store_owner)
        .bind(store.email)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "store"))?;

        row.try_into()
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_stores(&self, user_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_store(&self, user_id: UserId, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
