//! Optimization history queries.
//!
//! Rows are append-only; the only update is the one-way `reverted_at` stamp,
//! and a trigger in the schema rejects anything else.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shopseo_core::seo::{IssueType, OptimizationField};
use shopseo_core::{EntityType, HistoryId, StoreId, UserId};

use super::{HistoryRepository, PgRepository, RepositoryError};
use crate::models::{HistoryRecord, NewHistoryRecord};

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: HistoryId,
    store_id: StoreId,
    entity_id: i64,
    entity_type: String,
    field: String,
    original_value: String,
    new_value: String,
    applied_at: DateTime<Utc>,
    applied_by: UserId,
    optimization_type: String,
    idempotency_key: String,
    reverted_at: Option<DateTime<Utc>>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = RepositoryError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("history record {}: {e}", row.id))
        };

        let entity_type = row
            .entity_type
            .parse::<EntityType>()
            .map_err(|e| corrupt(&e))?;
        let field = row
            .field
            .parse::<OptimizationField>()
            .map_err(|e| corrupt(&e))?;
        let optimization_type = row
            .optimization_type
            .parse::<IssueType>()
            .map_err(|e| corrupt(&e))?;

        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            entity_id: row.entity_id,
            entity_type,
            field,
            original_value: row.original_value,
            new_value: row.new_value,
            applied_at: row.applied_at,
            applied_by: row.applied_by,
            optimization_type,
            idempotency_key: row.idempotency_key,
            reverted_at: row.reverted_at,
        })
    }
}

const HISTORY_COLUMNS: &str = "id, store_id, entity_id, entity_type, field, original_value, \
     new_value, applied_at, applied_by, optimization_type, idempotency_key, reverted_at";

#[async_trait]
impl HistoryRepository for PgRepository {
    async fn insert_history(
        &self,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord, RepositoryError> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            r"
            INSERT INTO optimization_history (
                store_id, entity_id, entity_type, field, original_value, new_value,
                applied_by, optimization_type, idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {HISTORY_COLUMNS}
            "
        ))
        .bind(record.store_id)
        .bind(record.entity_id)
        .bind(record.entity_type.as_str())
        .bind(record.field.to_string())
        .bind(&record.original_value)
        .bind(&record.new_value)
        .bind(record.applied_by)
        .bind(record.optimization_type.as_str())
        .bind(&record.idempotency_key)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "applied optimization"))?;

        row.try_into()
    }

    async fn get_history_record(
        &self,
        id: HistoryId,
    ) -> Result<Option<HistoryRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM optimization_history WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_active_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<HistoryRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM optimization_history \
             WHERE idempotency_key = $1 AND reverted_at IS NULL"
        ))
        .bind(idempotency_key)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_history(&self, store_id: StoreId) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM optimization_history \
             WHERE store_id = $1 ORDER BY applied_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn mark_reverted(&self, id: HistoryId) -> Result<Option<HistoryRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            "UPDATE optimization_history SET reverted_at = now() \
             WHERE id = $1 AND reverted_at IS NULL RETURNING {HISTORY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
