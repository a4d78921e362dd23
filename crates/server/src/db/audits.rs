//! Website audit queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use shopseo_core::audit::AuditFindings;
use shopseo_core::{AuditId, StoreId};

use super::{AuditRepository, PgRepository, RepositoryError};
use crate::models::StoredAudit;

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: AuditId,
    store_id: StoreId,
    created_at: DateTime<Utc>,
    payload: Json<serde_json::Value>,
    schema_version: i32,
}

impl From<AuditRow> for StoredAudit {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            created_at: row.created_at,
            payload: row.payload.0,
            schema_version: row.schema_version,
        }
    }
}

const AUDIT_COLUMNS: &str = "id, store_id, created_at, payload, schema_version";

#[async_trait]
impl AuditRepository for PgRepository {
    async fn insert_audit(
        &self,
        store_id: StoreId,
        findings: &AuditFindings,
        schema_version: i32,
    ) -> Result<StoredAudit, RepositoryError> {
        let payload = serde_json::to_value(findings)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable audit: {e}")))?;

        let row = sqlx::query_as::<_, AuditRow>(&format!(
            r"
            INSERT INTO site_audits (store_id, score, payload, schema_version)
            VALUES ($1, $2, $3, $4)
            RETURNING {AUDIT_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(i16::from(findings.score))
        .bind(Json(payload))
        .bind(schema_version)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    async fn list_audits(&self, store_id: StoreId) -> Result<Vec<StoredAudit>, RepositoryError> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM site_audits WHERE store_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_audits_below_version(
        &self,
        version: i32,
    ) -> Result<Vec<StoredAudit>, RepositoryError> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM site_audits WHERE schema_version < $1 ORDER BY id"
        ))
        .bind(version)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_audit_payload(
        &self,
        id: AuditId,
        payload: &serde_json::Value,
        schema_version: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE site_audits SET payload = $2, schema_version = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(Json(payload))
        .bind(schema_version)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
