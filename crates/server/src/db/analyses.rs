//! Analysis queries.
//!
//! Issues and optimizations are stored as JSONB arrays in the shape the API
//! returns them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use shopseo_core::StoreId;
use shopseo_core::seo::{OptimizationField, SeoAnalysisResult, SeoIssue, SeoOptimization};

use super::{AnalysisRepository, PgRepository, RepositoryError};
use crate::models::StoredAnalysis;

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    store_id: StoreId,
    product_id: i64,
    title: String,
    handle: String,
    issues: Json<Vec<SeoIssue>>,
    score: i16,
    optimizations: Json<Vec<SeoOptimization>>,
    analyzed_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for StoredAnalysis {
    type Error = RepositoryError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let score = u8::try_from(row.score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("analysis score out of range: {}", row.score))
            })?;

        Ok(Self {
            store_id: row.store_id,
            result: SeoAnalysisResult {
                product_id: row.product_id,
                title: row.title,
                handle: row.handle,
                issues: row.issues.0,
                score,
                optimizations: row.optimizations.0,
            },
            analyzed_at: row.analyzed_at,
        })
    }
}

const ANALYSIS_COLUMNS: &str =
    "store_id, product_id, title, handle, issues, score, optimizations, analyzed_at";

#[async_trait]
impl AnalysisRepository for PgRepository {
    async fn upsert_analysis(
        &self,
        store_id: StoreId,
        result: &SeoAnalysisResult,
    ) -> Result<StoredAnalysis, RepositoryError> {
        let row = sqlx::query_as::<_, AnalysisRow>(&format!(
            r"
            INSERT INTO seo_analyses
                (store_id, product_id, title, handle, issues, score, optimizations, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (store_id, product_id) DO UPDATE SET
                title = EXCLUDED.title,
                handle = EXCLUDED.handle,
                issues = EXCLUDED.issues,
                score = EXCLUDED.score,
                optimizations = EXCLUDED.optimizations,
                analyzed_at = EXCLUDED.analyzed_at
            RETURNING {ANALYSIS_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(result.product_id)
        .bind(&result.title)
        .bind(&result.handle)
        .bind(Json(&result.issues))
        .bind(i16::from(result.score))
        .bind(Json(&result.optimizations))
        .fetch_one(self.pool())
        .await?;

        row.try_into()
    }

    async fn get_analysis(
        &self,
        store_id: StoreId,
        product_id: i64,
    ) -> Result<Option<StoredAnalysis>, RepositoryError> {
        let row = sqlx::query_as::<_, AnalysisRow>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM seo_analyses WHERE store_id = $1 AND product_id = $2"
        ))
        .bind(store_id)
        .bind(product_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_analyses(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM seo_analyses WHERE store_id = $1 ORDER BY score, product_id"
        ))
        .bind(store_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_optimization_applied(
        &self,
        store_id: StoreId,
        product_id: i64,
        field: OptimizationField,
        suggestion: &str,
        applied: bool,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let current: Option<(Json<Vec<SeoOptimization>>,)> = sqlx::query_as(
            "SELECT optimizations FROM seo_analyses WHERE store_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(store_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((Json(mut optimizations),)) = current else {
            return Ok(false);
        };

        let Some(target) = optimizations
            .iter_mut()
            .find(|o| o.field == field && o.suggestion == suggestion)
        else {
            return Ok(false);
        };
        target.applied = applied;

        sqlx::query(
            "UPDATE seo_analyses SET optimizations = $3 WHERE store_id = $1 AND product_id = $2",
        )
        .bind(store_id)
        .bind(product_id)
        .bind(Json(&optimizations))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
