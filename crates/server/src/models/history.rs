//! Optimization history ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use shopseo_core::seo::{IssueType, OptimizationField};
use shopseo_core::{EntityType, HistoryId, StoreId, UserId};

/// One applied optimization.
///
/// Append-only: `original_value`, `new_value` and `applied_at` never change
/// after insert. `reverted_at` moves from `None` to a timestamp at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub store_id: StoreId,
    pub entity_id: i64,
    pub entity_type: EntityType,
    pub field: OptimizationField,
    pub original_value: String,
    pub new_value: String,
    pub applied_at: DateTime<Utc>,
    pub applied_by: UserId,
    pub optimization_type: IssueType,
    pub idempotency_key: String,
    pub reverted_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    #[must_use]
    pub const fn is_reverted(&self) -> bool {
        self.reverted_at.is_some()
    }
}

/// Parameters for appending a history record.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub store_id: StoreId,
    pub entity_id: i64,
    pub entity_type: EntityType,
    pub field: OptimizationField,
    pub original_value: String,
    pub new_value: String,
    pub applied_by: UserId,
    pub optimization_type: IssueType,
    pub idempotency_key: String,
}

/// Key identifying "this suggestion on this field of this entity".
///
/// Hex SHA-256 of `store_id|entity_type|entity_id|field|suggestion`.
#[must_use]
pub fn idempotency_key(
    store_id: StoreId,
    entity_type: EntityType,
    entity_id: i64,
    field: OptimizationField,
    suggestion: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{store_id}|{entity_type}|{entity_id}|{field}|{suggestion}").as_bytes());
    hex::encode(hasher.finalize())
}
