//! In-memory repository.
//!
//! Mirrors the `PostgreSQL` constraints the services rely on: unique store
//! domain per user, one analysis per product, one un-reverted history record
//! per idempotency key, and cascading store deletion.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use shopseo_core::audit::AuditFindings;
use shopseo_core::seo::{OptimizationField, SeoAnalysisResult};
use shopseo_core::{AuditId, HistoryId, Plan, StoreId, UserId};

use super::{
    AnalysisRepository, AuditRepository, HistoryRepository, ProfileRepository, Repository,
    RepositoryError, StoreRepository,
};
use crate::models::{
    HistoryRecord, NewHistoryRecord, NewStore, Profile, Store, StoredAnalysis, StoredAudit,
    SubscriptionUpdate,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    stores: BTreeMap<StoreId, Store>,
    analyses: BTreeMap<(StoreId, i64), StoredAnalysis>,
    history: BTreeMap<HistoryId, HistoryRecord>,
    audits: BTreeMap<AuditId, StoredAudit>,
    profiles: BTreeMap<UserId, (Profile, String)>,
    stores_offline: bool,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Repository held entirely in process memory.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored payload and version of an audit without upgrading it.
    ///
    /// Lets tests seed rows written by older schema versions.
    pub fn put_raw_audit(&self, audit: StoredAudit) {
        self.tables().audits.insert(audit.id, audit);
    }

    /// Make every store lookup fail as if the connection pool were exhausted.
    pub fn take_stores_offline(&self) {
        self.tables().stores_offline = true;
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn insert_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let mut tables = self.tables();
        let duplicate = tables
            .stores
            .values()
            .any(|s| s.user_id == store.user_id && s.store_url == store.store_url);
        if duplicate {
            return Err(RepositoryError::Conflict("store already exists".to_string()));
        }

        let id = StoreId::new(tables.next_id());
        let created = Store {
            id,
            user_id: store.user_id,
            store_url: store.store_url,
            access_token: store.access_token,
            store_name: store.store_name,
            store_owner: store.store_owner,
            email: store.email,
            created_at: Utc::now(),
        };
        tables.stores.insert(id, created.clone());
        Ok(created)
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables();
        if tables.stores_offline {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(tables.stores.get(&id).cloned())
    }

    async fn list_stores(&self, user_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        Ok(self
            .tables()
            .stores
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_store(&self, user_id: UserId, id: StoreId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        let owned = tables.stores.get(&id).is_some_and(|s| s.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        tables.stores.remove(&id);
        tables.analyses.retain(|(store_id, _), _| *store_id != id);
        tables.history.retain(|_, r| r.store_id != id);
        tables.audits.retain(|_, a| a.store_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AnalysisRepository for MemoryRepository {
    async fn upsert_analysis(
        &self,
        store_id: StoreId,
        result: &SeoAnalysisResult,
    ) -> Result<StoredAnalysis, RepositoryError> {
        let stored = StoredAnalysis {
            store_id,
            result: result.clone(),
            analyzed_at: Utc::now(),
        };
        self.tables()
            .analyses
            .insert((store_id, result.product_id), stored.clone());
        Ok(stored)
    }

    async fn get_analysis(
        &self,
        store_id: StoreId,
        product_id: i64,
    ) -> Result<Option<StoredAnalysis>, RepositoryError> {
        Ok(self.tables().analyses.get(&(store_id, product_id)).cloned())
    }

    async fn list_analyses(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        let mut analyses: Vec<StoredAnalysis> = self
            .tables()
            .analyses
            .values()
            .filter(|a| a.store_id == store_id)
            .cloned()
            .collect();
        analyses.sort_by_key(|a| (a.result.score, a.result.product_id));
        Ok(analyses)
    }

    async fn set_optimization_applied(
        &self,
        store_id: StoreId,
        product_id: i64,
        field: OptimizationField,
        suggestion: &str,
        applied: bool,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables()
            .analyses
            .get_mut(&(store_id, product_id))
            .is_some_and(|a| a.result.set_applied(field, suggestion, applied)))
    }
}

#[async_trait]
impl HistoryRepository for MemoryRepository {
    async fn insert_history(
        &self,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord, RepositoryError> {
        let mut tables = self.tables();
        let active = tables
            .history
            .values()
            .any(|r| r.idempotency_key == record.idempotency_key && r.reverted_at.is_none());
        if active {
            return Err(RepositoryError::Conflict(
                "applied optimization already exists".to_string(),
            ));
        }

        let id = HistoryId::new(tables.next_id());
        let created = HistoryRecord {
            id,
            store_id: record.store_id,
            entity_id: record.entity_id,
            entity_type: record.entity_type,
            field: record.field,
            original_value: record.original_value,
            new_value: record.new_value,
            applied_at: Utc::now(),
            applied_by: record.applied_by,
            optimization_type: record.optimization_type,
            idempotency_key: record.idempotency_key,
            reverted_at: None,
        };
        tables.history.insert(id, created.clone());
        Ok(created)
    }

    async fn get_history_record(
        &self,
        id: HistoryId,
    ) -> Result<Option<HistoryRecord>, RepositoryError> {
        Ok(self.tables().history.get(&id).cloned())
    }

    async fn find_active_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<HistoryRecord>, RepositoryError> {
        Ok(self
            .tables()
            .history
            .values()
            .find(|r| r.idempotency_key == idempotency_key && r.reverted_at.is_none())
            .cloned())
    }

    async fn list_history(&self, store_id: StoreId) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let mut records: Vec<HistoryRecord> = self
            .tables()
            .history
            .values()
            .filter(|r| r.store_id == store_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn mark_reverted(&self, id: HistoryId) -> Result<Option<HistoryRecord>, RepositoryError> {
        let mut tables = self.tables();
        let Some(record) = tables.history.get_mut(&id) else {
            return Ok(None);
        };
        if record.reverted_at.is_some() {
            return Ok(None);
        }
        record.reverted_at = Some(Utc::now());
        Ok(Some(record.clone()))
    }
}

#[async_trait]
impl AuditRepository for MemoryRepository {
    async fn insert_audit(
        &self,
        store_id: StoreId,
        findings: &AuditFindings,
        schema_version: i32,
    ) -> Result<StoredAudit, RepositoryError> {
        let payload = serde_json::to_value(findings)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable audit: {e}")))?;

        let mut tables = self.tables();
        let id = AuditId::new(tables.next_id());
        let stored = StoredAudit {
            id,
            store_id,
            created_at: Utc::now(),
            payload,
            schema_version,
        };
        tables.audits.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_audits(&self, store_id: StoreId) -> Result<Vec<StoredAudit>, RepositoryError> {
        let mut audits: Vec<StoredAudit> = self
            .tables()
            .audits
            .values()
            .filter(|a| a.store_id == store_id)
            .cloned()
            .collect();
        audits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(audits)
    }

    async fn list_audits_below_version(
        &self,
        version: i32,
    ) -> Result<Vec<StoredAudit>, RepositoryError> {
        Ok(self
            .tables()
            .audits
            .values()
            .filter(|a| a.schema_version < version)
            .cloned()
            .collect())
    }

    async fn update_audit_payload(
        &self,
        id: AuditId,
        payload: &serde_json::Value,
        schema_version: i32,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let audit = tables.audits.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        audit.payload = payload.clone();
        audit.schema_version = schema_version;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryRepository {
    async fn create_profile(
        &self,
        email: &str,
        api_token_hash: &str,
    ) -> Result<Profile, RepositoryError> {
        let mut tables = self.tables();
        if tables.profiles.values().any(|(p, _)| p.email == email) {
            return Err(RepositoryError::Conflict("profile already exists".to_string()));
        }

        let id = UserId::new(tables.next_id());
        let profile = Profile {
            id,
            email: email.to_string(),
            plan: Plan::Free,
            subscription_status: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            current_period_end: None,
            created_at: Utc::now(),
        };
        tables
            .profiles
            .insert(id, (profile.clone(), api_token_hash.to_string()));
        Ok(profile)
    }

    async fn find_profile_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .tables()
            .profiles
            .values()
            .find(|(_, hash)| hash == api_token_hash)
            .map(|(p, _)| p.clone()))
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables().profiles.get(&id).map(|(p, _)| p.clone()))
    }

    async fn find_profile_by_customer(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .tables()
            .profiles
            .values()
            .find(|(p, _)| p.stripe_customer_id.as_deref() == Some(stripe_customer_id))
            .map(|(p, _)| p.clone()))
    }

    async fn update_subscription(
        &self,
        id: UserId,
        update: &SubscriptionUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        let Some((profile, _)) = tables.profiles.get_mut(&id) else {
            return Ok(false);
        };
        profile.plan = update.plan;
        profile.subscription_status = Some(update.status);
        profile.stripe_customer_id = Some(update.stripe_customer_id.clone());
        profile.stripe_subscription_id = Some(update.stripe_subscription_id.clone());
        profile.current_period_end = update.current_period_end;
        Ok(true)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use shopseo_core::seo::IssueType;
    use shopseo_core::{EntityType, ShopDomain};

    use super::*;

    fn new_store(user: UserId, url: &str) -> NewStore {
        NewStore {
            user_id: user,
            store_url: ShopDomain::parse(url).unwrap(),
            access_token: SecretString::from("shpat_test"),
            store_name: None,
            store_owner: None,
            email: None,
        }
    }

    fn new_record(store_id: StoreId, key: &str) -> NewHistoryRecord {
        NewHistoryRecord {
            store_id,
            entity_id: 1,
            entity_type: EntityType::Product,
            field: OptimizationField::Title,
            original_value: "Old".to_string(),
            new_value: "New".to_string(),
            applied_by: UserId::new(1),
            optimization_type: IssueType::Title,
            idempotency_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_unique_per_user() {
        let repo = MemoryRepository::new();
        repo.insert_store(new_store(UserId::new(1), "acme")).await.unwrap();

        let dup = repo.insert_store(new_store(UserId::new(1), "acme")).await;
        assert!(matches!(dup, Err(RepositoryError::Conflict(_))));

        // Another user may connect the same shop.
        repo.insert_store(new_store(UserId::new(2), "acme")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let repo = MemoryRepository::new();
        let store = repo.insert_store(new_store(UserId::new(1), "acme")).await.unwrap();
        repo.insert_history(new_record(store.id, "k1")).await.unwrap();

        assert!(!repo.delete_store(UserId::new(2), store.id).await.unwrap());
        assert!(repo.delete_store(UserId::new(1), store.id).await.unwrap());
        assert!(repo.list_history(store.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_key_unique_until_reverted() {
        let repo = MemoryRepository::new();
        let store = repo.insert_store(new_store(UserId::new(1), "acme")).await.unwrap();

        let first = repo.insert_history(new_record(store.id, "k1")).await.unwrap();
        assert!(matches!(
            repo.insert_history(new_record(store.id, "k1")).await,
            Err(RepositoryError::Conflict(_))
        ));

        let reverted = repo.mark_reverted(first.id).await.unwrap().unwrap();
        assert!(reverted.reverted_at.is_some());
        assert_eq!(reverted.original_value, first.original_value);
        assert!(repo.mark_reverted(first.id).await.unwrap().is_none());

        repo.insert_history(new_record(store.id, "k1")).await.unwrap();
    }
}
