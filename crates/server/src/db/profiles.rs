//! Profile queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shopseo_core::{Plan, SubscriptionStatus, UserId};

use super::{PgRepository, ProfileRepository, RepositoryError};
use crate::models::{Profile, SubscriptionUpdate};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: UserId,
    email: String,
    plan: String,
    subscription_status: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    current_period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let plan = row
            .plan
            .parse::<Plan>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let subscription_status = row
            .subscription_status
            .as_deref()
            .map(str::parse::<SubscriptionStatus>)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: row.id,
            email: row.email,
            plan,
            subscription_status,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            current_period_end: row.current_period_end,
            created_at: row.created_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, email, plan, subscription_status, stripe_customer_id, \
     stripe_subscription_id, current_period_end, created_at";

#[async_trait]
impl ProfileRepository for PgRepository {
    async fn create_profile(
        &self,
        email: &str,
        api_token_hash: &str,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (email, api_token_hash) VALUES ($1, $2) RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(email)
        .bind(api_token_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "profile"))?;

        row.try_into()
    }

    async fn find_profile_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE api_token_hash = $1"
        ))
        .bind(api_token_hash)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_profile_by_customer(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE stripe_customer_id = $1"
        ))
        .bind(stripe_customer_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_subscription(
        &self,
        id: UserId,
        update: &SubscriptionUpdate,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profiles SET
                plan = $2,
                subscription_status = $3,
                stripe_customer_id = $4,
                stripe_subscription_id = $5,
                current_period_end = $6,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.plan.as_str())
        .bind(update.status.as_str())
        .bind(&update.stripe_customer_id)
        .bind(&update.stripe_subscription_id)
        .bind(update.current_period_end)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
