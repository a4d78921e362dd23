//! Subscription webhook handling.

use serde::Serialize;
use tracing::instrument;

use shopseo_core::{Plan, UserId};

use crate::config::BillingConfig;
use crate::db::Repository;
use crate::models::{Profile, SubscriptionUpdate};
use crate::stripe::{Event, Subscription, verify_signature};

pub use crate::stripe::BillingError;

const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// What a verified event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BillingOutcome {
    /// A profile's subscription was updated.
    Updated { user_id: UserId, plan: Plan },
    /// The event type is not one we act on.
    Ignored { event_type: String },
    /// No profile matches the subscription.
    UnknownCustomer { customer: String },
}

/// Applies subscription events to profiles.
pub struct BillingService<'a> {
    repo: &'a dyn Repository,
    config: &'a BillingConfig,
}

impl<'a> BillingService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository, config: &'a BillingConfig) -> Self {
        Self { repo, config }
    }

    /// Verify and apply one webhook delivery.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` / `InvalidSignature` if the delivery is not authentic
    /// - `Payload` if the body is not a recognizable event
    /// - `Database` if the profile cannot be read or updated
    #[instrument(skip_all)]
    pub async fn handle_webhook(
        &self,
        signature: Option<&str>,
        body: &str,
    ) -> Result<BillingOutcome, BillingError> {
        let signature = signature.ok_or(BillingError::MissingSignature)?;
        verify_signature(
            &self.config.webhook_secret,
            signature,
            body,
            chrono::Utc::now().timestamp(),
        )?;

        let event: Event =
            serde_json::from_str(body).map_err(|e| BillingError::Payload(e.to_string()))?;
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Billing event received");

        let deleted = match event.event_type.as_str() {
            SUBSCRIPTION_CREATED | SUBSCRIPTION_UPDATED => false,
            SUBSCRIPTION_DELETED => true,
            _ => {
                return Ok(BillingOutcome::Ignored {
                    event_type: event.event_type,
                });
            }
        };

        let subscription: Subscription = serde_json::from_value(event.data.object)
            .map_err(|e| BillingError::Payload(e.to_string()))?;
        self.apply(&subscription, deleted).await
    }

    async fn apply(
        &self,
        subscription: &Subscription,
        deleted: bool,
    ) -> Result<BillingOutcome, BillingError> {
        let Some(profile) = self.find_profile(subscription).await? else {
            tracing::warn!(customer = %subscription.customer, "No profile for subscription");
            return Ok(BillingOutcome::UnknownCustomer {
                customer: subscription.customer.clone(),
            });
        };

        let plan = if deleted {
            Plan::Free
        } else {
            self.plan_for(subscription, &profile)
        };

        let update = SubscriptionUpdate {
            plan,
            status: subscription.status,
            stripe_customer_id: subscription.customer.clone(),
            stripe_subscription_id: subscription.id.clone(),
            current_period_end: subscription.period_end(),
        };

        if !self.repo.update_subscription(profile.id, &update).await? {
            return Ok(BillingOutcome::UnknownCustomer {
                customer: subscription.customer.clone(),
            });
        }

        tracing::info!(user_id = %profile.id, %plan, status = %subscription.status, "Subscription updated");
        Ok(BillingOutcome::Updated {
            user_id: profile.id,
            plan,
        })
    }

    /// Match by `metadata.user_id` first, then by customer id.
    async fn find_profile(
        &self,
        subscription: &Subscription,
    ) -> Result<Option<Profile>, BillingError> {
        if let Some(user_id) = subscription
            .metadata
            .get("user_id")
            .and_then(|id| id.parse::<UserId>().ok())
        {
            if let Some(profile) = self.repo.get_profile(user_id).await? {
                return Ok(Some(profile));
            }
        }

        Ok(self
            .repo
            .find_profile_by_customer(&subscription.customer)
            .await?)
    }

    fn plan_for(&self, subscription: &Subscription, profile: &Profile) -> Plan {
        match subscription
            .price_id()
            .and_then(|price| self.config.price_plans.get(price))
        {
            Some(plan) => *plan,
            None => {
                tracing::warn!(
                    price = ?subscription.price_id(),
                    "Unmapped price, keeping current plan"
                );
                profile.plan
            }
        }
    }
}
