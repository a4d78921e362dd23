//! Stripe event payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use shopseo_core::SubscriptionStatus;

/// A webhook event. `data.object` is decoded per event type.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The subscription object carried by `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub price: Price,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

impl Subscription {
    /// Price of the first subscription item.
    #[must_use]
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }

    /// End of the current period.
    ///
    /// Newer API versions only set it per item.
    #[must_use]
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .or_else(|| self.items.data.first().and_then(|i| i.current_period_end))
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_reads_item_period_end() {
        let sub: Subscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "past_due",
            "items": { "data": [{ "price": { "id": "price_pro" }, "current_period_end": 1_700_000_000 }] }
        }))
        .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.price_id(), Some("price_pro"));
        assert_eq!(sub.period_end().unwrap().timestamp(), 1_700_000_000);
        assert!(sub.metadata.is_empty());
    }
}
