use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, Metadata};
use crate::patch::Patch;

/// Lifecycle state reported by the server. Transitions happen server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    /// A status this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub price_id: String,
    pub status: SubscriptionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Either `price_id`, or a `plan_key` / `price_key` pair, identifies what to
/// subscribe to. The server rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubscriptionParams {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CreateSubscriptionParams {
    pub fn for_price(customer_id: impl Into<String>, price_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            price_id: Some(price_id.into()),
            ..Self::default()
        }
    }

    pub fn for_plan(
        customer_id: impl Into<String>,
        plan_key: impl Into<String>,
        price_key: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            plan_key: Some(plan_key.into()),
            price_key: Some(price_key.into()),
            ..Self::default()
        }
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSubscriptionParams {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub price_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub quantity: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub metadata: Patch<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSubscriptionsParams {
    pub customer_id: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_round_trips_snake_case() {
        let status: SubscriptionStatus = serde_json::from_value(json!("past_due")).unwrap();
        assert_eq!(status, SubscriptionStatus::PastDue);
        assert_eq!(serde_json::to_value(SubscriptionStatus::Canceled).unwrap(), json!("canceled"));
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let status: SubscriptionStatus = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(status, SubscriptionStatus::Unknown);
    }

    #[test]
    fn canceled_subscription_carries_timestamp() {
        let sub: Subscription = serde_json::from_value(json!({
            "id": "sub_1",
            "customer_id": "cus_1",
            "price_id": "price_1",
            "status": "canceled",
            "started_at": "2026-03-01T00:00:00Z",
            "canceled_at": "2026-04-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!sub.is_active());
        assert!(sub.canceled_at.is_some());
        assert_eq!(sub.quantity, 0);
    }

    #[test]
    fn null_quantity_and_metadata_decode() {
        let sub: Subscription = serde_json::from_value(json!({
            "id": "sub_1",
            "customer_id": "cus_1",
            "price_id": "price_1",
            "status": "active",
            "quantity": null,
            "metadata": null
        }))
        .unwrap();
        assert_eq!(sub.quantity, 0);
        assert!(sub.metadata.is_empty());
    }

    #[test]
    fn plan_key_params_omit_price_id() {
        let body = serde_json::to_value(CreateSubscriptionParams::for_plan("cus_1", "pro", "pro_monthly"))
            .unwrap();
        assert_eq!(
            body,
            json!({"customer_id": "cus_1", "plan_key": "pro", "price_key": "pro_monthly"})
        );
    }
}
