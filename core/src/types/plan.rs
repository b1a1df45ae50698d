use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    default_true, entitlement::Entitlement, null_as_default, null_as_true,
    price::{BillingInterval, Price},
};
use crate::patch::Patch;

/// A plan groups prices and entitlements under a stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<Price>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub entitlements: Vec<Entitlement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Plan tiers every Tedo account is provisioned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Starter,
        PlanTier::Pro,
        PlanTier::Enterprise,
    ];

    /// Plan key, e.g. `"pro"`.
    pub fn key(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Key of the tier's price for `interval`, e.g. `"pro_monthly"`.
    pub fn price_key(self, interval: BillingInterval) -> String {
        format!("{}_{}", self.key(), interval.adverb())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlanParams {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreatePlanParams {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlanParams {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_active: Patch<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPlansParams {
    pub include_inactive: bool,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tier_keys_are_stable() {
        let keys: Vec<_> = PlanTier::ALL.iter().map(|t| t.key()).collect();
        assert_eq!(keys, ["free", "starter", "pro", "enterprise"]);
        assert_eq!(PlanTier::Pro.price_key(BillingInterval::Month), "pro_monthly");
        assert_eq!(PlanTier::Starter.price_key(BillingInterval::Year), "starter_yearly");
    }

    #[test]
    fn plan_defaults_to_active() {
        let plan: Plan =
            serde_json::from_value(json!({"id": "plan_1", "key": "pro", "name": "Pro"})).unwrap();
        assert!(plan.is_active);
        assert!(plan.prices.is_empty());
    }

    #[test]
    fn null_fields_take_defaults() {
        let plan: Plan = serde_json::from_value(json!({
            "id": "plan_1",
            "key": "pro",
            "name": "Pro",
            "is_active": null,
            "prices": null,
            "entitlements": null
        }))
        .unwrap();
        assert!(plan.is_active);
        assert!(plan.prices.is_empty());
        assert!(plan.entitlements.is_empty());
    }

    #[test]
    fn plan_with_nested_prices_and_entitlements() {
        let plan: Plan = serde_json::from_value(json!({
            "id": "plan_1",
            "key": "pro",
            "name": "Pro",
            "is_active": false,
            "prices": [{
                "id": "price_1",
                "plan_id": "plan_1",
                "key": "pro_monthly",
                "amount": 2900,
                "currency": "usd",
                "interval": "month"
            }],
            "entitlements": [{
                "id": "ent_1",
                "plan_id": "plan_1",
                "key": "seats",
                "value_int": 10
            }]
        }))
        .unwrap();
        assert!(!plan.is_active);
        assert_eq!(plan.prices[0].amount, 2900);
        assert_eq!(plan.entitlements[0].value_int, Some(10));
    }
}
