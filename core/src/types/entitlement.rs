use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patch::Patch;

/// A feature flag or numeric limit attached to a plan.
///
/// At most one of `value_bool` / `value_int` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub plan_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_bool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_int: Option<i64>,
    /// Minor-unit price charged per `overage_unit` past the limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    pub fn value(&self) -> Option<EntitlementValue> {
        match (self.value_bool, self.value_int) {
            (Some(flag), _) => Some(EntitlementValue::Flag(flag)),
            (None, Some(limit)) => Some(EntitlementValue::Limit(limit)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementValue {
    Flag(bool),
    Limit(i64),
}

/// Built with [`CreateEntitlementParams::flag`] or
/// [`CreateEntitlementParams::limit`] so exactly one value is ever sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntitlementParams {
    pub plan_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_bool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_int: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage_unit: Option<String>,
}

impl CreateEntitlementParams {
    pub fn flag(plan_id: impl Into<String>, key: impl Into<String>, enabled: bool) -> Self {
        Self::with_value(plan_id, key, EntitlementValue::Flag(enabled))
    }

    pub fn limit(plan_id: impl Into<String>, key: impl Into<String>, limit: i64) -> Self {
        Self::with_value(plan_id, key, EntitlementValue::Limit(limit))
    }

    pub fn with_value(
        plan_id: impl Into<String>,
        key: impl Into<String>,
        value: EntitlementValue,
    ) -> Self {
        let (value_bool, value_int) = match value {
            EntitlementValue::Flag(b) => (Some(b), None),
            EntitlementValue::Limit(n) => (None, Some(n)),
        };
        Self {
            plan_id: plan_id.into(),
            key: key.into(),
            value_bool,
            value_int,
            overage_price: None,
            overage_unit: None,
        }
    }

    pub fn overage(mut self, price: i64, unit: impl Into<String>) -> Self {
        self.overage_price = Some(price);
        self.overage_unit = Some(unit.into());
        self
    }

    pub fn value(&self) -> EntitlementValue {
        match (self.value_bool, self.value_int) {
            (_, Some(limit)) => EntitlementValue::Limit(limit),
            (flag, None) => EntitlementValue::Flag(flag.unwrap_or(false)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntitlementParams {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    value_bool: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    value_int: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub overage_price: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub overage_unit: Patch<String>,
}

impl UpdateEntitlementParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value, clearing the other kind.
    pub fn value(mut self, value: EntitlementValue) -> Self {
        match value {
            EntitlementValue::Flag(b) => {
                self.value_bool = Patch::Value(b);
                self.value_int = Patch::Null;
            }
            EntitlementValue::Limit(n) => {
                self.value_bool = Patch::Null;
                self.value_int = Patch::Value(n);
            }
        }
        self
    }

    pub fn overage(mut self, price: i64, unit: impl Into<String>) -> Self {
        self.overage_price = Patch::Value(price);
        self.overage_unit = Patch::Value(unit.into());
        self
    }

    pub fn clear_overage(mut self) -> Self {
        self.overage_price = Patch::Null;
        self.overage_unit = Patch::Null;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntitlementsParams {
    pub plan_id: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntitlementParams {
    pub customer_id: String,
    pub entitlement_key: String,
}

impl CheckEntitlementParams {
    pub fn new(customer_id: impl Into<String>, entitlement_key: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            entitlement_key: entitlement_key.into(),
        }
    }
}

/// Result of an entitlement check. `value` is whatever the granting plan
/// stores: a boolean, a number, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementCheck {
    pub has_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
}

impl EntitlementCheck {
    /// Numeric limit, accepting either a JSON number or a numeric string.
    pub fn limit(&self) -> Option<i64> {
        match self.value.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_sends_exactly_one_value() {
        let body = serde_json::to_value(CreateEntitlementParams::flag("plan_1", "sso", true)).unwrap();
        assert_eq!(body, json!({"plan_id": "plan_1", "key": "sso", "value_bool": true}));

        let body = serde_json::to_value(
            CreateEntitlementParams::limit("plan_1", "api_calls", 10_000).overage(2, "1k_calls"),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "plan_id": "plan_1",
                "key": "api_calls",
                "value_int": 10000,
                "overage_price": 2,
                "overage_unit": "1k_calls"
            })
        );
    }

    #[test]
    fn update_switching_kind_clears_the_other() {
        let body = serde_json::to_value(UpdateEntitlementParams::new().value(EntitlementValue::Limit(5)))
            .unwrap();
        assert_eq!(body, json!({"value_bool": null, "value_int": 5}));
    }

    #[test]
    fn clearing_overage_sends_nulls() {
        let body = serde_json::to_value(UpdateEntitlementParams::new().clear_overage()).unwrap();
        assert_eq!(body, json!({"overage_price": null, "overage_unit": null}));
    }

    #[test]
    fn entitlement_value_accessor() {
        let ent: Entitlement = serde_json::from_value(json!({
            "id": "ent_1", "plan_id": "plan_1", "key": "seats", "value_int": 3
        }))
        .unwrap();
        assert_eq!(ent.value(), Some(EntitlementValue::Limit(3)));
    }

    #[test]
    fn check_limit_accepts_number_or_string() {
        let check: EntitlementCheck =
            serde_json::from_value(json!({"has_access": true, "value": 100, "plan_name": "Pro"})).unwrap();
        assert_eq!(check.limit(), Some(100));

        let check: EntitlementCheck =
            serde_json::from_value(json!({"has_access": true, "value": "250"})).unwrap();
        assert_eq!(check.limit(), Some(250));

        let check: EntitlementCheck = serde_json::from_value(json!({"has_access": false})).unwrap();
        assert_eq!(check.limit(), None);
        assert!(check.plan_name.is_none());
    }
}
