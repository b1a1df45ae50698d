use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// One metered usage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub subscription_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_key: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Usage submission. Resubmitting with the same `idempotency_key` lets the
/// server drop the duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUsageParams {
    pub subscription_id: String,
    pub product_key: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl RecordUsageParams {
    pub fn new(
        subscription_id: impl Into<String>,
        product_key: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            product_key: product_key.into(),
            quantity,
            timestamp: None,
            idempotency_key: None,
        }
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Attach a fresh random idempotency key. Keep the params around and
    /// resend them unchanged to retry safely.
    pub fn with_generated_idempotency_key(self) -> Self {
        self.idempotency_key(Uuid::new_v4().to_string())
    }
}

/// Aggregate usage over the current billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub subscription_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_key: Option<String>,
    pub total_usage: i64,
    #[serde(default, alias = "records", deserialize_with = "null_as_default")]
    pub record_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,
}

/// Filter for the usage summary endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageQuery {
    pub subscription_id: String,
    pub product_key: Option<String>,
}

impl UsageQuery {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            product_key: None,
        }
    }

    pub fn product_key(mut self, product_key: impl Into<String>) -> Self {
        self.product_key = Some(product_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn record_params_omit_unset_optionals() {
        let body = serde_json::to_value(RecordUsageParams::new("sub_1", "api_calls", 5)).unwrap();
        assert_eq!(body, json!({"subscription_id": "sub_1", "product_key": "api_calls", "quantity": 5}));
    }

    #[test]
    fn record_params_with_timestamp_and_key() {
        let ts = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let body = serde_json::to_value(
            RecordUsageParams::new("sub_1", "api_calls", 5)
                .timestamp(ts)
                .idempotency_key("batch-42"),
        )
        .unwrap();
        assert_eq!(body["timestamp"], "2026-05-01T12:00:00Z");
        assert_eq!(body["idempotency_key"], "batch-42");
    }

    #[test]
    fn generated_keys_are_unique_uuids() {
        let a = RecordUsageParams::new("sub_1", "k", 1).with_generated_idempotency_key();
        let b = RecordUsageParams::new("sub_1", "k", 1).with_generated_idempotency_key();
        let key_a = a.idempotency_key.unwrap();
        assert!(Uuid::parse_str(&key_a).is_ok());
        assert_ne!(Some(key_a), b.idempotency_key);
    }

    #[test]
    fn summary_accepts_legacy_records_field() {
        let summary: UsageSummary = serde_json::from_value(json!({
            "subscription_id": "sub_1",
            "total_usage": 1200,
            "records": 7
        }))
        .unwrap();
        assert_eq!(summary.record_count, 7);
        assert!(summary.product_key.is_none());
    }

    #[test]
    fn null_record_count_is_zero() {
        let summary: UsageSummary = serde_json::from_value(json!({
            "subscription_id": "sub_1",
            "total_usage": 0,
            "record_count": null
        }))
        .unwrap();
        assert_eq!(summary.record_count, 0);
    }
}
