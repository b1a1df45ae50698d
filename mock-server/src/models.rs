use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type Metadata = HashMap<String, String>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<Price>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlements: Vec<Entitlement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub plan_id: String,
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub interval: Interval,
    pub interval_count: u32,
    pub trial_days: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub plan_id: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_bool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overage_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overage_unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscriptions: Vec<Subscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Canceled,
    PastDue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub price_id: String,
    pub status: Status,
    pub quantity: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub subscription_id: String,
    pub product_key: String,
    pub quantity: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageSummary {
    pub subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_key: Option<String>,
    pub total_usage: i64,
    pub record_count: u64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntitlementCheck {
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub next_cursor: String,
}

// --- request payloads ---

/// Distinguishes a missing key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreatePlan {
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlan {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_active: Option<Option<bool>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePrice {
    pub plan_id: String,
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub interval: Interval,
    pub interval_count: Option<u32>,
    pub trial_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePrice {
    #[serde(default, deserialize_with = "double_option")]
    pub key: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub trial_days: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_active: Option<Option<bool>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntitlement {
    pub plan_id: String,
    pub key: String,
    pub value_bool: Option<bool>,
    pub value_int: Option<i64>,
    pub overage_price: Option<i64>,
    pub overage_unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEntitlement {
    #[serde(default, deserialize_with = "double_option")]
    pub value_bool: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    pub value_int: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub overage_price: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub overage_unit: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CheckEntitlement {
    pub customer_id: String,
    pub entitlement_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    pub email: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomer {
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub metadata: Option<Option<Metadata>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscription {
    pub customer_id: String,
    pub price_id: Option<String>,
    pub plan_key: Option<String>,
    pub price_key: Option<String>,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscription {
    #[serde(default, deserialize_with = "double_option")]
    pub price_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub quantity: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub metadata: Option<Option<Metadata>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordUsage {
    pub subscription_id: String,
    pub product_key: String,
    pub quantity: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCheckoutLink {
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePortalLink {
    pub return_url: Option<String>,
}

// --- query strings ---

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub include_inactive: Option<bool>,
    pub plan_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    pub subscription_id: Option<String>,
    pub product_key: Option<String>,
}
