use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{default_true, null_as_default, null_as_true};
use crate::patch::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Day,
    Week,
    Month,
    Year,
    /// An interval this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl BillingInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingInterval::Day => "day",
            BillingInterval::Week => "week",
            BillingInterval::Month => "month",
            BillingInterval::Year => "year",
            BillingInterval::Unknown => "unknown",
        }
    }

    /// Suffix used by built-in price keys.
    pub(crate) fn adverb(self) -> &'static str {
        match self {
            BillingInterval::Day => "daily",
            BillingInterval::Week => "weekly",
            BillingInterval::Month => "monthly",
            BillingInterval::Year => "yearly",
            BillingInterval::Unknown => "unknown",
        }
    }
}

/// A price on a plan. `amount` is in the currency's minor unit (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub plan_id: String,
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub interval: BillingInterval,
    #[serde(default = "default_interval_count", deserialize_with = "null_as_one")]
    pub interval_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trial_days: u32,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_interval_count() -> u32 {
    1
}

fn null_as_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Option::<u32>::deserialize(deserializer).map(|v| v.unwrap_or(1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePriceParams {
    pub plan_id: String,
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub interval: BillingInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_days: Option<u32>,
}

impl CreatePriceParams {
    pub fn new(
        plan_id: impl Into<String>,
        key: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
        interval: BillingInterval,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            key: key.into(),
            amount,
            currency: currency.into(),
            interval,
            interval_count: None,
            trial_days: None,
        }
    }

    pub fn interval_count(mut self, count: u32) -> Self {
        self.interval_count = Some(count);
        self
    }

    pub fn trial_days(mut self, days: u32) -> Self {
        self.trial_days = Some(days);
        self
    }
}

/// Amount, currency and interval are fixed once a price exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePriceParams {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub key: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub trial_days: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_active: Patch<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPricesParams {
    pub plan_id: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}
