//! Resource records and request payloads for the billing API.
//!
//! # Design
//! Records mirror the server's JSON and carry no client-side invariants:
//! the server is authoritative, so decoding is lenient (optional fields
//! default, and an explicit `null` reads the same as a missing key) and
//! nothing is validated locally. Payload types use
//! `skip_serializing_if` so unset fields never reach the wire.

pub mod customer;
pub mod entitlement;
pub mod link;
pub mod plan;
pub mod price;
pub mod subscription;
pub mod usage;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Free-form string metadata attached to customers and subscriptions.
pub type Metadata = HashMap<String, String>;

pub use customer::{CreateCustomerParams, Customer, UpdateCustomerParams};
pub use entitlement::{
    CheckEntitlementParams, CreateEntitlementParams, Entitlement, EntitlementCheck,
    EntitlementValue, ListEntitlementsParams, UpdateEntitlementParams,
};
pub use link::{CheckoutLink, CreateCheckoutLinkParams, CreatePortalLinkParams, Link, PortalLink};
pub use plan::{CreatePlanParams, ListPlansParams, Plan, PlanTier, UpdatePlanParams};
pub use price::{BillingInterval, CreatePriceParams, ListPricesParams, Price, UpdatePriceParams};
pub use subscription::{
    CreateSubscriptionParams, ListSubscriptionsParams, Subscription, SubscriptionStatus,
    UpdateSubscriptionParams,
};
pub use usage::{RecordUsageParams, UsageQuery, UsageRecord, UsageSummary};

/// Decode an explicit `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub(crate) fn default_true() -> bool {
    true
}

/// `is_active` flags are on unless the server says otherwise.
pub(crate) fn null_as_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Option::<bool>::deserialize(deserializer).map(|v| v.unwrap_or(true))
}
