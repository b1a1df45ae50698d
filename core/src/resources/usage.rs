use crate::client::Client;
use crate::error::Result;
use crate::pagination::Query;
use crate::types::{RecordUsageParams, UsageQuery, UsageRecord, UsageSummary};

impl Client {
    /// `POST /usage`
    pub fn record_usage(&self, params: &RecordUsageParams) -> Result<UsageRecord> {
        self.post("/usage", params)
    }

    /// Record `quantity` units of `product_key` against a subscription now.
    pub fn record_usage_for(
        &self,
        subscription_id: &str,
        product_key: &str,
        quantity: i64,
    ) -> Result<UsageRecord> {
        self.record_usage(&RecordUsageParams::new(subscription_id, product_key, quantity))
    }

    /// `GET /usage?subscription_id=&product_key=`
    pub fn get_usage_summary(&self, query: &UsageQuery) -> Result<UsageSummary> {
        let mut q = Query::new();
        q.push("subscription_id", &query.subscription_id);
        q.push_opt("product_key", query.product_key.as_deref());
        self.get(&q.to_path("/usage"))
    }
}
