use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::pagination::{segment, Page, Query};
use crate::types::{
    BillingInterval, CheckoutLink, CreateCheckoutLinkParams, CreateSubscriptionParams,
    ListSubscriptionsParams, PlanTier, Subscription, UpdateSubscriptionParams,
};

impl Client {
    /// `POST /subscriptions`
    pub fn create_subscription(&self, params: &CreateSubscriptionParams) -> Result<Subscription> {
        self.post("/subscriptions", params)
    }

    /// Subscribe a customer to one of the built-in tiers.
    pub fn subscribe_to_tier(
        &self,
        customer_id: &str,
        tier: PlanTier,
        interval: BillingInterval,
    ) -> Result<Subscription> {
        self.create_subscription(&CreateSubscriptionParams::for_plan(
            customer_id,
            tier.key(),
            tier.price_key(interval),
        ))
    }

    /// `GET /subscriptions/{id}`
    pub fn get_subscription(&self, id: &str) -> Result<Subscription> {
        self.get(&format!("/subscriptions/{}", segment(id)))
    }

    /// `GET /subscriptions?customer_id=&status=&limit=&cursor=`
    pub fn list_subscriptions(&self, params: &ListSubscriptionsParams) -> Result<Page<Subscription>> {
        let mut query = Query::new();
        query.push_opt("customer_id", params.customer_id.as_deref());
        query.push_opt("status", params.status.map(|s| s.as_str()));
        query.push_opt("limit", params.limit.filter(|l| *l > 0));
        query.push_opt("cursor", params.cursor.as_deref().filter(|c| !c.is_empty()));
        self.get(&query.to_path("/subscriptions"))
    }

    /// `PATCH /subscriptions/{id}`
    pub fn update_subscription(&self, id: &str, params: &UpdateSubscriptionParams) -> Result<Subscription> {
        self.patch(&format!("/subscriptions/{}", segment(id)), params)
    }

    /// `DELETE /subscriptions/{id}`. Returns the subscription as the server
    /// left it, normally with status `canceled`.
    pub fn cancel_subscription(&self, id: &str) -> Result<Subscription> {
        self.call::<(), _>(HttpMethod::Delete, &format!("/subscriptions/{}", segment(id)), None)
    }

    /// `POST /subscriptions/{id}/checkout-link`
    pub fn create_checkout_link(
        &self,
        subscription_id: &str,
        params: &CreateCheckoutLinkParams,
    ) -> Result<CheckoutLink> {
        self.post(&format!("/subscriptions/{}/checkout-link", segment(subscription_id)), params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::patch::Patch;
    use crate::resources::test_support::{mocked, BASE};
    use crate::types::SubscriptionStatus;

    use super::*;

    const SUB: &str = r#"{"id":"sub_1","customer_id":"cus_1","price_id":"price_1","status":"active","quantity":1,"started_at":"2026-02-01T00:00:00Z"}"#;

    #[test]
    fn create_by_price_id() {
        let (client, transport) = mocked();
        transport.respond(201, SUB);

        let sub = client
            .create_subscription(&CreateSubscriptionParams::for_price("cus_1", "price_1").quantity(3))
            .unwrap();

        assert_eq!(transport.last_request().url, format!("{BASE}/subscriptions"));
        assert_eq!(
            transport.last_body(),
            json!({"customer_id": "cus_1", "price_id": "price_1", "quantity": 3})
        );
        assert!(sub.is_active());
    }

    #[test]
    fn subscribe_to_tier_uses_plan_and_price_keys() {
        let (client, transport) = mocked();
        transport.respond(201, SUB);

        client
            .subscribe_to_tier("cus_1", PlanTier::Pro, BillingInterval::Year)
            .unwrap();

        assert_eq!(
            transport.last_body(),
            json!({"customer_id": "cus_1", "plan_key": "pro", "price_key": "pro_yearly"})
        );
    }

    #[test]
    fn cancel_is_delete_returning_subscription() {
        let (client, transport) = mocked();
        transport.respond(
            200,
            r#"{"id":"sub_1","customer_id":"cus_1","price_id":"price_1","status":"canceled","canceled_at":"2026-03-01T00:00:00Z"}"#,
        );

        let sub = client.cancel_subscription("sub_1").unwrap();

        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, format!("{BASE}/subscriptions/sub_1"));
        assert!(req.body.is_none());
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert!(sub.canceled_at.is_some());
    }

    #[test]
    fn list_filters() {
        let (client, transport) = mocked();
        transport.respond(200, &format!(r#"{{"data":[{SUB}],"total":1}}"#));

        let page = client
            .list_subscriptions(&ListSubscriptionsParams {
                customer_id: Some("cus_1".into()),
                status: Some(SubscriptionStatus::PastDue),
                limit: Some(10),
                cursor: None,
            })
            .unwrap();

        assert_eq!(
            transport.last_request().url,
            format!("{BASE}/subscriptions?customer_id=cus_1&status=past_due&limit=10")
        );
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn update_quantity_only() {
        let (client, transport) = mocked();
        transport.respond(200, SUB);

        let params = UpdateSubscriptionParams {
            quantity: Patch::Value(5),
            ..Default::default()
        };
        client.update_subscription("sub_1", &params).unwrap();

        assert_eq!(transport.last_request().method, HttpMethod::Patch);
        assert_eq!(transport.last_body(), json!({"quantity": 5}));
    }

    #[test]
    fn get_subscription_unauthorized() {
        let (client, transport) = mocked();
        transport.respond(401, r#"{"code":"unauthorized","message":"invalid api key"}"#);

        let err = client.get_subscription("sub_1").unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
    }

    #[test]
    fn checkout_link() {
        let (client, transport) = mocked();
        transport.respond(
            201,
            r#"{"url":"https://pay.tedo.ai/c/tok","token":"tok","expires_at":"2026-02-01T01:00:00Z"}"#,
        );

        let params = CreateCheckoutLinkParams {
            success_url: Some("https://app.example.com/ok".into()),
            cancel_url: None,
        };
        let link = client.create_checkout_link("sub_1", &params).unwrap();

        assert_eq!(
            transport.last_request().url,
            format!("{BASE}/subscriptions/sub_1/checkout-link")
        );
        assert_eq!(transport.last_body(), json!({"success_url": "https://app.example.com/ok"}));
        assert_eq!(link.url, "https://pay.tedo.ai/c/tok");
    }
}
