use crate::client::Client;
use crate::error::Result;
use crate::pagination::{segment, Page, Query};
use crate::types::{CreatePriceParams, ListPricesParams, Price, UpdatePriceParams};

impl Client {
    /// `POST /prices`
    pub fn create_price(&self, params: &CreatePriceParams) -> Result<Price> {
        self.post("/prices", params)
    }

    /// `GET /prices/{id}`
    pub fn get_price(&self, id: &str) -> Result<Price> {
        self.get(&format!("/prices/{}", segment(id)))
    }

    /// `GET /prices?plan_id=&limit=&cursor=`
    pub fn list_prices(&self, params: &ListPricesParams) -> Result<Page<Price>> {
        let mut query = Query::new();
        query.push_opt("plan_id", params.plan_id.as_deref());
        query.push_opt("limit", params.limit.filter(|l| *l > 0));
        query.push_opt("cursor", params.cursor.as_deref().filter(|c| !c.is_empty()));
        self.get(&query.to_path("/prices"))
    }

    /// `PATCH /prices/{id}`
    pub fn update_price(&self, id: &str, params: &UpdatePriceParams) -> Result<Price> {
        self.patch(&format!("/prices/{}", segment(id)), params)
    }

    /// `DELETE /prices/{id}`
    pub fn delete_price(&self, id: &str) -> Result<()> {
        self.delete(&format!("/prices/{}", segment(id)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::http::HttpMethod;
    use crate::patch::Patch;
    use crate::resources::test_support::{mocked, BASE};
    use crate::types::BillingInterval;

    use super::*;

    const PRICE: &str = r#"{"id":"price_1","plan_id":"plan_1","key":"pro_monthly","amount":2900,"currency":"usd","interval":"month","trial_days":14}"#;

    #[test]
    fn create_price() {
        let (client, transport) = mocked();
        transport.respond(201, PRICE);

        let price = client
            .create_price(
                &CreatePriceParams::new("plan_1", "pro_monthly", 2900, "usd", BillingInterval::Month)
                    .trial_days(14),
            )
            .unwrap();

        assert_eq!(transport.last_request().url, format!("{BASE}/prices"));
        assert_eq!(transport.last_body()["amount"], 2900);
        assert_eq!(price.trial_days, 14);
        assert_eq!(price.interval, BillingInterval::Month);
    }

    #[test]
    fn list_prices_by_plan() {
        let (client, transport) = mocked();
        transport.respond(200, &format!(r#"{{"data":[{PRICE}],"total":1}}"#));

        let page = client
            .list_prices(&ListPricesParams {
                plan_id: Some("plan_1".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(transport.last_request().url, format!("{BASE}/prices?plan_id=plan_1"));
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn update_price_clears_trial() {
        let (client, transport) = mocked();
        transport.respond(200, PRICE);

        let params = UpdatePriceParams {
            trial_days: Patch::Null,
            ..Default::default()
        };
        client.update_price("price_1", &params).unwrap();

        assert_eq!(transport.last_request().method, HttpMethod::Patch);
        assert_eq!(transport.last_body(), json!({"trial_days": null}));
    }

    #[test]
    fn get_and_delete_price() {
        let (client, transport) = mocked();
        transport.respond(200, PRICE).respond(204, "");

        client.get_price("price_1").unwrap();
        assert_eq!(transport.last_request().url, format!("{BASE}/prices/price_1"));

        client.delete_price("price_1").unwrap();
        assert_eq!(transport.last_request().method, HttpMethod::Delete);
    }
}
