use crate::client::Client;
use crate::error::Result;
use crate::pagination::{segment, Page, Query};
use crate::types::{
    CheckEntitlementParams, CreateEntitlementParams, Entitlement, EntitlementCheck,
    ListEntitlementsParams, UpdateEntitlementParams,
};

impl Client {
    /// `POST /entitlements`
    pub fn create_entitlement(&self, params: &CreateEntitlementParams) -> Result<Entitlement> {
        self.post("/entitlements", params)
    }

    /// `GET /entitlements/{id}`
    pub fn get_entitlement(&self, id: &str) -> Result<Entitlement> {
        self.get(&format!("/entitlements/{}", segment(id)))
    }

    /// `GET /entitlements?plan_id=&limit=&cursor=`
    pub fn list_entitlements(&self, params: &ListEntitlementsParams) -> Result<Page<Entitlement>> {
        let mut query = Query::new();
        query.push_opt("plan_id", params.plan_id.as_deref());
        query.push_opt("limit", params.limit.filter(|l| *l > 0));
        query.push_opt("cursor", params.cursor.as_deref().filter(|c| !c.is_empty()));
        self.get(&query.to_path("/entitlements"))
    }

    /// `PATCH /entitlements/{id}`
    pub fn update_entitlement(&self, id: &str, params: &UpdateEntitlementParams) -> Result<Entitlement> {
        self.patch(&format!("/entitlements/{}", segment(id)), params)
    }

    /// `DELETE /entitlements/{id}`
    pub fn delete_entitlement(&self, id: &str) -> Result<()> {
        self.delete(&format!("/entitlements/{}", segment(id)))
    }

    /// `POST /entitlements/check`: does the customer's current plan grant `entitlement_key`?
    pub fn check_entitlement(&self, params: &CheckEntitlementParams) -> Result<EntitlementCheck> {
        self.post("/entitlements/check", params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::http::HttpMethod;
    use crate::resources::test_support::{mocked, BASE};
    use crate::types::EntitlementValue;

    use super::*;

    #[test]
    fn check_entitlement() {
        let (client, transport) = mocked();
        transport.respond(200, r#"{"has_access":true,"value":50,"plan_name":"Pro"}"#);

        let check = client
            .check_entitlement(&CheckEntitlementParams::new("cus_1", "projects"))
            .unwrap();

        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE}/entitlements/check"));
        assert_eq!(
            transport.last_body(),
            json!({"customer_id": "cus_1", "entitlement_key": "projects"})
        );
        assert!(check.has_access);
        assert_eq!(check.limit(), Some(50));
        assert_eq!(check.plan_name.as_deref(), Some("Pro"));
    }

    #[test]
    fn check_unknown_customer_is_not_found() {
        let (client, transport) = mocked();
        transport.respond(404, r#"{"code":"not_found","message":"no such customer","field":"customer_id"}"#);

        let err = client
            .check_entitlement(&CheckEntitlementParams::new("cus_x", "projects"))
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.api().unwrap().field.as_deref(), Some("customer_id"));
    }

    #[test]
    fn create_flag_entitlement() {
        let (client, transport) = mocked();
        transport.respond(201, r#"{"id":"ent_1","plan_id":"plan_1","key":"sso","value_bool":true}"#);

        let ent = client
            .create_entitlement(&CreateEntitlementParams::flag("plan_1", "sso", true))
            .unwrap();

        assert_eq!(transport.last_request().url, format!("{BASE}/entitlements"));
        assert_eq!(ent.value(), Some(EntitlementValue::Flag(true)));
    }

    #[test]
    fn update_and_list() {
        let (client, transport) = mocked();
        transport
            .respond(200, r#"{"id":"ent_1","plan_id":"plan_1","key":"seats","value_int":20}"#)
            .respond(200, r#"{"data":[{"id":"ent_1","plan_id":"plan_1","key":"seats","value_int":20}],"total":1}"#);

        client
            .update_entitlement("ent_1", &UpdateEntitlementParams::new().value(EntitlementValue::Limit(20)))
            .unwrap();
        assert_eq!(transport.last_request().url, format!("{BASE}/entitlements/ent_1"));

        let page = client
            .list_entitlements(&ListEntitlementsParams {
                plan_id: Some("plan_1".into()),
                limit: Some(10),
                cursor: None,
            })
            .unwrap();
        assert_eq!(
            transport.last_request().url,
            format!("{BASE}/entitlements?plan_id=plan_1&limit=10")
        );
        assert_eq!(page.data[0].value_int, Some(20));
    }

    #[test]
    fn validation_error_preserves_field() {
        let (client, transport) = mocked();
        transport.respond(
            400,
            r#"{"code":"invalid_value","message":"limit must be positive","field":"value_int"}"#,
        );

        let err = client
            .create_entitlement(&CreateEntitlementParams::limit("plan_1", "seats", -1))
            .unwrap_err();

        assert!(err.is_validation_error());
        assert_eq!(err.api().unwrap().field.as_deref(), Some("value_int"));
    }

    #[test]
    fn get_and_delete() {
        let (client, transport) = mocked();
        transport
            .respond(200, r#"{"id":"ent_1","plan_id":"plan_1","key":"sso","value_bool":false}"#)
            .respond(204, "");

        client.get_entitlement("ent_1").unwrap();
        client.delete_entitlement("ent_1").unwrap();

        let methods: Vec<_> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods, [HttpMethod::Get, HttpMethod::Delete]);
    }
}
