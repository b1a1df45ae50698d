use crate::client::Client;
use crate::error::Result;
use crate::pagination::{paginate, segment, ListParams, Page, Query};
use crate::types::{
    CreateCustomerParams, CreatePortalLinkParams, Customer, PortalLink, UpdateCustomerParams,
};

impl Client {
    /// `POST /customers`
    pub fn create_customer(&self, params: &CreateCustomerParams) -> Result<Customer> {
        self.post("/customers", params)
    }

    /// Create a customer linked to a user id from the caller's own system.
    pub fn create_customer_for_user(
        &self,
        email: impl Into<String>,
        external_user_id: impl Into<String>,
    ) -> Result<Customer> {
        self.create_customer(&CreateCustomerParams::new(email).external_id(external_user_id))
    }

    /// `GET /customers/{id}`
    pub fn get_customer(&self, id: &str) -> Result<Customer> {
        self.get(&format!("/customers/{}", segment(id)))
    }

    /// `GET /customers?limit=&cursor=`
    pub fn list_customers(&self, params: &ListParams) -> Result<Page<Customer>> {
        let mut query = Query::new();
        params.apply(&mut query);
        self.get(&query.to_path("/customers"))
    }

    /// Walk every page of customers.
    pub fn list_all_customers(&self, page_size: Option<u32>) -> Result<Vec<Customer>> {
        paginate(|cursor| {
            self.list_customers(&ListParams {
                limit: page_size,
                cursor: cursor.map(str::to_owned),
            })
        })
    }

    /// `PATCH /customers/{id}`
    pub fn update_customer(&self, id: &str, params: &UpdateCustomerParams) -> Result<Customer> {
        self.patch(&format!("/customers/{}", segment(id)), params)
    }

    /// `DELETE /customers/{id}`
    pub fn delete_customer(&self, id: &str) -> Result<()> {
        self.delete(&format!("/customers/{}", segment(id)))
    }

    /// `POST /customers/{id}/portal-link`
    pub fn create_portal_link(&self, customer_id: &str, params: &CreatePortalLinkParams) -> Result<PortalLink> {
        self.post(&format!("/customers/{}/portal-link", segment(customer_id)), params)
    }
}
