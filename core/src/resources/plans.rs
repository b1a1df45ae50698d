use crate::client::Client;
use crate::error::Result;
use crate::pagination::{paginate, segment, Page, Query};
use crate::types::{CreatePlanParams, ListPlansParams, Plan, UpdatePlanParams};

impl Client {
    /// `POST /plans`
    pub fn create_plan(&self, params: &CreatePlanParams) -> Result<Plan> {
        self.post("/plans", params)
    }

    /// `GET /plans/{id}`
    pub fn get_plan(&self, id: &str) -> Result<Plan> {
        self.get(&format!("/plans/{}", segment(id)))
    }

    /// `GET /plans?include_inactive=&limit=&cursor=`
    pub fn list_plans(&self, params: &ListPlansParams) -> Result<Page<Plan>> {
        let mut query = Query::new();
        if params.include_inactive {
            query.push("include_inactive", true);
        }
        query.push_opt("limit", params.limit.filter(|l| *l > 0));
        query.push_opt("cursor", params.cursor.as_deref().filter(|c| !c.is_empty()));
        self.get(&query.to_path("/plans"))
    }

    pub fn list_all_plans(&self, include_inactive: bool) -> Result<Vec<Plan>> {
        paginate(|cursor| {
            self.list_plans(&ListPlansParams {
                include_inactive,
                limit: None,
                cursor: cursor.map(str::to_owned),
            })
        })
    }

    /// `PATCH /plans/{id}`
    pub fn update_plan(&self, id: &str, params: &UpdatePlanParams) -> Result<Plan> {
        self.patch(&format!("/plans/{}", segment(id)), params)
    }

    /// `DELETE /plans/{id}`
    pub fn delete_plan(&self, id: &str) -> Result<()> {
        self.delete(&format!("/plans/{}", segment(id)))
    }
}
