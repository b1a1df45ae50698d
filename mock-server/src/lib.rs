//! In-memory stand-in for the Tedo billing API, used by the client's
//! integration tests. All routes live under [`API_PREFIX`] and require a
//! bearer token.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub mod models;

pub use models::*;

pub const API_PREFIX: &str = "/billing/v1";
pub const TEST_API_KEY: &str = "tedo_test_key";

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;
const LINK_TTL_MINUTES: i64 = 60;
const BILLING_PERIOD_DAYS: i64 = 30;

/// Every record the mock knows about, in insertion order.
#[derive(Debug, Default)]
pub struct Store {
    pub plans: Vec<Plan>,
    pub prices: Vec<Price>,
    pub entitlements: Vec<Entitlement>,
    pub customers: Vec<Customer>,
    pub subscriptions: Vec<Subscription>,
    pub usage: Vec<UsageRecord>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    api_key: Arc<str>,
}

// --- errors ---

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &str, message: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
                field: field.map(str::to_string),
            },
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "invalid api key", None)
    }

    fn not_found(what: &str, field: Option<&str>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"), field)
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message, Some(field))
    }

    fn conflict(code: &str, message: impl Into<String>, field: Option<&str>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message, field)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

// --- wiring ---

/// Router seeded with the built-in tiers, accepting [`TEST_API_KEY`].
pub fn app() -> Router {
    app_with_key(TEST_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    app_with_store(api_key, Store::with_builtin_tiers())
}

pub fn app_with_store(api_key: &str, store: Store) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(store)),
        api_key: Arc::from(api_key),
    };

    let api = Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{id}", get(get_plan).patch(update_plan).delete(delete_plan))
        .route("/prices", get(list_prices).post(create_price))
        .route("/prices/{id}", get(get_price).patch(update_price).delete(delete_price))
        .route("/entitlements", get(list_entitlements).post(create_entitlement))
        .route("/entitlements/check", post(check_entitlement))
        .route(
            "/entitlements/{id}",
            get(get_entitlement).patch(update_entitlement).delete(delete_entitlement),
        )
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/portal-link", post(create_portal_link))
        .route("/subscriptions", get(list_subscriptions).post(create_subscription))
        .route(
            "/subscriptions/{id}",
            get(get_subscription).patch(update_subscription).delete(cancel_subscription),
        )
        .route("/subscriptions/{id}/checkout-link", post(create_checkout_link))
        .route("/usage", get(usage_summary).post(record_usage))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);

    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|key| key == &*state.api_key);

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "rejected request without valid api key");
        return ApiFailure::unauthorized().into_response();
    }
    next.run(request).await
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Offset-based paging. Cursors are opaque to clients; an empty
/// `next_cursor` marks the last page.
pub fn paginate<T>(items: Vec<T>, limit: Option<usize>, cursor: Option<&str>) -> ApiResult<Page<T>> {
    let start = match cursor {
        None | Some("") => 0,
        Some(cursor) => cursor
            .strip_prefix("off_")
            .and_then(|offset| offset.parse::<usize>().ok())
            .ok_or_else(|| ApiFailure::invalid("cursor", "malformed cursor"))?,
    };
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let total = items.len();
    let data: Vec<T> = items.into_iter().skip(start).take(limit).collect();
    let end = start + data.len();
    let next_cursor = if end < total { format!("off_{end}") } else { String::new() };

    Ok(Page { data, total, next_cursor })
}

// --- store helpers ---

impl Store {
    /// The four tiers every account starts with, each with a monthly and a
    /// yearly price and a `projects` limit.
    pub fn with_builtin_tiers() -> Self {
        let mut store = Store::default();
        let tiers: [(&str, &str, i64, i64, bool); 4] = [
            ("free", "Free", 0, 1, false),
            ("starter", "Starter", 900, 5, false),
            ("pro", "Pro", 2900, 50, false),
            ("enterprise", "Enterprise", 9900, 1000, true),
        ];
        let now = Utc::now();

        for (key, name, monthly, projects, sso) in tiers {
            let plan_id = new_id("plan");
            store.plans.push(Plan {
                id: plan_id.clone(),
                key: key.to_string(),
                name: name.to_string(),
                description: None,
                is_active: true,
                prices: Vec::new(),
                entitlements: Vec::new(),
                created_at: now,
                updated_at: now,
            });
            let cadences = [("monthly", Interval::Month, monthly), ("yearly", Interval::Year, monthly * 10)];
            for (suffix, interval, amount) in cadences {
                store.prices.push(Price {
                    id: new_id("price"),
                    plan_id: plan_id.clone(),
                    key: format!("{key}_{suffix}"),
                    amount,
                    currency: "usd".to_string(),
                    interval,
                    interval_count: 1,
                    trial_days: 0,
                    is_active: true,
                    created_at: now,
                });
            }
            for (ent_key, value_bool, value_int) in [("projects", None, Some(projects)), ("sso", Some(sso), None)] {
                store.entitlements.push(Entitlement {
                    id: new_id("ent"),
                    plan_id: plan_id.clone(),
                    key: ent_key.to_string(),
                    value_bool,
                    value_int,
                    overage_price: None,
                    overage_unit: None,
                    created_at: now,
                });
            }
        }
        store
    }

    fn plan(&self, id: &str) -> ApiResult<&Plan> {
        self.plans.iter().find(|p| p.id == id).ok_or_else(|| ApiFailure::not_found("plan", None))
    }

    fn price(&self, id: &str) -> ApiResult<&Price> {
        self.prices.iter().find(|p| p.id == id).ok_or_else(|| ApiFailure::not_found("price", None))
    }

    fn customer(&self, id: &str) -> ApiResult<&Customer> {
        self.customers.iter().find(|c| c.id == id).ok_or_else(|| ApiFailure::not_found("customer", None))
    }

    fn subscription(&self, id: &str) -> ApiResult<&Subscription> {
        self.subscriptions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiFailure::not_found("subscription", None))
    }

    /// Plan with its prices and entitlements embedded.
    fn expand_plan(&self, plan: &Plan) -> Plan {
        let mut plan = plan.clone();
        plan.prices = self.prices.iter().filter(|p| p.plan_id == plan.id).cloned().collect();
        plan.entitlements = self.entitlements.iter().filter(|e| e.plan_id == plan.id).cloned().collect();
        plan
    }

    fn expand_customer(&self, customer: &Customer) -> Customer {
        let mut customer = customer.clone();
        customer.subscriptions = self
            .subscriptions
            .iter()
            .filter(|s| s.customer_id == customer.id)
            .cloned()
            .collect();
        customer
    }

    fn price_in_use(&self, price_id: &str) -> bool {
        self.subscriptions.iter().any(|s| s.price_id == price_id && s.status == Status::Active)
    }
}

fn require(field: &str, value: Option<String>) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiFailure::invalid(field, format!("{field} is required"))),
    }
}

fn validate_email(email: &str) -> ApiResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiFailure::invalid("email", "email is invalid")),
    }
}

fn link(kind: &str) -> Link {
    let token = Uuid::new_v4().simple().to_string();
    Link {
        url: format!("https://billing.tedo.ai/{kind}/{token}"),
        token,
        expires_at: Utc::now() + Duration::minutes(LINK_TTL_MINUTES),
    }
}

// --- plans ---

async fn list_plans(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Page<Plan>>> {
    let store = state.db.read().await;
    let include_inactive = q.include_inactive.unwrap_or(false);
    let plans = store
        .plans
        .iter()
        .filter(|p| include_inactive || p.is_active)
        .map(|p| store.expand_plan(p))
        .collect();
    paginate(plans, q.limit, q.cursor.as_deref()).map(Json)
}

async fn create_plan(
    State(state): State<AppState>,
    Json(input): Json<CreatePlan>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    let key = require("key", input.key)?;
    let name = require("name", input.name)?;

    let mut store = state.db.write().await;
    if store.plans.iter().any(|p| p.key == key) {
        return Err(ApiFailure::conflict("duplicate_key", format!("plan key {key} already exists"), Some("key")));
    }
    let now = Utc::now();
    let plan = Plan {
        id: new_id("plan"),
        key,
        name,
        description: input.description,
        is_active: input.is_active.unwrap_or(true),
        prices: Vec::new(),
        entitlements: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store.plans.push(plan.clone());
    tracing::debug!(id = %plan.id, key = %plan.key, "created plan");
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Plan>> {
    let store = state.db.read().await;
    let plan = store.plan(&id)?;
    Ok(Json(store.expand_plan(plan)))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePlan>,
) -> ApiResult<Json<Plan>> {
    let mut store = state.db.write().await;
    let plan = store
        .plans
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| ApiFailure::not_found("plan", None))?;

    match input.name {
        Some(Some(name)) if !name.trim().is_empty() => plan.name = name,
        Some(_) => return Err(ApiFailure::invalid("name", "name cannot be empty")),
        None => {}
    }
    if let Some(description) = input.description {
        plan.description = description;
    }
    if let Some(is_active) = input.is_active {
        plan.is_active = is_active.unwrap_or(true);
    }
    plan.updated_at = Utc::now();
    let plan = plan.clone();
    Ok(Json(store.expand_plan(&plan)))
}

async fn delete_plan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    store.plan(&id)?;
    let in_use = store
        .prices
        .iter()
        .filter(|p| p.plan_id == id)
        .any(|p| store.price_in_use(&p.id));
    if in_use {
        return Err(ApiFailure::conflict("plan_in_use", "plan has active subscriptions", None));
    }
    store.plans.retain(|p| p.id != id);
    store.prices.retain(|p| p.plan_id != id);
    store.entitlements.retain(|e| e.plan_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- prices ---

async fn list_prices(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Page<Price>>> {
    let store = state.db.read().await;
    let prices = store
        .prices
        .iter()
        .filter(|p| q.plan_id.as_ref().is_none_or(|plan_id| &p.plan_id == plan_id))
        .cloned()
        .collect();
    paginate(prices, q.limit, q.cursor.as_deref()).map(Json)
}

async fn create_price(
    State(state): State<AppState>,
    Json(input): Json<CreatePrice>,
) -> ApiResult<(StatusCode, Json<Price>)> {
    if input.amount < 0 {
        return Err(ApiFailure::invalid("amount", "amount must not be negative"));
    }
    if input.currency.len() != 3 || !input.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiFailure::invalid("currency", "currency must be a three-letter ISO code"));
    }
    if input.interval_count == Some(0) {
        return Err(ApiFailure::invalid("interval_count", "interval_count must be positive"));
    }

    let mut store = state.db.write().await;
    store
        .plan(&input.plan_id)
        .map_err(|_| ApiFailure::not_found("plan", Some("plan_id")))?;
    if store.prices.iter().any(|p| p.plan_id == input.plan_id && p.key == input.key) {
        return Err(ApiFailure::conflict("duplicate_key", "price key already exists on plan", Some("key")));
    }
    let price = Price {
        id: new_id("price"),
        plan_id: input.plan_id,
        key: input.key,
        amount: input.amount,
        currency: input.currency.to_ascii_lowercase(),
        interval: input.interval,
        interval_count: input.interval_count.unwrap_or(1),
        trial_days: input.trial_days.unwrap_or(0),
        is_active: true,
        created_at: Utc::now(),
    };
    store.prices.push(price.clone());
    Ok((StatusCode::CREATED, Json(price)))
}

async fn get_price(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Price>> {
    let store = state.db.read().await;
    store.price(&id).cloned().map(Json)
}

async fn update_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePrice>,
) -> ApiResult<Json<Price>> {
    let mut store = state.db.write().await;
    let price = store
        .prices
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| ApiFailure::not_found("price", None))?;

    match input.key {
        Some(Some(key)) if !key.trim().is_empty() => price.key = key,
        Some(_) => return Err(ApiFailure::invalid("key", "key cannot be empty")),
        None => {}
    }
    if let Some(trial_days) = input.trial_days {
        price.trial_days = trial_days.unwrap_or(0);
    }
    if let Some(is_active) = input.is_active {
        price.is_active = is_active.unwrap_or(true);
    }
    Ok(Json(price.clone()))
}

async fn delete_price(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    store.price(&id)?;
    if store.price_in_use(&id) {
        return Err(ApiFailure::conflict("price_in_use", "price has active subscriptions", None));
    }
    store.prices.retain(|p| p.id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- entitlements ---

async fn list_entitlements(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Page<Entitlement>>> {
    let store = state.db.read().await;
    let entitlements = store
        .entitlements
        .iter()
        .filter(|e| q.plan_id.as_ref().is_none_or(|plan_id| &e.plan_id == plan_id))
        .cloned()
        .collect();
    paginate(entitlements, q.limit, q.cursor.as_deref()).map(Json)
}

fn validate_entitlement_value(value_bool: Option<bool>, value_int: Option<i64>) -> ApiResult<()> {
    match (value_bool, value_int) {
        (Some(_), None) => Ok(()),
        (None, Some(limit)) if limit >= 0 => Ok(()),
        (None, Some(_)) => Err(ApiFailure::invalid("value_int", "limit must not be negative")),
        _ => Err(ApiFailure::invalid("value", "exactly one of value_bool or value_int is required")),
    }
}

async fn create_entitlement(
    State(state): State<AppState>,
    Json(input): Json<CreateEntitlement>,
) -> ApiResult<(StatusCode, Json<Entitlement>)> {
    validate_entitlement_value(input.value_bool, input.value_int)?;

    let mut store = state.db.write().await;
    store
        .plan(&input.plan_id)
        .map_err(|_| ApiFailure::not_found("plan", Some("plan_id")))?;
    if store.entitlements.iter().any(|e| e.plan_id == input.plan_id && e.key == input.key) {
        return Err(ApiFailure::conflict("duplicate_key", "entitlement key already exists on plan", Some("key")));
    }
    let entitlement = Entitlement {
        id: new_id("ent"),
        plan_id: input.plan_id,
        key: input.key,
        value_bool: input.value_bool,
        value_int: input.value_int,
        overage_price: input.overage_price,
        overage_unit: input.overage_unit,
        created_at: Utc::now(),
    };
    store.entitlements.push(entitlement.clone());
    Ok((StatusCode::CREATED, Json(entitlement)))
}

async fn get_entitlement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Entitlement>> {
    let store = state.db.read().await;
    store
        .entitlements
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found("entitlement", None))
}

async fn update_entitlement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateEntitlement>,
) -> ApiResult<Json<Entitlement>> {
    let mut store = state.db.write().await;
    let entitlement = store
        .entitlements
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| ApiFailure::not_found("entitlement", None))?;

    let value_bool = input.value_bool.unwrap_or(entitlement.value_bool);
    let value_int = input.value_int.unwrap_or(entitlement.value_int);
    validate_entitlement_value(value_bool, value_int)?;
    entitlement.value_bool = value_bool;
    entitlement.value_int = value_int;
    if let Some(overage_price) = input.overage_price {
        entitlement.overage_price = overage_price;
    }
    if let Some(overage_unit) = input.overage_unit {
        entitlement.overage_unit = overage_unit;
    }
    Ok(Json(entitlement.clone()))
}

async fn delete_entitlement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    let before = store.entitlements.len();
    store.entitlements.retain(|e| e.id != id);
    if store.entitlements.len() == before {
        return Err(ApiFailure::not_found("entitlement", None));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn check_entitlement(
    State(state): State<AppState>,
    Json(input): Json<CheckEntitlement>,
) -> ApiResult<Json<EntitlementCheck>> {
    let store = state.db.read().await;
    store
        .customer(&input.customer_id)
        .map_err(|_| ApiFailure::not_found("customer", Some("customer_id")))?;

    let active = store
        .subscriptions
        .iter()
        .filter(|s| s.customer_id == input.customer_id && s.status == Status::Active);
    for sub in active {
        let Ok(price) = store.price(&sub.price_id) else { continue };
        let Ok(plan) = store.plan(&price.plan_id) else { continue };
        let granted = store
            .entitlements
            .iter()
            .find(|e| e.plan_id == plan.id && e.key == input.entitlement_key);
        if let Some(ent) = granted {
            let (has_access, value) = match (ent.value_bool, ent.value_int) {
                (Some(flag), _) => (flag, serde_json::Value::from(flag)),
                (None, Some(limit)) => (limit != 0, serde_json::Value::from(limit)),
                (None, None) => (true, serde_json::Value::Null),
            };
            return Ok(Json(EntitlementCheck {
                has_access,
                value: Some(value).filter(|v| !v.is_null()),
                plan_name: Some(plan.name.clone()),
            }));
        }
    }

    Ok(Json(EntitlementCheck { has_access: false, value: None, plan_name: None }))
}

// --- customers ---

async fn list_customers(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Page<Customer>>> {
    let store = state.db.read().await;
    paginate(store.customers.clone(), q.limit, q.cursor.as_deref()).map(Json)
}

async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let email = require("email", input.email)?;
    validate_email(&email)?;

    let mut store = state.db.write().await;
    if let Some(external_id) = &input.external_id {
        if store.customers.iter().any(|c| c.external_id.as_ref() == Some(external_id)) {
            return Err(ApiFailure::conflict(
                "duplicate_external_id",
                "a customer with this external_id already exists",
                Some("external_id"),
            ));
        }
    }
    let now = Utc::now();
    let customer = Customer {
        id: new_id("cus"),
        email,
        name: input.name,
        external_id: input.external_id,
        metadata: input.metadata,
        subscriptions: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store.customers.push(customer.clone());
    tracing::debug!(id = %customer.id, "created customer");
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Customer>> {
    let store = state.db.read().await;
    let customer = store.customer(&id)?;
    Ok(Json(store.expand_customer(customer)))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCustomer>,
) -> ApiResult<Json<Customer>> {
    let mut store = state.db.write().await;
    let customer = store
        .customers
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiFailure::not_found("customer", None))?;

    match input.email {
        Some(Some(email)) => {
            validate_email(&email)?;
            customer.email = email;
        }
        Some(None) => return Err(ApiFailure::invalid("email", "email cannot be cleared")),
        None => {}
    }
    if let Some(name) = input.name {
        customer.name = name;
    }
    if let Some(external_id) = input.external_id {
        customer.external_id = external_id;
    }
    if let Some(metadata) = input.metadata {
        customer.metadata = metadata.unwrap_or_default();
    }
    customer.updated_at = Utc::now();
    let customer = customer.clone();
    Ok(Json(store.expand_customer(&customer)))
}

async fn delete_customer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    let before = store.customers.len();
    store.customers.retain(|c| c.id != id);
    if store.customers.len() == before {
        return Err(ApiFailure::not_found("customer", None));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn create_portal_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(_input): Json<CreatePortalLink>,
) -> ApiResult<(StatusCode, Json<Link>)> {
    let store = state.db.read().await;
    store.customer(&id)?;
    Ok((StatusCode::CREATED, Json(link("portal"))))
}

// --- subscriptions ---

async fn list_subscriptions(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Page<Subscription>>> {
    let store = state.db.read().await;
    let subscriptions = store
        .subscriptions
        .iter()
        .filter(|s| q.customer_id.as_ref().is_none_or(|id| &s.customer_id == id))
        .filter(|s| q.status.is_none_or(|status| s.status == status))
        .cloned()
        .collect();
    paginate(subscriptions, q.limit, q.cursor.as_deref()).map(Json)
}

async fn create_subscription(
    State(state): State<AppState>,
    Json(input): Json<CreateSubscription>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let quantity = input.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(ApiFailure::invalid("quantity", "quantity must be positive"));
    }

    let mut store = state.db.write().await;
    store
        .customer(&input.customer_id)
        .map_err(|_| ApiFailure::not_found("customer", Some("customer_id")))?;

    let price_id = match (input.price_id, input.plan_key, input.price_key) {
        (Some(price_id), _, _) => {
            store
                .price(&price_id)
                .map_err(|_| ApiFailure::not_found("price", Some("price_id")))?;
            price_id
        }
        (None, Some(plan_key), Some(price_key)) => {
            let plan = store
                .plans
                .iter()
                .find(|p| p.key == plan_key)
                .ok_or_else(|| ApiFailure::not_found("plan", Some("plan_key")))?;
            store
                .prices
                .iter()
                .find(|p| p.plan_id == plan.id && p.key == price_key)
                .map(|p| p.id.clone())
                .ok_or_else(|| ApiFailure::not_found("price", Some("price_key")))?
        }
        _ => {
            return Err(ApiFailure::invalid(
                "price_id",
                "price_id or plan_key and price_key is required",
            ))
        }
    };

    let now = Utc::now();
    let subscription = Subscription {
        id: new_id("sub"),
        customer_id: input.customer_id,
        price_id,
        status: Status::Active,
        quantity,
        started_at: now,
        canceled_at: None,
        metadata: input.metadata,
        created_at: now,
    };
    store.subscriptions.push(subscription.clone());
    tracing::debug!(id = %subscription.id, "created subscription");
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn get_subscription(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Subscription>> {
    let store = state.db.read().await;
    store.subscription(&id).cloned().map(Json)
}

async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateSubscription>,
) -> ApiResult<Json<Subscription>> {
    let mut store = state.db.write().await;
    let new_price = match input.price_id {
        Some(Some(price_id)) => {
            store
                .price(&price_id)
                .map_err(|_| ApiFailure::not_found("price", Some("price_id")))?;
            Some(price_id)
        }
        Some(None) => return Err(ApiFailure::invalid("price_id", "price_id cannot be cleared")),
        None => None,
    };
    let subscription = store
        .subscriptions
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| ApiFailure::not_found("subscription", None))?;
    if subscription.status == Status::Canceled {
        return Err(ApiFailure::conflict("subscription_canceled", "subscription is canceled", None));
    }

    if let Some(price_id) = new_price {
        subscription.price_id = price_id;
    }
    match input.quantity {
        Some(Some(0)) | Some(None) => return Err(ApiFailure::invalid("quantity", "quantity must be positive")),
        Some(Some(quantity)) => subscription.quantity = quantity,
        None => {}
    }
    if let Some(metadata) = input.metadata {
        subscription.metadata = metadata.unwrap_or_default();
    }
    Ok(Json(subscription.clone()))
}

async fn cancel_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let mut store = state.db.write().await;
    let subscription = store
        .subscriptions
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| ApiFailure::not_found("subscription", None))?;
    if subscription.status != Status::Canceled {
        subscription.status = Status::Canceled;
        subscription.canceled_at = Some(Utc::now());
    }
    Ok(Json(subscription.clone()))
}

async fn create_checkout_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(_input): Json<CreateCheckoutLink>,
) -> ApiResult<(StatusCode, Json<Link>)> {
    let store = state.db.read().await;
    store.subscription(&id)?;
    Ok((StatusCode::CREATED, Json(link("checkout"))))
}

// --- usage ---

async fn record_usage(
    State(state): State<AppState>,
    Json(input): Json<RecordUsage>,
) -> ApiResult<(StatusCode, Json<UsageRecord>)> {
    if input.quantity < 0 {
        return Err(ApiFailure::invalid("quantity", "quantity must not be negative"));
    }

    let mut store = state.db.write().await;
    let subscription = store
        .subscription(&input.subscription_id)
        .map_err(|_| ApiFailure::not_found("subscription", Some("subscription_id")))?;
    if subscription.status != Status::Active {
        return Err(ApiFailure::invalid("subscription_id", "subscription is not active"));
    }

    if let Some(key) = &input.idempotency_key {
        let existing = store
            .usage
            .iter()
            .find(|r| r.subscription_id == input.subscription_id && r.idempotency_key.as_ref() == Some(key));
        if let Some(record) = existing {
            return Ok((StatusCode::OK, Json(record.clone())));
        }
    }

    let record = UsageRecord {
        id: new_id("ur"),
        subscription_id: input.subscription_id,
        product_key: input.product_key,
        quantity: input.quantity,
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
        idempotency_key: input.idempotency_key,
    };
    store.usage.push(record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn usage_summary(
    State(state): State<AppState>,
    Query(q): Query<UsageQuery>,
) -> ApiResult<Json<UsageSummary>> {
    let subscription_id = require("subscription_id", q.subscription_id)?;
    let store = state.db.read().await;
    let subscription = store.subscription(&subscription_id)?;

    let records: Vec<&UsageRecord> = store
        .usage
        .iter()
        .filter(|r| r.subscription_id == subscription_id)
        .filter(|r| q.product_key.as_ref().is_none_or(|key| &r.product_key == key))
        .collect();

    Ok(Json(UsageSummary {
        subscription_id,
        product_key: q.product_key,
        total_usage: total_usage(&records),
        record_count: records.len() as u64,
        period_start: subscription.started_at,
        period_end: subscription.started_at + Duration::days(BILLING_PERIOD_DAYS),
    }))
}

/// Sum of quantities, clamped at the `i64` bounds instead of overflowing.
fn total_usage(records: &[&UsageRecord]) -> i64 {
    records.iter().fold(0i64, |acc, r| acc.saturating_add(r.quantity))
}
