//! Request/response pipeline for the Tedo billing API.
//!
//! # Design
//! `Client` holds immutable configuration plus a shared `Transport`. Every
//! operation goes through the same three steps:
//! 1. `build_request`: join base URL and path, serialize the body, attach
//!    bearer auth and JSON headers.
//! 2. `Transport::execute`: one network round-trip, no retries.
//! 3. `parse_response`: status >= 400 becomes `Error::Api`, otherwise a
//!    non-empty body is decoded.
//!
//! Steps 1 and 3 are public so a host can run the I/O itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// Blocking client for the Tedo billing API.
///
/// Cheap to clone; clones share the transport. Safe to use from many
/// threads at once since no call mutates it.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    custom_transport: bool,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Client {
    /// Client for the production API with the default transport.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = Arc::new(UreqTransport::with_timeout(config.timeout));
        Self {
            config,
            transport,
            custom_transport: false,
        }
    }

    /// Build from `TEDO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        ClientConfig::from_env().map(Self::from_config)
    }

    /// Point at another environment, e.g. staging or a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the request timeout. The default transport is rebuilt to use it;
    /// a transport installed with [`Client::with_transport`] is kept as is
    /// and stays responsible for its own timeouts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        if !self.custom_transport {
            self.transport = Arc::new(UreqTransport::with_timeout(timeout));
        }
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self.custom_transport = true;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.config.normalized_base_url()
    }

    /// Build the request for `method` on `path` (relative, query included).
    pub fn build_request<B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(|b| serde_json::to_string(b).map_err(|e| Error::Serialization(e.to_string())))
            .transpose()?;
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.base_url()),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.config.api_key)),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            body,
        })
    }

    /// Interpret a response. `Ok(None)` means success with an empty body.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Option<T>> {
        if response.is_error() {
            return Err(ApiError::from_response(response.status, &response.body).into());
        }
        if response.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Perform one API call.
    pub fn send<B, T>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_request(method, path, body)?;
        let response = self.execute(&request, path)?;
        self.parse_response(response)
    }

    fn execute(&self, request: &HttpRequest, path: &str) -> Result<HttpResponse> {
        let method = request.method;
        tracing::debug!(%method, path, "sending request");

        let started = Instant::now();
        let response = self.transport.execute(request).inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "transport failure");
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if response.is_error() {
            tracing::warn!(%method, path, status = response.status, elapsed_ms, "api error response");
        } else {
            tracing::debug!(%method, path, status = response.status, elapsed_ms, "response received");
        }
        Ok(response)
    }

    /// Call an endpoint that must return a body.
    pub(crate) fn call<B, T>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(method, path, body)?
            .ok_or_else(|| Error::Deserialization("empty response body".to_string()))
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<(), T>(HttpMethod::Get, path, None)
    }

    pub(crate) fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.call(HttpMethod::Post, path, Some(body))
    }

    pub(crate) fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.call(HttpMethod::Patch, path, Some(body))
    }

    /// DELETE whose response body, if any, is ignored.
    pub(crate) fn delete(&self, path: &str) -> Result<()> {
        let request = self.build_request::<()>(HttpMethod::Delete, path, None)?;
        let response = self.execute(&request, path)?;
        if response.is_error() {
            return Err(ApiError::from_response(response.status, &response.body).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::transport::mock::MockTransport;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: String,
        count: u32,
    }

    fn client() -> Client {
        Client::new("tedo_test_key").with_base_url("http://localhost:3000/billing/v1")
    }

    fn mocked() -> (Client, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        (client().with_transport(transport.clone()), transport)
    }

    #[test]
    fn build_request_sets_required_headers() {
        let req = client().build_request::<()>(HttpMethod::Get, "/plans", None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/billing/v1/plans");
        assert_eq!(req.header("authorization"), Some("Bearer tedo_test_key"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_request_serializes_body() {
        let body = serde_json::json!({"email": "a@b.com"});
        let req = client().build_request(HttpMethod::Post, "/customers", Some(&body)).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"email":"a@b.com"}"#));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = Client::new("k").with_base_url("http://localhost:3000/billing/v1/");
        let req = client.build_request::<()>(HttpMethod::Get, "/plans", None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/billing/v1/plans");
    }

    #[test]
    fn default_base_url_is_production() {
        let req = Client::new("k").build_request::<()>(HttpMethod::Get, "/plans", None).unwrap();
        assert_eq!(req.url, "https://api.tedo.ai/billing/v1/plans");
    }

    #[test]
    fn parse_success_decodes_fields() {
        let parsed: Option<Thing> = client()
            .parse_response(HttpResponse::new(200, r#"{"id":"t_1","count":3}"#))
            .unwrap();
        assert_eq!(parsed, Some(Thing { id: "t_1".into(), count: 3 }));
    }

    #[test]
    fn parse_success_with_empty_body_leaves_destination_untouched() {
        let parsed: Option<Thing> = client().parse_response(HttpResponse::new(204, "")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_success_with_bad_json_is_deserialization_error() {
        let err = client()
            .parse_response::<Thing>(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn parse_structured_error() {
        let err = client()
            .parse_response::<Thing>(HttpResponse::new(
                404,
                r#"{"code":"not_found","message":"no such customer"}"#,
            ))
            .unwrap_err();
        assert!(err.is_not_found());
        let api = err.api().unwrap();
        assert_eq!(api.status, 404);
        assert_eq!(api.code, "not_found");
        assert_eq!(api.message, "no such customer");
    }

    #[test]
    fn parse_malformed_error_keeps_status_and_raw_text() {
        let err = client()
            .parse_response::<Thing>(HttpResponse::new(503, "upstream unavailable"))
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.api().unwrap().message, "upstream unavailable");
    }

    #[test]
    fn error_status_never_decodes_result() {
        // Body is a valid `Thing` but the status marks failure.
        let err = client()
            .parse_response::<Thing>(HttpResponse::new(409, r#"{"id":"t_1","count":3}"#))
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn send_issues_exactly_one_request() {
        let (client, transport) = mocked();
        transport.respond(500, r#"{"code":"internal","message":"boom"}"#);
        let err = client.get::<Thing>("/things/t_1").unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn transport_failure_is_not_classified() {
        let (client, transport) = mocked();
        transport.fail("connection refused");
        let err = client.get::<Thing>("/things/t_1").unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.is_not_found());
        assert!(!err.is_unauthorized());
        assert!(!err.is_validation_error());
    }

    #[test]
    fn call_requires_a_body() {
        let (client, transport) = mocked();
        transport.respond(200, "");
        let err = client.get::<Thing>("/things/t_1").unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn delete_ignores_body() {
        let (client, transport) = mocked();
        transport.respond(204, "").respond(200, "deleted");
        client.delete("/things/t_1").unwrap();
        client.delete("/things/t_2").unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn timeout_after_custom_transport_keeps_it() {
        let transport = Arc::new(MockTransport::new());
        let client = client()
            .with_transport(transport.clone())
            .with_timeout(Duration::from_secs(3));
        transport.respond(200, r#"{"id":"t_1","count":1}"#);

        let thing = client.get::<Thing>("/things/t_1").unwrap();

        assert_eq!(thing.id, "t_1");
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(client.config().timeout, Duration::from_secs(3));
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
