//! Pluggable HTTP execution.
//!
//! # Design
//! `Transport` is the only place that touches the network. The client hands
//! it a fully built `HttpRequest` and expects back whatever the server said,
//! including 4xx/5xx responses: status interpretation belongs to the client,
//! so implementations must not turn error statuses into `Err`.
//!
//! `UreqTransport` is the default. Swap in another implementation for custom
//! timeouts, proxies, interceptors, or an in-memory fake in tests.

use std::time::Duration;

use crate::config::DEFAULT_TIMEOUT;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP request. Shared across threads by every clone of a
/// `Client`, so implementations must be safe for concurrent use.
pub trait Transport: Send + Sync {
    /// Perform exactly one round-trip. Only failures that prevent a response
    /// from being received are errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        // Error statuses must come back as data for the client to parse.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap a preconfigured agent. It must have `http_status_as_error(false)`.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Delete => {
                let mut builder = self.agent.delete(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Patch => {
                let mut builder = if request.method == HttpMethod::Post {
                    self.agent.post(url)
                } else {
                    self.agent.patch(url)
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(format!("read response: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
