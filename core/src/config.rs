//! Client configuration.
//!
//! A `ClientConfig` is fixed once a `Client` is built. The API key is
//! redacted from `Debug` output.

use std::{env, fmt, time::Duration};

use crate::error::{Error, Result};

/// Production endpoint for the billing API.
pub const DEFAULT_BASE_URL: &str = "https://api.tedo.ai/billing/v1";

/// Per-request timeout of the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_KEY: &str = "TEDO_API_KEY";
pub const ENV_BASE_URL: &str = "TEDO_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TEDO_TIMEOUT_SECS";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from `TEDO_API_KEY`, `TEDO_BASE_URL` and `TEDO_TIMEOUT_SECS`.
    ///
    /// Only the API key is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{ENV_API_KEY} is not set")))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}")))?;
            if secs == 0 {
                return Err(Error::Config(format!("{ENV_TIMEOUT_SECS} must be greater than zero")));
            }
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("tedo_test_123");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn env_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ENV_API_KEY)));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "tedo_test_abc"),
            (ENV_BASE_URL, "http://localhost:4010/billing/v1/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "tedo_test_abc");
        assert_eq!(config.normalized_base_url(), "http://localhost:4010/billing/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_rejects_bad_timeout() {
        for raw in ["soon", "0", "-3"] {
            let result = ClientConfig::from_lookup(lookup(&[
                (ENV_API_KEY, "tedo_test_abc"),
                (ENV_TIMEOUT_SECS, raw),
            ]));
            assert!(matches!(result, Err(Error::Config(_))), "{raw}");
        }
    }

    #[test]
    fn debug_hides_api_key() {
        let rendered = format!("{:?}", ClientConfig::new("tedo_live_supersecret"));
        assert!(!rendered.contains("supersecret"));
    }
}
