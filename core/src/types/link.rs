use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived capability link issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Link {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Hosted checkout page for a subscription.
pub type CheckoutLink = Link;

/// Hosted self-service portal for a customer.
pub type PortalLink = Link;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckoutLinkParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePortalLinkParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    #[test]
    fn expiry() {
        let link: Link = serde_json::from_value(json!({
            "url": "https://pay.tedo.ai/c/tok_1",
            "token": "tok_1",
            "expires_at": "2026-06-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!link.is_expired_at(link.expires_at - Duration::seconds(1)));
        assert!(link.is_expired_at(link.expires_at));
    }

    #[test]
    fn empty_params_serialize_to_empty_object() {
        assert_eq!(serde_json::to_value(CreatePortalLinkParams::default()).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(CreateCheckoutLinkParams::default()).unwrap(), json!({}));
    }
}
