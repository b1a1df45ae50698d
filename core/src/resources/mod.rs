//! One `impl Client` block per resource kind. Each accessor only picks a
//! verb, a path and a payload; everything else lives in `client`.

mod customers;
mod entitlements;
mod plans;
mod prices;
mod subscriptions;
mod usage;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::client::Client;
    use crate::transport::mock::MockTransport;

    pub const BASE: &str = "http://mock/billing/v1";

    pub fn mocked() -> (Client, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let client = Client::new("tedo_test_key")
            .with_base_url(BASE)
            .with_transport(transport.clone());
        (client, transport)
    }
}
