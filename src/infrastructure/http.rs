use crate::domain::ports::{InitiateAck, PaymentGateway, StatusReport, StkPushRequest};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

// Per-request ceiling, distinct from the session's polling ceiling.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Gateway adapter over the storefront backend's M-PESA endpoints.
///
/// `POST {base}/mpesa/stk-push` initiates a payment and
/// `GET {base}/mpesa/status?checkoutRequestId=…` checks on one. Both are
/// single round-trips; non-2xx and malformed bodies surface as transport
/// errors for the session to classify.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn initiate(&self, request: &StkPushRequest) -> Result<InitiateAck> {
        let url = format!("{}/mpesa/stk-push", self.base_url);
        debug!(%url, order_id = %request.order_id, "sending STK push request");

        let response = self.client.post(&url).json(request).send().await?;
        let ack = response.error_for_status()?.json::<InitiateAck>().await?;
        Ok(ack)
    }

    async fn check_status(&self, checkout_request_id: &str) -> Result<StatusReport> {
        let url = format!("{}/mpesa/status", self.base_url);
        debug!(%url, %checkout_request_id, "checking payment status");

        let response = self
            .client
            .get(&url)
            .query(&[("checkoutRequestId", checkout_request_id)])
            .send()
            .await?;
        let report = response.error_for_status()?.json::<StatusReport>().await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        let gateway = HttpGateway::new("http://localhost:8000/").unwrap();
        assert_eq!(gateway.base_url, "http://localhost:8000");
    }
}
