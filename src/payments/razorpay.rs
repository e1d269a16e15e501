use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{ProviderError, RegionalOrder, RegionalOrderProvider};

/// Hard ceiling on how long an order-create call may take.
const REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Razorpay order gateway.
///
/// Creates orders through `/v1/orders` with JSON requests and basic
/// authentication. The base URL is configurable so tests can point the
/// gateway at a local mock server.
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(
        key_id: String,
        key_secret: String,
        base_url: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(key_id, key_secret, base_url, client))
    }

    /// Build a gateway from an existing client (useful for testing).
    pub fn with_client(
        key_id: String,
        key_secret: String,
        base_url: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url,
            key_id,
            key_secret,
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl RegionalOrderProvider for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<Option<RegionalOrder>, ProviderError> {
        let response = self
            .client
            .post(self.orders_url())
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({ "amount": amount_minor, "currency": currency }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(classify_error(status, &body));
        }

        let payload = response.json::<Value>().await?;
        order_from_payload(payload)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    description: Option<String>,
}

fn classify_error(status: StatusCode, body: &[u8]) -> ProviderError {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    let message = envelope
        .error
        .description
        .unwrap_or_else(|| format!("regional provider returned status {status}"));
    ProviderError::Api { message }
}

/// A success response without an order id counts as "no order created".
fn order_from_payload(payload: Value) -> Result<Option<RegionalOrder>, ProviderError> {
    if payload.get("id").and_then(Value::as_str).is_none() {
        return Ok(None);
    }
    let order = serde_json::from_value(payload).map_err(|err| ProviderError::Api {
        message: format!("unexpected order payload from regional provider: {err}"),
    })?;
    Ok(Some(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn full_order_payload_is_accepted() {
        let payload = serde_json::json!({
            "id": "order_Nxk2Yw7QbT",
            "entity": "order",
            "amount": 50000,
            "currency": "INR",
            "status": "created",
            "receipt": null,
        });

        let order = order_from_payload(payload).unwrap().unwrap();
        assert_eq!(order.id, "order_Nxk2Yw7QbT");
        assert_eq!(order.amount, 50000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.extra.get("status").unwrap(), "created");
    }

    #[test]
    fn payload_without_an_id_is_treated_as_no_order() {
        assert!(order_from_payload(serde_json::json!({})).unwrap().is_none());
        assert!(order_from_payload(serde_json::json!({ "entity": "order" }))
            .unwrap()
            .is_none());
    }

    #[test]
    fn malformed_order_payload_is_an_api_error() {
        let payload = serde_json::json!({ "id": "order_1", "amount": "fifty", "currency": "INR" });
        assert_matches!(order_from_payload(payload), Err(ProviderError::Api { .. }));
    }

    #[test]
    fn error_description_is_surfaced() {
        let body = br#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The amount must be atleast INR 1.00"}}"#;
        assert_matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            ProviderError::Api { message } if message == "The amount must be atleast INR 1.00"
        );
    }

    #[test]
    fn unparseable_error_body_falls_back_to_the_status() {
        let err = classify_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream down");
        assert_matches!(err, ProviderError::Api { message } if message.contains("503"));
    }
}
