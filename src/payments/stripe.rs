use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{CardIntentProvider, PaymentIntent, ProviderError};

/// Stripe payment-intent gateway.
///
/// Talks to the `/v1/payment_intents` API with form-encoded requests and
/// bearer authentication. The base URL is configurable so tests can point
/// the gateway at a local mock server.
pub struct StripeGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, base_url: String) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(secret_key, base_url, client))
    }

    /// Build a gateway from an existing client (useful for testing).
    pub fn with_client(secret_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url,
            secret_key,
        }
    }

    fn intents_url(&self) -> String {
        format!("{}/v1/payment_intents", self.base_url.trim_end_matches('/'))
    }

    fn intent_url(&self, intent_id: &str) -> String {
        format!("{}/{}", self.intents_url(), intent_id)
    }

    async fn send_intent_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<PaymentIntent, ProviderError> {
        let response = request.bearer_auth(&self.secret_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(classify_error(status, &body));
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CardIntentProvider for StripeGateway {
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProviderError> {
        self.send_intent_request(self.client.get(self.intent_url(intent_id)))
            .await
    }

    async fn update_intent_amount(
        &self,
        intent_id: &str,
        amount_minor: i64,
    ) -> Result<PaymentIntent, ProviderError> {
        let params = [("amount", amount_minor.to_string())];
        self.send_intent_request(self.client.post(self.intent_url(intent_id)).form(&params))
            .await
    }

    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        description: &str,
    ) -> Result<PaymentIntent, ProviderError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("description", description.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        self.send_intent_request(self.client.post(self.intents_url()).form(&params))
            .await
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Map a non-success Stripe response to a [`ProviderError`].
///
/// Stripe reports a missing intent with the error code `resource_missing`;
/// that case is surfaced separately so callers can fall back to creating a
/// new intent.
fn classify_error(status: StatusCode, body: &[u8]) -> ProviderError {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    if envelope.error.code.as_deref() == Some("resource_missing") {
        return ProviderError::NotFound;
    }
    let message = envelope
        .error
        .message
        .unwrap_or_else(|| format!("card provider returned status {status}"));
    ProviderError::Api { message }
}
