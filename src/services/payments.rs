use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::payments::{
    to_minor_units, CardIntentProvider, PaymentIntent, ProviderError, RegionalOrder,
    RegionalOrderProvider, CARD_INTENT_CURRENCY, REGIONAL_ORDER_CURRENCY,
};

/// Bounds and wording applied to card intent requests.
#[derive(Debug, Clone)]
pub struct IntentPolicy {
    pub min_amount: f64,
    pub max_amount: f64,
    pub description: String,
}

impl From<&AppConfig> for IntentPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_amount: config.min_amount,
            max_amount: config.max_amount,
            description: config.payment_description.clone(),
        }
    }
}

/// Checkout-facing payment operations over the configured providers.
///
/// Providers are optional: a storefront without processor credentials
/// still serves orders, and only the payment endpoints error out.
pub struct PaymentService {
    card: Option<Arc<dyn CardIntentProvider>>,
    regional: Option<Arc<dyn RegionalOrderProvider>>,
    policy: IntentPolicy,
}

impl PaymentService {
    pub fn new(
        card: Option<Arc<dyn CardIntentProvider>>,
        regional: Option<Arc<dyn RegionalOrderProvider>>,
        policy: IntentPolicy,
    ) -> Self {
        Self {
            card,
            regional,
            policy,
        }
    }

    /// Create a card payment intent, or update the amount of an existing one.
    ///
    /// The bounds check is written so that a NaN amount also fails it.
    /// When the referenced intent no longer exists on the provider side the
    /// flow falls through to creating a fresh intent; any other retrieval
    /// failure aborts without creating anything.
    #[instrument(skip(self), fields(amount = amount, has_existing = existing_intent_id.is_some()))]
    pub async fn create_or_update_intent(
        &self,
        amount: f64,
        existing_intent_id: Option<&str>,
    ) -> Result<PaymentIntent, ServiceError> {
        if !(amount >= self.policy.min_amount && amount <= self.policy.max_amount) {
            return Err(ServiceError::ValidationError("Invalid amount.".to_string()));
        }

        let card = self
            .card
            .as_ref()
            .ok_or(ServiceError::ProviderNotConfigured("Stripe"))?;
        let amount_minor = to_minor_units(amount, CARD_INTENT_CURRENCY);

        if let Some(intent_id) = existing_intent_id {
            match card.retrieve_intent(intent_id).await {
                Ok(_) => {
                    let updated = card
                        .update_intent_amount(intent_id, amount_minor)
                        .await
                        .map_err(gateway_error)?;
                    info!(intent_id = %updated.id, amount_minor, "Payment intent amount updated");
                    return Ok(updated);
                }
                Err(ProviderError::NotFound) => {
                    warn!(
                        intent_id,
                        "Referenced payment intent no longer exists; creating a new one"
                    );
                }
                Err(err) => {
                    error!(error = %err, intent_id, "Payment intent retrieval failed");
                    return Err(gateway_error(err));
                }
            }
        }

        let intent = card
            .create_intent(amount_minor, CARD_INTENT_CURRENCY, &self.policy.description)
            .await
            .map_err(gateway_error)?;
        info!(intent_id = %intent.id, amount_minor, "Payment intent created");
        Ok(intent)
    }

    /// Create a regional payment order for an amount in rupees.
    #[instrument(skip(self), fields(amount = amount))]
    pub async fn create_regional_order(&self, amount: f64) -> Result<RegionalOrder, ServiceError> {
        let regional = self
            .regional
            .as_ref()
            .ok_or(ServiceError::ProviderNotConfigured("Razorpay"))?;
        let amount_minor = to_minor_units(amount, REGIONAL_ORDER_CURRENCY);

        match regional
            .create_order(amount_minor, REGIONAL_ORDER_CURRENCY)
            .await
        {
            Ok(Some(order)) => {
                info!(order_id = %order.id, amount_minor, "Regional payment order created");
                Ok(order)
            }
            Ok(None) => {
                error!(amount_minor, "Regional provider returned no order");
                Err(ServiceError::gateway("Error occurred when creating order!"))
            }
            Err(err) => {
                error!(error = %err, amount_minor, "Regional order creation failed");
                Err(ServiceError::gateway_with_detail(
                    "Error occurred while creating Razorpay order",
                    err.to_string(),
                ))
            }
        }
    }
}

fn gateway_error(err: ProviderError) -> ServiceError {
    match err {
        ProviderError::Api { message } => ServiceError::gateway(message),
        other => ServiceError::gateway(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{MockCardIntentProvider, MockRegionalOrderProvider};
    use assert_matches::assert_matches;
    use mockall::predicate::eq;
    use test_case::test_case;

    fn policy() -> IntentPolicy {
        IntentPolicy {
            min_amount: 0.5,
            max_amount: 1000.0,
            description: "Storefront purchase".to_string(),
        }
    }

    fn card_service(card: MockCardIntentProvider) -> PaymentService {
        PaymentService::new(Some(Arc::new(card)), None, policy())
    }

    fn regional_service(regional: MockRegionalOrderProvider) -> PaymentService {
        PaymentService::new(None, Some(Arc::new(regional)), policy())
    }

    fn intent(id: &str, amount: i64) -> PaymentIntent {
        PaymentIntent {
            id: id.to_string(),
            amount,
            currency: "usd".to_string(),
            client_secret: Some(format!("{id}_secret")),
            extra: serde_json::Map::new(),
        }
    }

    fn regional_order(id: &str, amount: i64) -> RegionalOrder {
        RegionalOrder {
            id: id.to_string(),
            amount,
            currency: "INR".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[test_case(0.49)]
    #[test_case(1000.01)]
    #[test_case(-1.0)]
    #[test_case(f64::NAN)]
    #[tokio::test]
    async fn out_of_range_amount_is_rejected_before_any_provider_call(amount: f64) {
        let service = PaymentService::new(None, None, policy());

        let err = service
            .create_or_update_intent(amount, None)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg == "Invalid amount.");
    }

    #[test_case(0.5, 50)]
    #[test_case(1000.0, 100_000)]
    #[tokio::test]
    async fn boundary_amounts_are_accepted(amount: f64, expected_minor: i64) {
        let mut card = MockCardIntentProvider::new();
        card.expect_create_intent()
            .with(eq(expected_minor), eq("usd"), eq("Storefront purchase"))
            .times(1)
            .returning(|amount_minor, _, _| Ok(intent("pi_new", amount_minor)));

        let created = card_service(card)
            .create_or_update_intent(amount, None)
            .await
            .unwrap();
        assert_eq!(created.amount, expected_minor);
    }

    #[tokio::test]
    async fn existing_intent_gets_its_amount_updated() {
        let mut card = MockCardIntentProvider::new();
        card.expect_retrieve_intent()
            .with(eq("pi_live"))
            .times(1)
            .returning(|id| Ok(intent(id, 100)));
        card.expect_update_intent_amount()
            .with(eq("pi_live"), eq(1050))
            .times(1)
            .returning(|id, amount_minor| Ok(intent(id, amount_minor)));

        let updated = card_service(card)
            .create_or_update_intent(10.5, Some("pi_live"))
            .await
            .unwrap();
        assert_eq!(updated.id, "pi_live");
        assert_eq!(updated.amount, 1050);
    }

    #[tokio::test]
    async fn vanished_intent_falls_through_to_creation() {
        let mut card = MockCardIntentProvider::new();
        card.expect_retrieve_intent()
            .with(eq("pi_gone"))
            .times(1)
            .returning(|_| Err(ProviderError::NotFound));
        card.expect_create_intent()
            .with(eq(1050), eq("usd"), eq("Storefront purchase"))
            .times(1)
            .returning(|amount_minor, _, _| Ok(intent("pi_replacement", amount_minor)));

        let created = card_service(card)
            .create_or_update_intent(10.5, Some("pi_gone"))
            .await
            .unwrap();
        assert_eq!(created.id, "pi_replacement");
    }

    #[tokio::test]
    async fn other_retrieval_failures_do_not_create_a_new_intent() {
        let mut card = MockCardIntentProvider::new();
        card.expect_retrieve_intent()
            .with(eq("pi_live"))
            .times(1)
            .returning(|_| {
                Err(ProviderError::Api {
                    message: "Expired API Key provided".to_string(),
                })
            });

        let err = card_service(card)
            .create_or_update_intent(10.5, Some("pi_live"))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::GatewayError { message, .. } if message == "Expired API Key provided"
        );
    }

    #[tokio::test]
    async fn unconfigured_card_provider_is_a_server_error() {
        let service = PaymentService::new(None, None, policy());

        let err = service
            .create_or_update_intent(10.5, None)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ProviderNotConfigured("Stripe"));
    }

    #[tokio::test]
    async fn regional_amount_is_sent_in_paise() {
        let mut regional = MockRegionalOrderProvider::new();
        regional
            .expect_create_order()
            .with(eq(50_000), eq("INR"))
            .times(1)
            .returning(|amount_minor, _| Ok(Some(regional_order("order_1", amount_minor))));

        let order = regional_service(regional)
            .create_regional_order(500.0)
            .await
            .unwrap();
        assert_eq!(order.amount, 50_000);
        assert_eq!(order.currency, "INR");
    }

    #[tokio::test]
    async fn missing_regional_order_payload_is_reported() {
        let mut regional = MockRegionalOrderProvider::new();
        regional
            .expect_create_order()
            .times(1)
            .returning(|_, _| Ok(None));

        let err = regional_service(regional)
            .create_regional_order(500.0)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::GatewayError { message, detail: None }
                if message == "Error occurred when creating order!"
        );
    }

    #[tokio::test]
    async fn regional_failure_carries_the_underlying_error() {
        let mut regional = MockRegionalOrderProvider::new();
        regional.expect_create_order().times(1).returning(|_, _| {
            Err(ProviderError::Api {
                message: "The amount must be atleast INR 1.00".to_string(),
            })
        });

        let err = regional_service(regional)
            .create_regional_order(500.0)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::GatewayError { message, detail: Some(detail) }
                if message == "Error occurred while creating Razorpay order"
                    && detail == "The amount must be atleast INR 1.00"
        );
    }
}
