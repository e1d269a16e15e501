//! Payment provider integrations.
//!
//! Card payments go through a Stripe-style payment-intent API, regional
//! payments through a Razorpay-style order API. Handlers and services only
//! see the [`CardIntentProvider`] and [`RegionalOrderProvider`] traits so
//! the HTTP gateways can be swapped for mocks in tests.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

mod razorpay;
mod stripe;

pub use razorpay::RazorpayGateway;
pub use stripe::StripeGateway;

/// Currency used for card payment intents.
pub const CARD_INTENT_CURRENCY: &str = "usd";

/// Currency used for regional payment orders.
pub const REGIONAL_ORDER_CURRENCY: &str = "INR";

/// Failure modes shared by all payment gateways.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The referenced remote resource does not exist.
    #[error("payment resource not found")]
    NotFound,
    /// The provider rejected the request and reported a reason.
    #[error("{message}")]
    Api { message: String },
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A card payment intent as returned by the provider.
///
/// Only the fields the storefront relies on are typed; everything else the
/// provider sends is preserved in `extra` and passed through to the client
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A regional payment order as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegionalOrder {
    pub id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Provider of card payment intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardIntentProvider: Send + Sync {
    /// Fetch an existing intent by id.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProviderError>;

    /// Change the amount of an existing intent.
    async fn update_intent_amount(
        &self,
        intent_id: &str,
        amount_minor: i64,
    ) -> Result<PaymentIntent, ProviderError>;

    /// Create a fresh intent with automatic payment methods enabled.
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        description: &str,
    ) -> Result<PaymentIntent, ProviderError>;
}

/// Provider of regional payment orders.
///
/// `Ok(None)` means the provider answered successfully but did not return
/// an order payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionalOrderProvider: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<Option<RegionalOrder>, ProviderError>;
}

/// ISO currencies that are not divided into hundredths.
static ZERO_DECIMAL_CURRENCIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd",
        "vuv", "xaf", "xof", "xpf",
    ]
    .into_iter()
    .collect()
});

/// Convert a decimal amount into the minor unit the providers expect.
///
/// Two-decimal currencies are multiplied by 100; zero-decimal currencies
/// are passed through. Rounds to the nearest whole unit.
pub fn to_minor_units(amount: f64, currency: &str) -> i64 {
    if ZERO_DECIMAL_CURRENCIES.contains(currency.to_ascii_lowercase().as_str()) {
        amount.round() as i64
    } else {
        (amount * 100.0).round() as i64
    }
}
