use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;
use crate::errors::ServiceError;
use crate::payments::{PaymentIntent, RegionalOrder};
use crate::AppState;

/// Checkout payload for creating or updating a card payment intent.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    /// Amount in major currency units.
    pub total: f64,
    /// Previously issued intent, present when the client retries checkout.
    #[serde(default, rename = "cardInfo")]
    pub card_info: Option<CardInfo>,
    /// Accepted for compatibility with storefront clients; unused.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CardInfo {
    #[serde(default)]
    pub id: Option<String>,
}

/// Payload for creating a regional payment order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegionalOrderRequest {
    /// Amount in rupees.
    pub amount: f64,
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/intent",
    summary = "Create or update a card payment intent",
    description = "Reuses the intent referenced by cardInfo.id when it still exists, otherwise creates a new one",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent", body = PaymentIntent),
        (status = 400, description = "Amount outside the accepted range", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Provider failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntent>, ServiceError> {
    let existing_id = request
        .card_info
        .as_ref()
        .and_then(|card| card.id.as_deref());

    let intent = state
        .services
        .payments
        .create_or_update_intent(request.total, existing_id)
        .await?;
    Ok(Json(intent))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/razorpay/order",
    summary = "Create a regional payment order",
    request_body = RegionalOrderRequest,
    responses(
        (status = 200, description = "Provider order resource", body = RegionalOrder),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Provider failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_razorpay_order(
    State(state): State<AppState>,
    Json(request): Json<RegionalOrderRequest>,
) -> Result<Json<RegionalOrder>, ServiceError> {
    let order = state
        .services
        .payments
        .create_regional_order(request.amount)
        .await?;
    Ok(Json(order))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/intent", post(create_payment_intent))
        .route("/payments/razorpay/order", post(create_razorpay_order))
        .with_auth()
}
