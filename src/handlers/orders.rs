use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::order::Model as OrderModel;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderHistory};
use crate::AppState;

/// Pagination parameters for the order history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    8
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Place an order",
    description = "Persist an order for the authenticated customer and kick off stock adjustment",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderModel),
        (status = 400, description = "Invalid order body", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderModel>), ServiceError> {
    let order = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;

    // Inventory moves after the response; failures only show up in the logs.
    state
        .services
        .stock
        .adjust_for_cart_detached(order.cart.clone());

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/razorpay",
    summary = "Place an order paid through the regional provider",
    description = "Same contract as placing an order; called once the regional provider confirms payment",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderModel),
        (status = 400, description = "Invalid order body", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn confirm_razorpay_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderModel>), ServiceError> {
    let order = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;

    state
        .services
        .stock
        .adjust_for_cart_detached(order.cart.clone());

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List the caller's orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 8)"),
    ),
    responses(
        (status = 200, description = "Order history page with status aggregates", body = OrderHistory),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<OrderHistory>, ServiceError> {
    let history = state
        .services
        .orders
        .customer_orders(auth_user.user_id, query.page, query.limit)
        .await?;
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get one of the caller's orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderModel),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such order for this user", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderModel>, ServiceError> {
    // A malformed id is indistinguishable from an absent one.
    let order_id =
        Uuid::parse_str(&id).map_err(|_| ServiceError::NotFound("Order not found".to_string()))?;

    let order = state
        .services
        .orders
        .get_order_for_user(auth_user.user_id, order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    Ok(Json(order))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/razorpay", post(confirm_razorpay_order))
        .route("/orders/:id", get(get_order))
        .with_auth()
}
