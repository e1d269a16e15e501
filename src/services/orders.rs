use std::sync::Arc;

use chrono::Utc;
use futures::try_join;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::DbPool;
use crate::entities::order::{
    self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel, OrderStatus,
};
use crate::errors::ServiceError;

/// Fields a customer submits when placing an order.
///
/// Any client-supplied user reference is ignored; the owner is always the
/// authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Cart lines as submitted, stored verbatim on the order.
    #[validate(custom = "validate_cart")]
    #[schema(value_type = Object)]
    pub cart: serde_json::Value,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    #[serde(default)]
    pub shipping_option: Option<String>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
}

fn validate_cart(cart: &serde_json::Value) -> Result<(), ValidationError> {
    if cart.is_array() {
        Ok(())
    } else {
        Err(ValidationError::new("cart_must_be_an_array"))
    }
}

/// Per-status aggregate reported in the order history.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct StatusSummary {
    pub count: i64,
    #[schema(value_type = String)]
    pub total: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct StatusBucket {
    status: String,
    count: i64,
    total: Option<Decimal>,
}

/// One customer's order history page plus status aggregates.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderHistory {
    pub orders: Vec<OrderModel>,
    /// Effective page size.
    pub limits: u64,
    /// Requested page number.
    pub pages: u64,
    pub pending: StatusSummary,
    pub processing: StatusSummary,
    pub delivered: StatusSummary,
    /// Order count across all statuses.
    #[serde(rename = "totalDoc")]
    pub total_doc: u64,
}

/// Service for creating and reading customer orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Persist a new order owned by `user_id`.
    ///
    /// Identity, invoice number, status, and timestamps are always
    /// server-generated.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let invoice = rand::thread_rng().gen_range(1_000_000i64..10_000_000);

        let order = OrderActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            invoice: Set(invoice),
            cart: Set(request.cart),
            payment_method: Set(request.payment_method),
            shipping_option: Set(request.shipping_option),
            subtotal: Set(request.subtotal),
            shipping_cost: Set(request.shipping_cost),
            discount: Set(request.discount),
            total: Set(request.total),
            status: Set(OrderStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let order = order.insert(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to persist order");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, invoice = order.invoice, "Order created");
        Ok(order)
    }

    /// Fetch one order, scoped to its owner.
    ///
    /// Returns `None` both for ids that do not exist and for orders owned
    /// by a different user; callers cannot tell the two apart.
    #[instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn get_order_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderModel>, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })
    }

    /// Load one page of a customer's orders plus their status aggregates.
    ///
    /// Orders come back newest first; creation times can collide, so the id
    /// breaks ties to keep pages stable.
    #[instrument(skip(self), fields(user_id = %user_id, page = page, limit = limit))]
    pub async fn customer_orders(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<OrderHistory, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1) * limit;

        let total_doc = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .count(db);

        let orders = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(db);

        let buckets = OrderEntity::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(Expr::col(order::Column::Id).count(), "count")
            .column_as(Expr::col(order::Column::Total).sum(), "total")
            .filter(order::Column::UserId.eq(user_id))
            .group_by(order::Column::Status)
            .into_model::<StatusBucket>()
            .all(db);

        let (total_doc, orders, buckets) =
            try_join!(total_doc, orders, buckets).map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to load customer order history");
                ServiceError::DatabaseError(e)
            })?;

        let mut history = OrderHistory {
            orders,
            limits: limit,
            pages: page,
            pending: StatusSummary::default(),
            processing: StatusSummary::default(),
            delivered: StatusSummary::default(),
            total_doc,
        };

        for bucket in buckets {
            let summary = StatusSummary {
                count: bucket.count,
                total: bucket.total.unwrap_or(Decimal::ZERO),
            };
            match bucket.status.as_str() {
                s if s == OrderStatus::Pending.as_ref() => history.pending = summary,
                s if s == OrderStatus::Processing.as_ref() => history.processing = summary,
                s if s == OrderStatus::Delivered.as_ref() => history.delivered = summary,
                _ => {}
            }
        }

        info!(
            user_id = %user_id,
            total = total_doc,
            returned = history.orders.len(),
            "Customer order history loaded"
        );
        Ok(history)
    }
}
