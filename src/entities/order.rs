use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use utoipa::ToSchema;
use uuid::Uuid;

/// Customer order. The cart is stored as the JSON array the client
/// submitted; `user_id` always comes from the authenticated identity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
#[schema(as = Order)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// Server-generated invoice number
    pub invoice: i64,

    /// Ordered list of {product_id, quantity, price, ...} items
    #[schema(value_type = Object)]
    pub cart: Json,

    pub payment_method: String,
    pub shipping_option: Option<String>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle states. Stored as plain strings so the column matches
/// what dashboards and the status-update path (managed elsewhere) write.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_as_stored_string() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Processing.as_ref(), "Processing");
        assert_eq!(OrderStatus::Delivered.as_ref(), "Delivered");
        assert_eq!(OrderStatus::Cancel.as_ref(), "Cancel");
    }
}
