use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product::{self, Entity as ProductEntity};
use crate::errors::ServiceError;

/// The slice of a cart line the stock adjuster cares about.
#[derive(Debug, Clone, Deserialize)]
struct CartLine {
    product_id: Uuid,
    quantity: i32,
}

/// Applies sold cart quantities to product stock and sales counters.
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Decrement stock and bump sales for every line in the cart.
    ///
    /// Carts are stored as the client submitted them, so lines without a
    /// product id and positive quantity are skipped rather than rejected.
    #[instrument(skip(self, cart))]
    pub async fn adjust_for_cart(&self, cart: &serde_json::Value) -> Result<(), ServiceError> {
        let Some(lines) = cart.as_array() else {
            warn!("Order cart is not an array; skipping stock adjustment");
            return Ok(());
        };

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        for line in lines {
            let line: CartLine = match serde_json::from_value(line.clone()) {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "Skipping cart line without product id/quantity");
                    continue;
                }
            };
            if line.quantity <= 0 {
                continue;
            }

            let product = ProductEntity::find_by_id(line.product_id)
                .one(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, product_id = %line.product_id, "Failed to load product for stock adjustment");
                    ServiceError::DatabaseError(e)
                })?;

            let Some(product) = product else {
                warn!(product_id = %line.product_id, "Cart references an unknown product; stock unchanged");
                continue;
            };

            let mut active_product: product::ActiveModel = product.clone().into();
            active_product.stock = Set(product.stock - line.quantity);
            active_product.sales = Set(product.sales + line.quantity);
            active_product.updated_at = Set(Some(now));

            active_product.update(&txn).await.map_err(|e| {
                error!(error = %e, product_id = %line.product_id, "Failed to adjust product stock");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        Ok(())
    }

    /// Run the cart adjustment as a detached task.
    ///
    /// Order creation responds before inventory moves; failures are logged
    /// and never reach the client.
    pub fn adjust_for_cart_detached(&self, cart: serde_json::Value) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.adjust_for_cart(&cart).await {
                error!(error = %err, "Detached stock adjustment failed");
            }
        });
    }
}
