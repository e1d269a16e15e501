pub mod orders;
pub mod payments;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::payments::{CardIntentProvider, RegionalOrderProvider};
use crate::services::orders::OrderService;
use crate::services::payments::{IntentPolicy, PaymentService};
use crate::services::stock::StockService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub stock: Arc<StockService>,
}

impl AppServices {
    /// Wire the service layer over one database pool and the payment
    /// providers resolved at startup.
    pub fn new(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        card: Option<Arc<dyn CardIntentProvider>>,
        regional: Option<Arc<dyn RegionalOrderProvider>>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone())),
            payments: Arc::new(PaymentService::new(
                card,
                regional,
                IntentPolicy::from(config),
            )),
            stock: Arc::new(StockService::new(db_pool)),
        }
    }
}
