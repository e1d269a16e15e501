use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{order, product, store_setting},
    payments::{CardIntentProvider, RegionalOrderProvider},
    services::settings::STORE_SETTING_NAME,
    AppServices, AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "integration_test_jwt_secret_0123456789_abcdefghijklmnopqrstuvwxyz_ABCDEF";

/// Harness that runs the real router over a throwaway SQLite database.
///
/// Every instance gets its own temporary database file, so tests are free
/// to run in parallel without stepping on each other's state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub user_id: Uuid,
    token: String,
    auth_service: Arc<AuthService>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a test application without payment providers.
    pub async fn new() -> Self {
        Self::with_providers(None, None).await
    }

    /// Construct a test application with the given payment providers, the
    /// same way the binary wires them from stored credentials.
    pub async fn with_providers(
        card: Option<Arc<dyn CardIntentProvider>>,
        regional: Option<Arc<dyn RegionalOrderProvider>>,
    ) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.payment_description = "Storefront order".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("connect to test database");
        db::run_migrations(&pool).await.expect("run migrations");

        let db_arc = Arc::new(pool);
        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let services = AppServices::new(db_arc.clone(), &cfg, card, regional);

        let state = AppState {
            db: db_arc,
            config: Arc::new(cfg),
            services,
        };

        // Same layering as the binary: the auth service rides in request
        // extensions for the route-level auth middleware.
        let auth_for_layer = auth_service.clone();
        let router = Router::new()
            .merge(storefront_api::health_routes())
            .nest("/api/v1", storefront_api::api_v1_routes())
            .layer(axum::middleware::from_fn_with_state(
                auth_for_layer,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        let user_id = Uuid::new_v4();
        let token = auth_service
            .issue_token(user_id, Some("Test Customer"), Some("customer@example.com"))
            .expect("issue test token");

        Self {
            router,
            state,
            user_id,
            token,
            auth_service,
            _db_dir: db_dir,
        }
    }

    /// Bearer token for the default test customer.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Mint a token for a different customer.
    #[allow(dead_code)]
    pub fn token_for(&self, user_id: Uuid) -> String {
        self.auth_service
            .issue_token(user_id, Some("Other Customer"), Some("other@example.com"))
            .expect("issue test token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests from the default customer.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Insert a product row for stock-adjustment tests.
    #[allow(dead_code)]
    pub async fn seed_product(&self, title: &str, stock: i32) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            stock: Set(stock),
            sales: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    /// Insert an order row directly, bypassing the API.
    #[allow(dead_code)]
    pub async fn seed_order(
        &self,
        user_id: Uuid,
        status: &str,
        total: Decimal,
        created_at: DateTime<Utc>,
    ) -> order::Model {
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            invoice: Set(1_000_000),
            cart: Set(serde_json::json!([])),
            payment_method: Set("Card".to_string()),
            shipping_option: Set(None),
            subtotal: Set(total),
            shipping_cost: Set(Decimal::ZERO),
            discount: Set(Decimal::ZERO),
            total: Set(total),
            status: Set(status.to_string()),
            created_at: Set(created_at),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed order")
    }

    /// Insert the dashboard-managed settings row.
    #[allow(dead_code)]
    pub async fn seed_settings(&self, setting: Value) -> store_setting::Model {
        store_setting::ActiveModel {
            name: Set(STORE_SETTING_NAME.to_string()),
            setting: Set(setting),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed store settings")
    }
}
