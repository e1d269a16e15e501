use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = r#"
Customer-facing order and payment API for the storefront.

All endpoints require a JWT in the Authorization header:

```
Authorization: Bearer <token>
```

Failure responses carry `{"message": ...}` plus an optional `"error"`
detail field.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Customer order placement and history"),
        (name = "Payments", description = "Payment intent and regional order creation")
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::confirm_razorpay_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::payments::create_payment_intent,
        crate::handlers::payments::create_razorpay_order,
    ),
    components(
        schemas(
            crate::entities::order::Model,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderHistory,
            crate::services::orders::StatusSummary,
            crate::handlers::payments::PaymentIntentRequest,
            crate::handlers::payments::CardInfo,
            crate::handlers::payments::RegionalOrderRequest,
            crate::payments::PaymentIntent,
            crate::payments::RegionalOrder,
            crate::errors::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_the_api_surface() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/payments/intent"));
        assert!(json.contains("Bearer"));
    }
}
