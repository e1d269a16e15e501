use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// JSON body returned for every failed request.
///
/// The `error` field is only populated for gateway failures that carry an
/// underlying provider message alongside the summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": "Order not found"
}))]
pub struct ErrorResponse {
    /// Human-readable failure description
    #[schema(example = "Order not found")]
    pub message: String,
    /// Underlying provider error text, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Request failed with status code 401")]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Gateway error: {message}")]
    GatewayError {
        message: String,
        detail: Option<String>,
    },

    #[error("Payment provider {0} is not configured")]
    ProviderNotConfigured(&'static str),

    #[error("Internal error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn gateway(message: impl Into<String>) -> Self {
        ServiceError::GatewayError {
            message: message.into(),
            detail: None,
        }
    }

    pub fn gateway_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ServiceError::GatewayError {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_)
            | Self::GatewayError { .. }
            | Self::ProviderNotConfigured(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message placed in the response body.
    ///
    /// Validation and not-found messages are sent verbatim so the bodies
    /// stay contract-exact ("Invalid amount.", "Order not found"). Database
    /// failures surface the driver's text; untyped internal errors stay
    /// generic.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(err) => err.to_string(),
            Self::NotFound(msg) | Self::ValidationError(msg) => msg.clone(),
            Self::GatewayError { message, .. } => message.clone(),
            Self::ProviderNotConfigured(_) => self.to_string(),
            Self::Other(_) => "Internal server error".to_string(),
        }
    }

    fn response_detail(&self) -> Option<String> {
        match self {
            Self::GatewayError { detail, .. } => detail.clone(),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            message: self.response_message(),
            error: self.response_detail(),
        };

        (status, Json(err)).into_response()
    }
}
