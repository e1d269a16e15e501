use std::sync::Arc;

use sea_orm::EntityTrait;
use serde::Deserialize;
use tracing::{error, instrument, warn};

use crate::db::DbPool;
use crate::entities::store_setting::Entity as StoreSettingEntity;
use crate::errors::ServiceError;

/// Name of the singleton row carrying storefront-wide settings.
pub const STORE_SETTING_NAME: &str = "storeSetting";

/// Payment credentials extracted from the dashboard-managed settings row.
///
/// The row carries many more fields (branding, currency display, ...);
/// everything not listed here is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentCredentials {
    #[serde(default)]
    pub stripe_secret: Option<String>,
    #[serde(default)]
    pub razorpay_id: Option<String>,
    #[serde(default)]
    pub razorpay_secret: Option<String>,
}

impl PaymentCredentials {
    /// The card-provider secret, if one is configured and non-empty.
    pub fn stripe_secret(&self) -> Option<&str> {
        self.stripe_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// The regional-provider key pair, if both halves are configured.
    pub fn razorpay_keys(&self) -> Option<(&str, &str)> {
        let id = self.razorpay_id.as_deref().filter(|s| !s.trim().is_empty())?;
        let secret = self
            .razorpay_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some((id, secret))
    }
}

/// Read-only access to the store settings row.
#[derive(Clone)]
pub struct SettingsService {
    db_pool: Arc<DbPool>,
}

impl SettingsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Load payment credentials from the settings row.
    ///
    /// A missing row, or one without payment fields, yields defaults; both
    /// are normal for a storefront that has not connected a processor yet.
    #[instrument(skip(self))]
    pub async fn payment_credentials(&self) -> Result<PaymentCredentials, ServiceError> {
        let row = StoreSettingEntity::find_by_id(STORE_SETTING_NAME)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load store settings");
                ServiceError::DatabaseError(e)
            })?;

        let Some(row) = row else {
            warn!(
                name = STORE_SETTING_NAME,
                "Store settings row not found; payment providers unavailable"
            );
            return Ok(PaymentCredentials::default());
        };

        let credentials = serde_json::from_value(row.setting).unwrap_or_else(|err| {
            warn!(error = %err, "Store settings payload not in the expected shape");
            PaymentCredentials::default()
        });
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_do_not_count_as_configured() {
        let credentials = PaymentCredentials {
            stripe_secret: Some("   ".to_string()),
            razorpay_id: Some("rzp_test_key".to_string()),
            razorpay_secret: None,
        };

        assert!(credentials.stripe_secret().is_none());
        assert!(credentials.razorpay_keys().is_none());
    }

    #[test]
    fn unknown_settings_fields_are_ignored() {
        let payload = serde_json::json!({
            "company_name": "Acme Groceries",
            "default_currency": "USD",
            "stripe_secret": "sk_test_abc",
            "razorpay_id": "rzp_test_key",
            "razorpay_secret": "rzp_secret",
        });

        let credentials: PaymentCredentials = serde_json::from_value(payload).unwrap();
        assert_eq!(credentials.stripe_secret(), Some("sk_test_abc"));
        assert_eq!(
            credentials.razorpay_keys(),
            Some(("rzp_test_key", "rzp_secret"))
        );
    }
}
