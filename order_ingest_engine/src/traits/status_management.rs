use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StatusApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for StatusApiError {
    fn from(e: sqlx::Error) -> Self {
        StatusApiError::DatabaseError(e.to_string())
    }
}

/// Read-only access to the status lookup tables and the channel-status rule table.
#[allow(async_fn_in_trait)]
pub trait StatusManagement {
    /// `(integration_type_id, channel status) -> internal status id`, or `None` when no rule
    /// matches.
    async fn resolve_order_status_id(
        &self,
        integration_type_id: i64,
        original_status: &str,
    ) -> Result<Option<i64>, StatusApiError>;

    /// Internal id for a (normalized) financial status code.
    async fn resolve_payment_status_id(&self, code: &str) -> Result<Option<i64>, StatusApiError>;

    /// Internal id for a (normalized) fulfillment status code.
    async fn resolve_fulfillment_status_id(&self, code: &str) -> Result<Option<i64>, StatusApiError>;

    /// The integration the manual-order adapter should bind to: the platform default when one
    /// is configured, otherwise the tenant's first integration.
    async fn default_integration_for_business(
        &self,
        business_id: i64,
        platform: Option<&str>,
    ) -> Result<Option<i64>, StatusApiError>;
}
