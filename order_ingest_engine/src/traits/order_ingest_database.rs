use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{CatalogApiError, CatalogManagement, ErrorManagement, ErrorSinkError, OrderApiError, OrderManagement, StatusApiError, StatusManagement},
};

/// The umbrella bound for backends supporting the ingestion engine. The pipeline, the score
/// worker and the consumers are all generic over this trait.
#[allow(async_fn_in_trait)]
pub trait OrderIngestDatabase:
    Clone + OrderManagement + CatalogManagement + StatusManagement + ErrorManagement
{
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderIngestError> {
        Ok(())
    }
}

/// The error taxonomy of the ingestion pipeline. The wording of the required-field variants is
/// load-bearing: the canonical queue consumer classifies failures by these messages, matching
/// what upstream producers have historically logged.
#[derive(Debug, Clone, Error)]
pub enum OrderIngestError {
    #[error("business_id is required")]
    BusinessIdRequired,
    #[error("integration_id is required")]
    IntegrationIdRequired,
    #[error("external_id is required")]
    ExternalIdRequired,
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Illegal status transition from {from} to {to}")]
    IllegalStatusTransition { from: String, to: String },
    #[error("Cannot insert order, since it already exists. {0}")]
    OrderAlreadyExists(String),
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("No order matches order number {0}")]
    OrderNumberNotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl OrderIngestError {
    /// Duplicate `(external_id, integration_id)` — the benign race the queue consumer acks
    /// and discards.
    pub fn is_idempotency_collision(&self) -> bool {
        matches!(self, OrderIngestError::OrderAlreadyExists(_))
    }

    /// Bad inbound data that a redelivery can never fix.
    pub fn is_required_field(&self) -> bool {
        matches!(
            self,
            OrderIngestError::BusinessIdRequired
                | OrderIngestError::IntegrationIdRequired
                | OrderIngestError::ExternalIdRequired
        )
    }

    /// Referential violation from the storage engine; terminal for the message.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, OrderIngestError::DataIntegrity(_))
    }

    pub fn is_validation(&self) -> bool {
        self.is_required_field()
            || matches!(
                self,
                OrderIngestError::ValidationError(_) | OrderIngestError::IllegalStatusTransition { .. }
            )
    }
}

impl From<OrderApiError> for OrderIngestError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::AlreadyExists(msg) => OrderIngestError::OrderAlreadyExists(msg),
            OrderApiError::DataIntegrity(msg) => OrderIngestError::DataIntegrity(msg),
            OrderApiError::OrderNotFound(id) => OrderIngestError::OrderNotFound(id),
            OrderApiError::DatabaseError(msg) => OrderIngestError::DatabaseError(msg),
        }
    }
}

impl From<CatalogApiError> for OrderIngestError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::SkuRequired => OrderIngestError::ValidationError(e.to_string()),
            CatalogApiError::DatabaseError(msg) => OrderIngestError::DatabaseError(msg),
        }
    }
}

impl From<StatusApiError> for OrderIngestError {
    fn from(e: StatusApiError) -> Self {
        match e {
            StatusApiError::DatabaseError(msg) => OrderIngestError::DatabaseError(msg),
        }
    }
}

impl From<ErrorSinkError> for OrderIngestError {
    fn from(e: ErrorSinkError) -> Self {
        match e {
            ErrorSinkError::DatabaseError(msg) => OrderIngestError::DatabaseError(msg),
        }
    }
}

impl From<serde_json::Error> for OrderIngestError {
    fn from(e: serde_json::Error) -> Self {
        OrderIngestError::SerializationError(e.to_string())
    }
}

impl From<sqlx::Error> for OrderIngestError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::from(e).into()
    }
}
