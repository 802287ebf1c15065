use thiserror::Error;

use crate::db_types::{NewOrderError, OrderError};

#[derive(Debug, Clone, Error)]
pub enum ErrorSinkError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ErrorSinkError {
    fn from(e: sqlx::Error) -> Self {
        ErrorSinkError::DatabaseError(e.to_string())
    }
}

/// The append-only error sink. Rows are never deleted by the core; operators resurrect them
/// by re-publishing `raw_data` to the ingestion queue.
#[allow(async_fn_in_trait)]
pub trait ErrorManagement {
    async fn record_order_error(&self, error: NewOrderError) -> Result<OrderError, ErrorSinkError>;

    /// The oldest unhandled entries, for operator triage.
    async fn fetch_new_order_errors(&self, limit: i64) -> Result<Vec<OrderError>, ErrorSinkError>;
}
