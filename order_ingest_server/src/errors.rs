use amqp_tools::BrokerError;
use order_ingest_engine::OrderIngestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Broker error. {0}")]
    BrokerError(#[from] BrokerError),
    #[error("Ingestion error. {0}")]
    IngestError(#[from] OrderIngestError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Manual order request is invalid. {0}")]
    InvalidManualOrder(String),
}
