use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker connection error: {0}")]
    Connection(String),
    #[error("Failed to declare topology: {0}")]
    Declare(String),
    #[error("Failed to publish to {queue}: {message}")]
    Publish { queue: String, message: String },
    #[error("Failed to subscribe to {queue}: {message}")]
    Subscribe { queue: String, message: String },
    #[error("Failed to settle delivery: {0}")]
    Settle(String),
    #[error("The queue {0} is not declared")]
    UnknownQueue(String),
}

impl From<lapin::Error> for BrokerError {
    fn from(e: lapin::Error) -> Self {
        BrokerError::Connection(e.to_string())
    }
}
