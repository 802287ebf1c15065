//! Broker and pub/sub plumbing for the Probability Order Gateway.
//!
//! Two delivery channels with very different guarantees:
//! * [`MessageBroker`] — the durable leg. Backed by RabbitMQ ([`AmqpBroker`]) in production
//!   and by an in-process implementation ([`MemoryBroker`]) in tests and standalone mode.
//!   Declarations are idempotent; durability is delegated to the broker.
//! * [`PubSubChannel`] — the lossy, low-latency leg. A single named channel; slow
//!   subscribers drop messages instead of applying backpressure.

mod amqp;
mod broker;
mod config;
mod error;
mod memory;
mod pubsub;
pub mod topology;

pub use amqp::AmqpBroker;
pub use broker::{AckDecision, Delivery, MessageBroker, Subscription};
pub use config::BrokerConfig;
pub use error::BrokerError;
pub use memory::MemoryBroker;
pub use pubsub::{PubSubChannel, PubSubSubscription};
