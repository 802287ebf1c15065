use async_trait::async_trait;
use log::warn;
use tokio::sync::mpsc;

use crate::error::BrokerError;

/// What a consumer decided to do with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Processed (or deliberately skipped); remove from the queue.
    Ack,
    /// Unprocessable; remove from the queue without retry.
    Discard,
    /// Transient failure; hand back to the broker's redelivery policy.
    Requeue,
}

/// The contract both broker implementations satisfy. Declarations are idempotent and safe to
/// run on every startup; publishes are fire-and-forget from the caller's point of view, with
/// durability delegated to the broker.
///
/// `async_trait` rather than bare async-in-trait: the workers hand these futures to
/// `tokio::spawn` from generic contexts, which needs the `Send` bound the macro pins on.
#[async_trait]
pub trait MessageBroker: Clone + Send + Sync + 'static {
    /// Declare the full gateway topology (exchange, bindings, queues).
    async fn declare_topology(&self) -> Result<(), BrokerError>;

    /// Publish directly to a named queue.
    async fn publish_to_queue(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Publish to a fanout exchange; every bound queue receives a copy.
    async fn publish_to_exchange(&self, exchange: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Open a long-lived subscription on a queue. The subscription ends when the shutdown
    /// signal flips to `true` or the broker side closes.
    async fn subscribe(
        &self,
        queue: &str,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<Subscription, BrokerError>;
}

/// A stream of deliveries from one queue. Backed by a forwarding task so that both broker
/// implementations expose the same pull interface.
pub struct Subscription {
    pub(crate) queue: String,
    pub(crate) receiver: mpsc::Receiver<Delivery>,
}

impl Subscription {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// The next delivery, or `None` once the subscription has drained and closed.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }
}

/// A single message plus the means to settle it.
pub struct Delivery {
    pub payload: Vec<u8>,
    pub(crate) handle: AckHandle,
}

pub(crate) enum AckHandle {
    Amqp(lapin::acker::Acker),
    Memory {
        /// Requeueing in the in-memory broker is a re-publish to the same queue.
        requeue: Option<(mpsc::UnboundedSender<Vec<u8>>, Vec<u8>)>,
    },
}

impl Delivery {
    pub async fn settle(self, decision: AckDecision) -> Result<(), BrokerError> {
        match self.handle {
            AckHandle::Amqp(acker) => {
                use lapin::options::{BasicAckOptions, BasicNackOptions};
                match decision {
                    AckDecision::Ack | AckDecision::Discard => acker
                        .ack(BasicAckOptions::default())
                        .await
                        .map_err(|e| BrokerError::Settle(e.to_string())),
                    AckDecision::Requeue => acker
                        .nack(BasicNackOptions { requeue: true, ..Default::default() })
                        .await
                        .map_err(|e| BrokerError::Settle(e.to_string())),
                }
            },
            AckHandle::Memory { requeue } => {
                if decision == AckDecision::Requeue {
                    if let Some((sender, payload)) = requeue {
                        if sender.send(payload).is_err() {
                            warn!("🐇️ Requeue on a closed in-memory queue; delivery dropped");
                        }
                    }
                }
                Ok(())
            },
        }
    }
}
