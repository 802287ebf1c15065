//! In-process implementation of [`MessageBroker`], for tests and standalone mode.
//!
//! Each queue is an unbounded channel with at most one active subscriber. Fanout "exchanges"
//! copy the payload to every bound queue, mirroring the production topology.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use log::*;
use tokio::sync::{mpsc, watch};

use crate::{
    broker::{AckHandle, Delivery, MessageBroker, Subscription},
    error::BrokerError,
    topology,
};

struct QueueState {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    receiver: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

#[derive(Default)]
struct Inner {
    queues: HashMap<String, QueueState>,
    bindings: HashMap<String, Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_queue(inner: &mut Inner, queue: &str) {
        inner.queues.entry(queue.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            QueueState { sender, receiver: Some(receiver) }
        });
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    async fn declare_topology(&self) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock().expect("memory broker lock poisoned");
        for queue in topology::all_queues() {
            Self::ensure_queue(&mut inner, &queue);
        }
        inner
            .bindings
            .insert(topology::EVENTS_EXCHANGE.to_string(), topology::BOUND_QUEUES.iter().map(|q| q.to_string()).collect());
        debug!("🐇️ In-memory topology declared");
        Ok(())
    }

    async fn publish_to_queue(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let inner = self.inner.lock().expect("memory broker lock poisoned");
        let state = inner.queues.get(queue).ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))?;
        state
            .sender
            .send(payload.to_vec())
            .map_err(|e| BrokerError::Publish { queue: queue.to_string(), message: e.to_string() })
    }

    async fn publish_to_exchange(&self, exchange: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let targets = {
            let inner = self.inner.lock().expect("memory broker lock poisoned");
            inner.bindings.get(exchange).cloned().unwrap_or_default()
        };
        for queue in targets {
            self.publish_to_queue(&queue, payload).await?;
        }
        Ok(())
    }

    async fn subscribe(&self, queue: &str, shutdown: watch::Receiver<bool>) -> Result<Subscription, BrokerError> {
        let (requeue_sender, mut upstream) = {
            let mut inner = self.inner.lock().expect("memory broker lock poisoned");
            Self::ensure_queue(&mut inner, queue);
            let state = inner.queues.get_mut(queue).expect("queue just ensured");
            let receiver = state.receiver.take().ok_or_else(|| BrokerError::Subscribe {
                queue: queue.to_string(),
                message: "queue already has a subscriber".to_string(),
            })?;
            (state.sender.clone(), receiver)
        };
        let (tx, rx) = mpsc::channel(64);
        let queue_name = queue.to_string();
        let mut shutdown = shutdown;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = upstream.recv() => match message {
                        Some(payload) => {
                            let delivery = Delivery {
                                payload: payload.clone(),
                                handle: AckHandle::Memory { requeue: Some((requeue_sender.clone(), payload)) },
                            };
                            if tx.send(delivery).await.is_err() {
                                debug!("🐇️ Subscription on {queue_name} dropped");
                                return;
                            }
                        },
                        None => return,
                    },
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            debug!("🐇️ Shutdown received; closing in-memory consumer on {queue_name}");
                            return;
                        }
                    },
                }
            }
        });
        Ok(Subscription { queue: queue.to_string(), receiver: rx })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::broker::AckDecision;

    #[tokio::test]
    async fn publish_and_consume_round_trip() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sub = broker.subscribe(topology::CANONICAL_QUEUE, shutdown_rx).await.unwrap();
        broker.publish_to_queue(topology::CANONICAL_QUEUE, b"hello").await.unwrap();
        let delivery = sub.next().await.unwrap();
        assert_eq!(delivery.payload, b"hello");
        delivery.settle(AckDecision::Ack).await.unwrap();
    }

    #[tokio::test]
    async fn exchange_fans_out_to_bound_queues() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut invoicing = broker.subscribe("orders.events.invoicing", shutdown_rx.clone()).await.unwrap();
        let mut score = broker.subscribe("orders.events.score", shutdown_rx).await.unwrap();
        broker.publish_to_exchange(topology::EVENTS_EXCHANGE, b"{}").await.unwrap();
        assert_eq!(invoicing.next().await.unwrap().payload, b"{}");
        assert_eq!(score.next().await.unwrap().payload, b"{}");
    }

    #[tokio::test]
    async fn requeue_redelivers() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sub = broker.subscribe(topology::CANONICAL_QUEUE, shutdown_rx).await.unwrap();
        broker.publish_to_queue(topology::CANONICAL_QUEUE, b"retry-me").await.unwrap();
        let first = sub.next().await.unwrap();
        first.settle(AckDecision::Requeue).await.unwrap();
        let second = sub.next().await.unwrap();
        assert_eq!(second.payload, b"retry-me");
        second.settle(AckDecision::Discard).await.unwrap();
    }

    #[tokio::test]
    async fn second_subscriber_is_rejected() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _first = broker.subscribe(topology::CANONICAL_QUEUE, shutdown_rx.clone()).await.unwrap();
        assert!(broker.subscribe(topology::CANONICAL_QUEUE, shutdown_rx).await.is_err());
    }
}
