//! RabbitMQ implementation of [`MessageBroker`], on lapin with a deadpool connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_lapin::{Manager, Pool, PoolError};
use futures_util::StreamExt;
use lapin::{
    options::{
        BasicConsumeOptions,
        BasicPublishOptions,
        BasicQosOptions,
        ExchangeDeclareOptions,
        QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
    BasicProperties,
    Channel,
    ExchangeKind,
};
use log::*;
use tokio::sync::{mpsc, watch};

use crate::{
    broker::{AckHandle, Delivery, MessageBroker, Subscription},
    config::BrokerConfig,
    error::BrokerError,
    topology,
};

const RECONNECT_MIN_DELAY: Duration = Duration::from_millis(200);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);
const FORWARD_BUFFER: usize = 64;

#[derive(Clone)]
pub struct AmqpBroker {
    pool: Pool,
    prefetch: u16,
}

impl AmqpBroker {
    pub async fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let manager = Manager::new(config.url.reveal().clone(), Default::default());
        let pool = Pool::builder(manager)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| BrokerError::Connection(format!("Failed to create pool: {e}")))?;
        let broker = Self { pool, prefetch: config.prefetch };
        // Fail fast on a bad URL rather than at the first publish.
        broker.channel().await?;
        info!("🐇️ Connected to AMQP broker");
        Ok(broker)
    }

    async fn channel(&self) -> Result<Channel, BrokerError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e: PoolError| BrokerError::Connection(format!("Failed to get connection from pool: {e}")))?;
        conn.create_channel().await.map_err(|e| BrokerError::Connection(format!("Failed to create channel: {e}")))
    }

    async fn declare_queue(channel: &Channel, queue: &str) -> Result<(), BrokerError> {
        channel
            .queue_declare(queue, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
            .await
            .map_err(|e| BrokerError::Declare(format!("queue {queue}: {e}")))?;
        Ok(())
    }

    /// One consumer setup attempt: channel, qos, declare, consume.
    async fn setup_consumer(&self, queue: &str) -> Result<lapin::Consumer, BrokerError> {
        let channel = self.channel().await?;
        channel
            .basic_qos(self.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| BrokerError::Subscribe { queue: queue.to_string(), message: e.to_string() })?;
        Self::declare_queue(&channel, queue).await?;
        channel
            .basic_consume(queue, "pog-consumer", BasicConsumeOptions::default(), FieldTable::default())
            .await
            .map_err(|e| BrokerError::Subscribe { queue: queue.to_string(), message: e.to_string() })
    }
}

#[async_trait]
impl MessageBroker for AmqpBroker {
    async fn declare_topology(&self) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        channel
            .exchange_declare(
                topology::EVENTS_EXCHANGE,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Declare(format!("exchange {}: {e}", topology::EVENTS_EXCHANGE)))?;
        for queue in topology::all_queues() {
            Self::declare_queue(&channel, &queue).await?;
        }
        for queue in topology::BOUND_QUEUES {
            channel
                .queue_bind(queue, topology::EVENTS_EXCHANGE, "", QueueBindOptions::default(), FieldTable::default())
                .await
                .map_err(|e| BrokerError::Declare(format!("binding {queue}: {e}")))?;
        }
        info!("🐇️ Topology declared: exchange {} with {} queue(s)", topology::EVENTS_EXCHANGE, topology::all_queues().len());
        Ok(())
    }

    async fn publish_to_queue(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        channel
            .basic_publish("", queue, BasicPublishOptions::default(), payload, BasicProperties::default())
            .await
            .map_err(|e| BrokerError::Publish { queue: queue.to_string(), message: e.to_string() })?
            .await
            .map_err(|e| BrokerError::Publish { queue: queue.to_string(), message: e.to_string() })?;
        trace!("🐇️ Published {} byte(s) to {queue}", payload.len());
        Ok(())
    }

    async fn publish_to_exchange(&self, exchange: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        channel
            .basic_publish(exchange, "", BasicPublishOptions::default(), payload, BasicProperties::default())
            .await
            .map_err(|e| BrokerError::Publish { queue: exchange.to_string(), message: e.to_string() })?
            .await
            .map_err(|e| BrokerError::Publish { queue: exchange.to_string(), message: e.to_string() })?;
        trace!("🐇️ Published {} byte(s) to exchange {exchange}", payload.len());
        Ok(())
    }

    /// Spawns a forwarding task with a reconnection loop. Deliveries flow into the returned
    /// [`Subscription`]; a flipped shutdown signal drains and closes it.
    async fn subscribe(&self, queue: &str, shutdown: watch::Receiver<bool>) -> Result<Subscription, BrokerError> {
        let (tx, rx) = mpsc::channel(FORWARD_BUFFER);
        let broker = self.clone();
        let queue_name = queue.to_string();
        let mut shutdown = shutdown;
        tokio::spawn(async move {
            let mut delay = RECONNECT_MIN_DELAY;
            loop {
                if *shutdown.borrow() {
                    break;
                }
                match broker.setup_consumer(&queue_name).await {
                    Ok(mut consumer) => {
                        debug!("🐇️ Consumer connected on {queue_name}");
                        delay = RECONNECT_MIN_DELAY;
                        loop {
                            tokio::select! {
                                delivery = consumer.next() => match delivery {
                                    Some(Ok(delivery)) => {
                                        let forwarded = Delivery {
                                            payload: delivery.data,
                                            handle: AckHandle::Amqp(delivery.acker),
                                        };
                                        if tx.send(forwarded).await.is_err() {
                                            debug!("🐇️ Subscription on {queue_name} dropped; stopping consumer");
                                            return;
                                        }
                                    },
                                    Some(Err(e)) => {
                                        error!("🐇️ Delivery error on {queue_name}: {e}. Reconnecting");
                                        break;
                                    },
                                    None => {
                                        info!("🐇️ Consumer stream on {queue_name} ended. Reconnecting");
                                        break;
                                    },
                                },
                                _ = shutdown.changed() => {
                                    if *shutdown.borrow() {
                                        debug!("🐇️ Shutdown received; closing consumer on {queue_name}");
                                        return;
                                    }
                                },
                            }
                        }
                    },
                    Err(e) => {
                        error!("🐇️ Failed to set up consumer on {queue_name}: {e}. Retrying in {delay:?}");
                    },
                }
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(RECONNECT_MAX_DELAY);
            }
        });
        Ok(Subscription { queue: queue.to_string(), receiver: rx })
    }
}
