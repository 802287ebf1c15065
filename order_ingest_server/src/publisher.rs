//! The dual event publisher.
//!
//! One envelope, two independent deliveries: the lossy pub/sub channel (fire-and-forget,
//! failures are a warning) and the durable broker (fanout exchange plus a type-specific
//! queue, failures are an error log). Both legs run in detached tasks so the pipeline never
//! blocks on delivery; no two-phase coordination is attempted — consumers dedupe on
//! `event_id`.

use std::sync::Arc;

use amqp_tools::{topology, MessageBroker, PubSubChannel};
use log::*;
use order_ingest_engine::events::OrderEventEnvelope;

pub struct DualPublisher<Br: MessageBroker> {
    broker: Br,
    pubsub: PubSubChannel,
}

impl<Br: MessageBroker> DualPublisher<Br> {
    pub fn new(broker: Br, pubsub: PubSubChannel) -> Self {
        Self { broker, pubsub }
    }

    /// Serialize the envelope once and fan it out. Returns as soon as both legs are spawned.
    pub async fn publish(&self, envelope: OrderEventEnvelope) {
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                error!("📤️ Could not serialize event {} ({}): {e}", envelope.event_id, envelope.event_type);
                return;
            },
        };
        let event_id = envelope.event_id.clone();
        let event_type = envelope.event_type;

        let pubsub = self.pubsub.clone();
        let pubsub_payload = Arc::clone(&payload);
        tokio::spawn(async move {
            let receivers = pubsub.publish(&pubsub_payload);
            trace!("📤️ Event {event_id} reached {receivers} live subscriber(s)");
        });

        let broker = self.broker.clone();
        let event_id = envelope.event_id.clone();
        tokio::spawn(async move {
            if let Err(e) = broker.publish_to_exchange(topology::EVENTS_EXCHANGE, &payload).await {
                error!("📤️ Broker publish of {event_id} to {} failed: {e}", topology::EVENTS_EXCHANGE);
            }
            let queue = topology::queue_for_event(event_type.as_str());
            if let Err(e) = broker.publish_to_queue(&queue, &payload).await {
                error!("📤️ Broker publish of {event_id} to {queue} failed: {e}");
            } else {
                debug!("📤️ Event {event_id} ({event_type}) published to {queue}");
            }
        });
    }
}

#[cfg(test)]
mod test {
    use amqp_tools::{AckDecision, MemoryBroker};
    use order_ingest_engine::{
        events::OrderEventType,
        test_utils::{full_order_from, sample_order},
    };
    use tokio::sync::watch;

    use super::*;

    #[tokio::test]
    async fn both_legs_receive_the_same_payload() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let pubsub = PubSubChannel::new("orders.events.live", 16);
        let mut live = pubsub.subscribe();
        let (_tx, shutdown) = watch::channel(false);
        let mut created = broker.subscribe("orders.events.created", shutdown.clone()).await.unwrap();
        let mut invoicing = broker.subscribe("orders.events.invoicing", shutdown).await.unwrap();

        let publisher = DualPublisher::new(broker, pubsub);
        let full = full_order_from(sample_order());
        let envelope = OrderEventEnvelope::new(OrderEventType::Created, &full);
        let event_id = envelope.event_id.clone();
        publisher.publish(envelope).await;

        let from_pubsub = live.next().await.unwrap();
        let from_queue = created.next().await.unwrap();
        let from_exchange = invoicing.next().await.unwrap();
        assert_eq!(from_pubsub, from_queue.payload);
        assert_eq!(from_pubsub, from_exchange.payload);
        let decoded: OrderEventEnvelope = serde_json::from_slice(&from_pubsub).unwrap();
        assert_eq!(decoded.event_id, event_id);
        from_queue.settle(AckDecision::Ack).await.unwrap();
        from_exchange.settle(AckDecision::Ack).await.unwrap();
    }

    #[tokio::test]
    async fn confirmation_requested_routes_to_its_own_queue() {
        let broker = MemoryBroker::new();
        broker.declare_topology().await.unwrap();
        let pubsub = PubSubChannel::new("orders.events.live", 16);
        let (_tx, shutdown) = watch::channel(false);
        let mut confirmation = broker.subscribe(topology::CONFIRMATION_QUEUE, shutdown).await.unwrap();

        let publisher = DualPublisher::new(broker, pubsub);
        let full = full_order_from(sample_order());
        publisher.publish(OrderEventEnvelope::new(OrderEventType::ConfirmationRequested, &full)).await;

        let delivery = confirmation.next().await.unwrap();
        let decoded: OrderEventEnvelope = serde_json::from_slice(&delivery.payload).unwrap();
        assert_eq!(decoded.event_type, OrderEventType::ConfirmationRequested);
        delivery.settle(AckDecision::Ack).await.unwrap();
    }
}
