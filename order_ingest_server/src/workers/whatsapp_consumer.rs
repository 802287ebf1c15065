//! The messaging-driven downstream consumer.
//!
//! WhatsApp confirmations, cancellations and novelties arrive on three queues and are
//! applied back onto the order. Messages are independent — no ordering is assumed — and
//! each queue gets its own worker task.

use std::{fmt::Display, sync::Arc};

use amqp_tools::{topology, AckDecision, MessageBroker};
use log::*;
use order_ingest_engine::{
    db_types::Order,
    events::{OrderEventEnvelope, OrderEventType},
    OrderIngestDatabase,
    OrderManagement,
};
use serde::Deserialize;
use tokio::sync::watch;

use crate::{errors::ServerError, publisher::DualPublisher};

/// The three messaging-originated mutations, as a sum type rather than stringly-typed
/// dispatch.
#[derive(Debug, Clone)]
pub enum WhatsAppEvent {
    Confirmed(ConfirmationMessage),
    Cancelled(CancellationMessage),
    Novelty(NoveltyMessage),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationMessage {
    pub order_number: String,
    pub phone_number: String,
    pub business_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancellationMessage {
    pub order_number: String,
    pub phone_number: String,
    pub business_id: i64,
    #[serde(default)]
    pub cancellation_reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoveltyMessage {
    pub order_number: String,
    pub phone_number: String,
    pub business_id: i64,
    pub novelty_type: NoveltyType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NoveltyType {
    ChangeAddress,
    ChangeProducts,
    ChangePayment,
    Other(String),
}

impl From<String> for NoveltyType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "change_address" => Self::ChangeAddress,
            "change_products" => Self::ChangeProducts,
            "change_payment" => Self::ChangePayment,
            _ => Self::Other(value),
        }
    }
}

impl Display for NoveltyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoveltyType::ChangeAddress => write!(f, "cambio de dirección"),
            NoveltyType::ChangeProducts => write!(f, "cambio de productos"),
            NoveltyType::ChangePayment => write!(f, "cambio de pago"),
            NoveltyType::Other(s) => write!(f, "{s}"),
        }
    }
}

impl WhatsAppEvent {
    pub fn order_number(&self) -> &str {
        match self {
            WhatsAppEvent::Confirmed(m) => &m.order_number,
            WhatsAppEvent::Cancelled(m) => &m.order_number,
            WhatsAppEvent::Novelty(m) => &m.order_number,
        }
    }

    pub fn business_id(&self) -> i64 {
        match self {
            WhatsAppEvent::Confirmed(m) => m.business_id,
            WhatsAppEvent::Cancelled(m) => m.business_id,
            WhatsAppEvent::Novelty(m) => m.business_id,
        }
    }
}

/// Spawn one worker per reply queue. Returns once all three subscriptions are open.
///
/// Concrete over the SQLite backend: the per-queue loops are spawned here, and the spawned
/// futures need their `Send`-ness to be visible, which a generic backend would hide.
pub async fn run_whatsapp_consumers<Br>(
    db: order_ingest_engine::SqliteDatabase,
    publisher: Arc<DualPublisher<Br>>,
    broker: Br,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError>
where
    Br: MessageBroker,
{
    for queue in
        [topology::WHATSAPP_CONFIRMED_QUEUE, topology::WHATSAPP_CANCELLED_QUEUE, topology::WHATSAPP_NOVELTY_QUEUE]
    {
        let mut subscription = broker.subscribe(queue, shutdown.clone()).await?;
        let db = db.clone();
        let publisher = Arc::clone(&publisher);
        tokio::spawn(async move {
            info!("🛎️ WhatsApp consumer listening on {queue}");
            while let Some(delivery) = subscription.next().await {
                let decision = handle_whatsapp_message(&db, &publisher, queue, &delivery.payload).await;
                if let Err(e) = delivery.settle(decision).await {
                    error!("🛎️ Could not settle WhatsApp delivery: {e}");
                }
            }
            info!("🛎️ WhatsApp consumer on {queue} shut down");
        });
    }
    Ok(())
}

pub async fn handle_whatsapp_message<B, Br>(
    db: &B,
    publisher: &DualPublisher<Br>,
    queue: &str,
    payload: &[u8],
) -> AckDecision
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let event = match parse_event(queue, payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("🛎️ Dropping malformed WhatsApp message on {queue}: {e}");
            return AckDecision::Discard;
        },
    };
    match apply_event(db, publisher, &event).await {
        Ok(()) => AckDecision::Ack,
        Err(ServerError::BackendError(msg)) => {
            warn!("🛎️ WhatsApp event for order number {} dropped: {msg}", event.order_number());
            AckDecision::Discard
        },
        Err(e) => {
            error!("🛎️ WhatsApp event for order number {} failed: {e}. Handing back for redelivery", event.order_number());
            AckDecision::Requeue
        },
    }
}

fn parse_event(queue: &str, payload: &[u8]) -> Result<WhatsAppEvent, serde_json::Error> {
    match queue {
        topology::WHATSAPP_CANCELLED_QUEUE => serde_json::from_slice(payload).map(WhatsAppEvent::Cancelled),
        topology::WHATSAPP_NOVELTY_QUEUE => serde_json::from_slice(payload).map(WhatsAppEvent::Novelty),
        _ => serde_json::from_slice(payload).map(WhatsAppEvent::Confirmed),
    }
}

async fn apply_event<B, Br>(db: &B, publisher: &DualPublisher<Br>, event: &WhatsAppEvent) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let order = fetch_target_order(db, event).await?;
    match event {
        WhatsAppEvent::Confirmed(message) => {
            db.set_confirmation(&order.id, true).await.map_err(order_ingest_engine::OrderIngestError::from)?;
            info!("🛎️ Order {} confirmed via WhatsApp ({})", order.id, message.phone_number);
            // No re-announcement: downstream already knows about the order.
        },
        WhatsAppEvent::Cancelled(message) => {
            db.set_confirmation(&order.id, false).await.map_err(order_ingest_engine::OrderIngestError::from)?;
            let entry = format!(
                "Cancelación solicitada vía WhatsApp: {} (Teléfono: {})",
                message.cancellation_reason, message.phone_number
            );
            db.append_novelty(&order.id, &entry).await.map_err(order_ingest_engine::OrderIngestError::from)?;
            info!("🛎️ Order {} cancelled via WhatsApp", order.id);
            emit(db, publisher, &order, OrderEventType::Cancelled, &[
                ("cancellation_source", serde_json::json!("whatsapp")),
                ("cancellation_reason", serde_json::json!(message.cancellation_reason)),
                ("requires_manual_review", serde_json::json!(true)),
            ])
            .await?;
        },
        WhatsAppEvent::Novelty(message) => {
            let entry = format!(
                "Novedad vía WhatsApp [{}]: {} (Teléfono: {})",
                message.novelty_type, message.description, message.phone_number
            );
            db.append_novelty(&order.id, &entry).await.map_err(order_ingest_engine::OrderIngestError::from)?;
            info!("🛎️ Novelty ({}) recorded for order {}", message.novelty_type, order.id);
            emit(db, publisher, &order, OrderEventType::Updated, &[
                ("novelty_source", serde_json::json!("whatsapp")),
                ("requires_manual_action", serde_json::json!(true)),
            ])
            .await?;
        },
    }
    Ok(())
}

async fn fetch_target_order<B: OrderManagement>(db: &B, event: &WhatsAppEvent) -> Result<Order, ServerError> {
    db.fetch_order_by_order_number(event.business_id(), event.order_number())
        .await
        .map_err(|e| ServerError::IngestError(e.into()))?
        .ok_or_else(|| {
            ServerError::BackendError(format!(
                "no order with number {} for business {}",
                event.order_number(),
                event.business_id()
            ))
        })
}

async fn emit<B, Br>(
    db: &B,
    publisher: &DualPublisher<Br>,
    order: &Order,
    event_type: OrderEventType,
    metadata: &[(&str, serde_json::Value)],
) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let full = db
        .fetch_full_order(&order.id)
        .await
        .map_err(|e| ServerError::IngestError(e.into()))?
        .ok_or_else(|| ServerError::BackendError(format!("order {} vanished mid-handling", order.id)))?;
    let mut envelope = OrderEventEnvelope::new(event_type, &full);
    for (key, value) in metadata {
        envelope = envelope.with_metadata_entry(key, value.clone());
    }
    publisher.publish(envelope).await;
    Ok(())
}
