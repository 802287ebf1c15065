//! The asynchronous score worker.
//!
//! Subscribes to the pub/sub channel, reacts to `order.score_calculation_requested`
//! envelopes, recomputes the delivery probability over the freshly-loaded aggregate and
//! rewrites the score columns. A recalc runs on every update by design: the score depends on
//! fields that change late, like addresses arriving in follow-up webhooks.

use std::sync::Arc;

use amqp_tools::{MessageBroker, PubSubSubscription};
use log::*;
use order_ingest_engine::{
    db_types::OrderId,
    events::{OrderEventEnvelope, OrderEventType},
    scoring::score_order,
    OrderIngestDatabase,
    OrderManagement,
};
use tokio::sync::watch;

use crate::{errors::ServerError, publisher::DualPublisher};

pub async fn run_score_worker<B, Br>(
    db: B,
    publisher: Arc<DualPublisher<Br>>,
    mut subscription: PubSubSubscription,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    info!("⚖️ Score worker subscribed to the live event channel");
    loop {
        tokio::select! {
            message = subscription.next() => match message {
                Some(payload) => {
                    if let Err(e) = handle_score_message(&db, &publisher, &payload).await {
                        error!("⚖️ Score recalculation failed: {e}");
                    }
                },
                None => break,
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            },
        }
    }
    info!("⚖️ Score worker shut down");
    Ok(())
}

pub async fn handle_score_message<B, Br>(
    db: &B,
    publisher: &DualPublisher<Br>,
    payload: &[u8],
) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let envelope: OrderEventEnvelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            // The channel carries every event type; foreign payloads are not ours to judge.
            trace!("⚖️ Ignoring undecodable live message: {e}");
            return Ok(());
        },
    };
    if envelope.event_type != OrderEventType::ScoreCalculationRequested {
        return Ok(());
    }
    score_one(db, publisher, &OrderId(envelope.order_id.clone())).await
}

/// Load, score, persist, announce.
pub async fn score_one<B, Br>(db: &B, publisher: &DualPublisher<Br>, id: &OrderId) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let mut full = db
        .fetch_full_order(id)
        .await
        .map_err(|e| ServerError::IngestError(e.into()))?
        .ok_or_else(|| ServerError::BackendError(format!("order {id} not found for scoring")))?;

    if full.order.customer_order_count.is_none() {
        if let Some(client_id) = full.order.customer_id.clone() {
            let count = db
                .count_orders_for_client(&client_id)
                .await
                .map_err(|e| ServerError::IngestError(e.into()))?;
            full.order.customer_order_count = Some(count);
        }
    }

    let outcome = score_order(&full);
    db.update_score(id, outcome.score, &outcome.factors)
        .await
        .map_err(|e| ServerError::IngestError(e.into()))?;
    debug!("⚖️ Order {id} scored {} with {} factor(s)", outcome.score, outcome.factors.len());

    full.order.delivery_probability = Some(outcome.score);
    full.order.negative_factors = serde_json::to_string(&outcome.factors).unwrap_or_else(|_| "[]".to_string());
    publisher.publish(OrderEventEnvelope::new(OrderEventType::ScoreCalculated, &full)).await;
    Ok(())
}
