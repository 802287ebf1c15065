//! The canonical queue consumer.
//!
//! Drains `probability.orders.canonical`, deserializes each message into the canonical DTO,
//! funnels it through the pipeline and classifies failures into the ack/discard/requeue
//! policy. Unprocessable messages land in the error sink with their raw payload so operators
//! can triage and re-publish them.

use std::sync::Arc;

use amqp_tools::{topology, AckDecision, MessageBroker};
use log::*;
use order_ingest_engine::{
    canonical::CanonicalOrder,
    db_types::{ErrorKind, NewOrderError},
    ErrorManagement,
    OrderIngestApi,
    OrderIngestDatabase,
};
use tokio::sync::watch;

use crate::errors::ServerError;

pub async fn run_canonical_consumer<B, Br>(
    api: Arc<OrderIngestApi<B>>,
    broker: Br,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError>
where
    B: OrderIngestDatabase,
    Br: MessageBroker,
{
    let mut subscription = broker.subscribe(topology::CANONICAL_QUEUE, shutdown).await?;
    info!("🛎️ Canonical consumer listening on {}", topology::CANONICAL_QUEUE);
    while let Some(delivery) = subscription.next().await {
        let decision = handle_canonical_message(&api, &delivery.payload).await;
        if let Err(e) = delivery.settle(decision).await {
            error!("🛎️ Could not settle canonical delivery: {e}");
        }
    }
    info!("🛎️ Canonical consumer on {} shut down", topology::CANONICAL_QUEUE);
    Ok(())
}

/// Process one raw message and decide its fate. Factored out of the loop so the policy is
/// testable without a broker.
pub async fn handle_canonical_message<B: OrderIngestDatabase>(
    api: &OrderIngestApi<B>,
    payload: &[u8],
) -> AckDecision {
    let canonical: CanonicalOrder = match serde_json::from_slice(payload) {
        Ok(canonical) => canonical,
        Err(e) => {
            warn!("🛎️ Dropping malformed canonical payload: {e}");
            record_error(api.db(), None, ErrorKind::UnmarshalError, &e.to_string(), payload).await;
            return AckDecision::Discard;
        },
    };

    if canonical.external_id.trim().is_empty() || canonical.integration_id == 0 {
        warn!(
            "🛎️ Dropping invalid canonical order [{}/{}]: missing identity",
            canonical.external_id, canonical.integration_id
        );
        record_error(api.db(), Some(&canonical), ErrorKind::ValidationError, "external_id and integration_id are required", payload)
            .await;
        return AckDecision::Discard;
    }

    match api.map_and_save(canonical.clone()).await {
        Ok(outcome) => {
            debug!(
                "🛎️ Canonical order [{}/{}] {} as {}",
                canonical.external_id,
                canonical.integration_id,
                if outcome.created { "created" } else { "updated" },
                outcome.order.id
            );
            AckDecision::Ack
        },
        Err(e) if e.is_idempotency_collision() => {
            // A concurrent upsert of the same key won the race; this delivery is redundant.
            debug!("🛎️ Duplicate canonical order [{}/{}]; skipping", canonical.external_id, canonical.integration_id);
            AckDecision::Discard
        },
        Err(e) if e.is_required_field() => {
            warn!("🛎️ Dropping canonical order [{}]: {e}", canonical.external_id);
            AckDecision::Discard
        },
        Err(e) if e.is_data_integrity() => {
            warn!("🛎️ Data-integrity failure for [{}]: {e}. Not retriable", canonical.external_id);
            record_error(api.db(), Some(&canonical), ErrorKind::DatabaseError, &e.to_string(), payload).await;
            AckDecision::Discard
        },
        Err(e) if e.is_validation() => {
            warn!("🛎️ Validation failure for [{}]: {e}", canonical.external_id);
            record_error(api.db(), Some(&canonical), ErrorKind::ValidationError, &e.to_string(), payload).await;
            AckDecision::Discard
        },
        Err(e) => {
            error!("🛎️ Processing failure for [{}]: {e}. Handing back for redelivery", canonical.external_id);
            let kind = match &e {
                order_ingest_engine::OrderIngestError::DatabaseError(_) => ErrorKind::DatabaseError,
                _ => ErrorKind::ProcessingError,
            };
            record_error(api.db(), Some(&canonical), kind, &e.to_string(), payload).await;
            AckDecision::Requeue
        },
    }
}

async fn record_error<B: ErrorManagement>(
    db: &B,
    canonical: Option<&CanonicalOrder>,
    error_type: ErrorKind,
    message: &str,
    payload: &[u8],
) {
    let error = NewOrderError {
        external_id: canonical.map(|c| c.external_id.clone()).filter(|id| !id.is_empty()),
        integration_id: canonical.map(|c| c.integration_id).filter(|id| *id != 0),
        business_id: canonical.and_then(|c| c.business_id).filter(|id| *id != 0),
        platform: canonical.map(|c| c.platform.clone()).filter(|p| !p.is_empty()),
        error_type,
        error_message: message.to_string(),
        raw_data: payload.to_vec(),
    };
    if let Err(e) = db.record_order_error(error).await {
        // The sink itself failing must not take the consumer down.
        error!("🛎️ Could not record order error: {e}");
    }
}
