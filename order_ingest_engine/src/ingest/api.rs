use log::*;

use crate::{
    canonical::CanonicalOrder,
    db_types::{FullOrder, NewOrderItem, Order, OrderStatusType},
    events::{EventProducers, OrderEventEnvelope, OrderEventType},
    ingest::{
        diff::{addresses_equivalent, compute_diff, items_equivalent, payments_equivalent, shipments_equivalent},
        mapper::{build_new_order, MappedContext},
        resolvers::{resolve_customer, resolve_product},
    },
    order_objects::{IngestOutcome, StatusChange},
    status::{normalize_fulfillment_code, normalize_payment_code},
    traits::{OrderIngestDatabase, OrderIngestError},
};
use crate::db_types::{IntegrationType, NewChannelMetadata};

/// `OrderIngestApi` is the single write path for orders: every channel adapter, queue
/// consumer and the manual-order adapter funnel through [`Self::map_and_save`].
pub struct OrderIngestApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> std::fmt::Debug for OrderIngestApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderIngestApi")
    }
}

impl<B> OrderIngestApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderIngestApi<B>
where B: OrderIngestDatabase
{
    /// Idempotent upsert of a canonical order.
    ///
    /// A first delivery inserts the aggregate and emits `order.created`; a re-delivery of the
    /// same `(external_id, integration_id)` converges on the update path, mutating only the
    /// fields that actually differ and emitting `order.updated` (plus `order.status_changed`
    /// when the internal status moved). Either way a score recalculation is scheduled
    /// afterwards — the score depends on fields that change late.
    pub async fn map_and_save(&self, canonical: CanonicalOrder) -> Result<IngestOutcome, OrderIngestError> {
        if canonical.external_id.trim().is_empty() {
            return Err(OrderIngestError::ExternalIdRequired);
        }
        if canonical.integration_id == 0 {
            return Err(OrderIngestError::IntegrationIdRequired);
        }
        if canonical.business_id.unwrap_or(0) == 0 {
            return Err(OrderIngestError::BusinessIdRequired);
        }

        let existing = self.db.fetch_order_by_external_id(&canonical.external_id, canonical.integration_id).await?;
        match existing {
            None => self.create_order(canonical).await,
            Some(existing) => self.update_order(existing, &canonical).await,
        }
    }

    async fn create_order(&self, canonical: CanonicalOrder) -> Result<IngestOutcome, OrderIngestError> {
        let business_id = canonical.business_id.unwrap_or(0);
        let customer = resolve_customer(&self.db, business_id, &canonical).await?;
        let ctx = self.resolve_context(&canonical, customer.map(|c| c.id)).await?;
        let order = build_new_order(&canonical, &ctx);
        let items = self.link_products(business_id, &canonical.order_items).await?;
        let metadata = canonical.channel_metadata.iter().cloned().map(Into::into).collect::<Vec<_>>();

        let inserted = self
            .db
            .insert_order_tree(
                order,
                &items,
                &canonical.addresses,
                &canonical.payments,
                &canonical.shipments,
                &metadata,
            )
            .await?;
        info!("📥️ Order {} created from [{}/{}]", inserted.id, inserted.external_id, inserted.integration_id);

        let full = self.load_full(&inserted).await?;
        self.call_order_event_hook(OrderEventEnvelope::new(OrderEventType::Created, &full)).await;
        self.request_score(&full).await;
        Ok(IngestOutcome { order: full.order, created: true, changed: false, status_change: None })
    }

    /// The update branch of the upsert. Returns without persisting (and without emitting)
    /// when no field differs from the stored aggregate.
    pub async fn update_order(
        &self,
        existing: Order,
        canonical: &CanonicalOrder,
    ) -> Result<IngestOutcome, OrderIngestError> {
        let business_id = canonical.business_id.unwrap_or(existing.business_id);
        let ctx = self.resolve_context(canonical, existing.customer_id.clone()).await?;
        let incoming = build_new_order(canonical, &ctx);

        self.check_status_transition(&existing, &incoming.status)?;

        let mut diff = compute_diff(&existing, &incoming);
        if canonical.occurred_at.is_none() {
            // The mapper defaulted occurred_at to now; a sparse re-delivery must not churn it.
            diff.occurred_at = None;
        }
        let status_change = diff.status.as_ref().map(|new_status| StatusChange {
            previous: existing.status.clone(),
            current: new_status.clone(),
        });

        let stored = self.load_full(&existing).await?;
        // Link products before comparing: stored items already carry product ids, and a
        // re-delivered identical item list must not read as a structural change.
        let incoming_items = self.link_products(business_id, &canonical.order_items).await?;
        let replace_items = !incoming_items.is_empty() && !items_equivalent(&stored.items, &incoming_items);
        let replace_addresses =
            !canonical.addresses.is_empty() && !addresses_equivalent(&stored.addresses, &canonical.addresses);
        let replace_payments =
            !canonical.payments.is_empty() && !payments_equivalent(&stored.payments, &canonical.payments);
        let replace_shipments =
            !canonical.shipments.is_empty() && !shipments_equivalent(&stored.shipments, &canonical.shipments);
        let new_metadata = self.fresh_channel_metadata(&stored, canonical);

        let changed = !diff.is_empty()
            || replace_items
            || replace_addresses
            || replace_payments
            || replace_shipments
            || !new_metadata.is_empty();
        if !changed {
            trace!("📥️ Order {} re-ingested with no changes; skipping persist and emit", existing.id);
            return Ok(IngestOutcome { order: existing, created: false, changed: false, status_change: None });
        }

        let order =
            if diff.is_empty() { existing.clone() } else { self.db.update_order_root(&existing.id, diff).await? };
        if replace_items {
            self.db.replace_order_items(&existing.id, &incoming_items).await?;
        }
        if replace_addresses {
            self.db.replace_addresses(&existing.id, &canonical.addresses).await?;
        }
        if replace_payments {
            self.db.replace_payments(&existing.id, &canonical.payments).await?;
        }
        if replace_shipments {
            self.db.replace_shipments(&existing.id, &canonical.shipments).await?;
        }
        for meta in new_metadata {
            self.db.append_channel_metadata(&existing.id, meta).await?;
        }
        debug!("📥️ Order {} updated from [{}/{}]", order.id, order.external_id, order.integration_id);

        let full = self.load_full(&order).await?;
        self.call_order_event_hook(OrderEventEnvelope::new(OrderEventType::Updated, &full)).await;
        if let Some(change) = &status_change {
            let envelope = OrderEventEnvelope::new(OrderEventType::StatusChanged, &full)
                .with_status_change(&change.previous, &change.current);
            self.call_order_event_hook(envelope).await;
        }
        self.request_score(&full).await;
        Ok(IngestOutcome { order: full.order, created: false, changed: true, status_change })
    }

    /// The transition table is authoritative: moving an order between internal statuses in a
    /// way the table forbids is a validation error. Free-text statuses outside the internal
    /// vocabulary are passed through unchecked.
    fn check_status_transition(&self, existing: &Order, incoming_status: &str) -> Result<(), OrderIngestError> {
        if incoming_status.is_empty() || incoming_status == existing.status {
            return Ok(());
        }
        let (Ok(from), Ok(to)) =
            (existing.status.parse::<OrderStatusType>(), incoming_status.parse::<OrderStatusType>())
        else {
            return Ok(());
        };
        if !from.can_transition_to(to) {
            warn!(
                "📥️ Rejecting illegal status transition {from} -> {to} for order {}. Upstream channels used to get \
                 away with this; it is now a validation error.",
                existing.id
            );
            return Err(OrderIngestError::IllegalStatusTransition { from: from.to_string(), to: to.to_string() });
        }
        Ok(())
    }

    async fn resolve_context(
        &self,
        canonical: &CanonicalOrder,
        customer_id: Option<String>,
    ) -> Result<MappedContext, OrderIngestError> {
        let channel_name =
            if canonical.integration_type.is_empty() { &canonical.platform } else { &canonical.integration_type };
        let integration_type_id = IntegrationType::from_channel_name(channel_name).id();
        let status_id = self.db.resolve_order_status_id(integration_type_id, canonical.channel_status()).await?;
        let payment_status_id =
            self.db.resolve_payment_status_id(normalize_payment_code(&canonical.financial_status)).await?;
        let fulfillment_code = normalize_fulfillment_code(
            (!canonical.fulfillment_status.is_empty()).then_some(canonical.fulfillment_status.as_str()),
        );
        let fulfillment_status_id = self.db.resolve_fulfillment_status_id(fulfillment_code).await?;
        Ok(MappedContext { customer_id, status_id, payment_status_id, fulfillment_status_id })
    }

    /// Attach catalog product ids to the line items that carry a SKU. Items without one are
    /// persisted as-is, unlinked.
    async fn link_products(
        &self,
        business_id: i64,
        items: &[NewOrderItem],
    ) -> Result<Vec<NewOrderItem>, OrderIngestError> {
        let mut linked = Vec::with_capacity(items.len());
        for item in items {
            let mut item = item.clone();
            if item.product_id.is_none() && !item.sku.trim().is_empty() {
                let product = resolve_product(&self.db, business_id, &item.sku, &item.name).await?;
                item.product_id = Some(product.id);
            }
            linked.push(item);
        }
        Ok(linked)
    }

    /// Incoming raw snapshots that differ from the latest stored one. Re-delivering an
    /// identical payload appends nothing, which keeps re-ingestion idempotent.
    fn fresh_channel_metadata(&self, stored: &FullOrder, canonical: &CanonicalOrder) -> Vec<NewChannelMetadata> {
        let latest = stored.channel_metadata.iter().find(|m| m.is_latest).map(|m| m.raw_data.as_str());
        canonical
            .channel_metadata
            .iter()
            .cloned()
            .map(NewChannelMetadata::from)
            .filter(|meta| latest != Some(meta.raw_data.as_str()))
            .collect()
    }

    async fn load_full(&self, order: &Order) -> Result<FullOrder, OrderIngestError> {
        self.db
            .fetch_full_order(&order.id)
            .await?
            .ok_or_else(|| OrderIngestError::OrderNotFound(order.id.clone()))
    }

    async fn call_order_event_hook(&self, envelope: OrderEventEnvelope) {
        for emitter in &self.producers.order_event_producer {
            trace!("📥️ Notifying order event hook subscribers of {}", envelope.event_type);
            emitter.publish_event(envelope.clone()).await;
        }
    }

    async fn request_score(&self, full: &FullOrder) {
        let envelope = OrderEventEnvelope::new(OrderEventType::ScoreCalculationRequested, full);
        self.call_order_event_hook(envelope).await;
    }
}
