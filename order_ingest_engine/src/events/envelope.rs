//! The enriched event envelope.
//!
//! Every publish carries a complete [`OrderSnapshot`] so that downstream consumers (invoicing,
//! inventory, messaging, scoring) never need to read the database. The envelope is built once
//! and serialized once; the pub/sub and broker legs carry byte-identical payloads.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{FullOrder, Order, OrderItem},
    events::OrderEventType,
};

/// Format: `YYYYMMDDhhmmss-<6-digit-random>`. Consumers dedupe on this across the two
/// delivery channels.
pub fn new_event_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{}-{:06}", Utc::now().format("%Y%m%d%H%M%S"), rng.gen_range(0..1_000_000u32))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEventEnvelope {
    pub event_id: String,
    pub event_type: OrderEventType,
    pub order_id: String,
    pub business_id: Option<i64>,
    pub integration_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub order: OrderSnapshot,
    #[serde(default)]
    pub changes: EventChanges,
    #[serde(default)]
    pub metadata: Value,
}

impl OrderEventEnvelope {
    pub fn new(event_type: OrderEventType, full: &FullOrder) -> Self {
        let order = OrderSnapshot::from_full_order(full);
        Self {
            event_id: new_event_id(),
            event_type,
            order_id: full.order.id.as_str().to_string(),
            business_id: Some(full.order.business_id),
            integration_id: Some(full.order.integration_id),
            timestamp: Utc::now(),
            order,
            changes: EventChanges::default(),
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_status_change(mut self, previous: &str, current: &str) -> Self {
        self.changes.previous_status = Some(previous.to_string());
        self.changes.current_status = Some(current.to_string());
        self.changes.platform = Some(self.order.platform.clone());
        self
    }

    pub fn with_metadata_entry(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.metadata {
            map.insert(key.to_string(), value);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// The complete order state as of the event. Field names are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: String,
    pub order_number: String,
    pub internal_number: String,
    pub external_id: String,
    pub total_amount: f64,
    pub currency: String,
    pub payment_method_id: i64,
    pub payment_status_id: Option<i64>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub shipping_cost: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_dni: String,
    pub platform: String,
    pub integration_id: i64,
    pub order_status_id: Option<i64>,
    pub fulfillment_status_id: Option<i64>,
    pub items: Vec<SnapshotItem>,
    /// Human-readable one-liner, e.g. `"2x Widget, 1x Gadget"`; `"Sin items"` when the order
    /// has no line items.
    pub items_summary: String,
    /// `"street, city, state, country"`, skipping empty components; empty when the order has
    /// no shipping address at all.
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderSnapshot {
    pub fn from_full_order(full: &FullOrder) -> Self {
        Self::build(&full.order, &full.items)
    }

    pub fn build(order: &Order, items: &[OrderItem]) -> Self {
        let snapshot_items = items.iter().map(SnapshotItem::from).collect::<Vec<_>>();
        Self {
            id: order.id.as_str().to_string(),
            order_number: order.order_number.clone(),
            internal_number: order.internal_number.clone(),
            external_id: order.external_id.clone(),
            total_amount: order.total_amount,
            currency: order.currency.clone(),
            payment_method_id: order.payment_method_id,
            payment_status_id: order.payment_status_id,
            subtotal: order.subtotal,
            tax: order.tax,
            discount: order.discount,
            shipping_cost: order.shipping_cost,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_dni: order.customer_dni.clone(),
            platform: order.platform.clone(),
            integration_id: order.integration_id,
            order_status_id: order.status_id,
            fulfillment_status_id: order.fulfillment_status_id,
            items_summary: items_summary(items),
            shipping_address: shipping_address_line(order),
            items: snapshot_items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub product_id: Option<String>,
    pub sku: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub title: Option<String>,
    pub qty: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub tax: f64,
    pub tax_rate: Option<f64>,
    pub discount: f64,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
}

impl From<&OrderItem> for SnapshotItem {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            sku: item.sku.clone(),
            variant_id: item.variant_id.clone(),
            name: item.name.clone(),
            title: item.title.clone(),
            qty: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
            tax: item.tax,
            tax_rate: item.tax_rate,
            discount: item.discount,
            image_url: item.image_url.clone(),
            product_url: item.product_url.clone(),
        }
    }
}

fn items_summary(items: &[OrderItem]) -> String {
    if items.is_empty() {
        return "Sin items".to_string();
    }
    items.iter().map(|i| format!("{}x {}", i.quantity, i.name)).collect::<Vec<_>>().join(", ")
}

fn shipping_address_line(order: &Order) -> String {
    [&order.shipping_street, &order.shipping_city, &order.shipping_state, &order.shipping_country]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::OrderId;

    fn bare_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId("ord-1".into()),
            business_id: 1,
            integration_id: 10,
            integration_type: "shopify".into(),
            integration_type_id: 1,
            platform: "shopify".into(),
            external_id: "EXT-1".into(),
            order_number: "ORD-1".into(),
            internal_number: String::new(),
            subtotal: 100.0,
            tax: 15.0,
            discount: 0.0,
            shipping_cost: 0.0,
            total_amount: 115.0,
            currency: "USD".into(),
            cod_total: 0.0,
            presentment_subtotal: 0.0,
            presentment_tax: 0.0,
            presentment_discount: 0.0,
            presentment_shipping_cost: 0.0,
            presentment_total: 0.0,
            presentment_currency: String::new(),
            customer_id: None,
            customer_name: String::new(),
            customer_email: "a@b.com".into(),
            customer_phone: String::new(),
            customer_dni: String::new(),
            shipping_street: String::new(),
            shipping_city: String::new(),
            shipping_state: String::new(),
            shipping_country: String::new(),
            shipping_postal_code: String::new(),
            shipping_lat: None,
            shipping_lng: None,
            payment_method_id: 1,
            is_paid: false,
            paid_at: None,
            tracking_number: None,
            guide: None,
            delivery_date: None,
            delivered_at: None,
            warehouse: None,
            driver: None,
            is_last_mile: false,
            weight: 0.0,
            height: 0.0,
            width: 0.0,
            length: 0.0,
            status: "pending".into(),
            original_status: String::new(),
            status_id: None,
            payment_status_id: None,
            fulfillment_status_id: None,
            delivery_probability: None,
            negative_factors: "[]".into(),
            is_confirmed: false,
            novelty: String::new(),
            items: None,
            metadata: None,
            financial_details: None,
            shipping_details: None,
            payment_details: None,
            fulfillment_details: None,
            occurred_at: now,
            imported_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            address2: String::new(),
            customer_order_count: None,
        }
    }

    fn item(name: &str, qty: i64) -> OrderItem {
        OrderItem {
            id: 0,
            order_id: OrderId("ord-1".into()),
            product_id: None,
            sku: format!("SKU-{name}"),
            variant_id: None,
            name: name.into(),
            title: None,
            quantity: qty,
            unit_price: 10.0,
            total_price: 10.0 * qty as f64,
            tax: 0.0,
            tax_rate: None,
            discount: 0.0,
            image_url: None,
            product_url: None,
            weight: None,
        }
    }

    #[test]
    fn event_id_shape() {
        let id = new_event_id();
        let (stamp, random) = id.split_once('-').unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(random.len(), 6);
        assert!(random.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn empty_order_summary() {
        let snapshot = OrderSnapshot::build(&bare_order(), &[]);
        assert_eq!(snapshot.items_summary, "Sin items");
        assert_eq!(snapshot.shipping_address, "");
    }

    #[test]
    fn items_and_address_summaries() {
        let mut order = bare_order();
        order.shipping_street = "Calle 123 # 45-67".into();
        order.shipping_city = "Bogotá".into();
        order.shipping_country = "CO".into();
        let items = vec![item("Widget", 2), item("Gadget", 1)];
        let snapshot = OrderSnapshot::build(&order, &items);
        assert_eq!(snapshot.items_summary, "2x Widget, 1x Gadget");
        assert_eq!(snapshot.shipping_address, "Calle 123 # 45-67, Bogotá, CO");
    }

    #[test]
    fn status_change_metadata() {
        let full = FullOrder {
            order: bare_order(),
            items: vec![],
            addresses: vec![],
            payments: vec![],
            shipments: vec![],
            channel_metadata: vec![],
        };
        let envelope = OrderEventEnvelope::new(OrderEventType::StatusChanged, &full)
            .with_status_change("pending", "completed")
            .with_metadata_entry("cancellation_source", serde_json::json!("whatsapp"));
        assert_eq!(envelope.changes.previous_status.as_deref(), Some("pending"));
        assert_eq!(envelope.changes.current_status.as_deref(), Some("completed"));
        assert_eq!(envelope.metadata["cancellation_source"], "whatsapp");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event_type"], "order.status_changed");
        assert_eq!(json["order"]["items_summary"], "Sin items");
    }
}
