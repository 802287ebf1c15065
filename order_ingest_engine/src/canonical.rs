//! The canonical order envelope.
//!
//! Every integration adapter (storefront webhook bridges, messaging bots, CSV importers, the
//! manual-order adapter) normalizes its channel payload into this shape before handing off to
//! the ingestion pipeline, usually via the `probability.orders.canonical` queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{NewAddress, NewChannelMetadata, NewOrderItem, NewPayment, NewShipment};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalOrder {
    // Required identity. `external_id` non-empty, `integration_id` and `business_id` non-zero.
    pub external_id: String,
    #[serde(default)]
    pub integration_id: i64,
    #[serde(default)]
    pub business_id: Option<i64>,
    #[serde(default)]
    pub integration_type: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub internal_number: String,
    // Money
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub cod_total: f64,
    #[serde(default)]
    pub presentment_subtotal: f64,
    #[serde(default)]
    pub presentment_tax: f64,
    #[serde(default)]
    pub presentment_discount: f64,
    #[serde(default)]
    pub presentment_shipping_cost: f64,
    #[serde(default)]
    pub presentment_total: f64,
    #[serde(default)]
    pub presentment_currency: String,
    // Customer
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_dni: String,
    // Status, in the channel's vocabulary (`original_status`) and, when the adapter already
    // speaks the internal vocabulary, `status` directly.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub original_status: String,
    #[serde(default)]
    pub financial_status: String,
    #[serde(default)]
    pub fulfillment_status: String,
    // Logistics
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub guide: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub is_last_mile: bool,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub length: f64,
    // Satellites
    #[serde(default)]
    pub order_items: Vec<NewOrderItem>,
    #[serde(default)]
    pub addresses: Vec<NewAddress>,
    #[serde(default)]
    pub payments: Vec<NewPayment>,
    #[serde(default)]
    pub shipments: Vec<NewShipment>,
    #[serde(default)]
    pub channel_metadata: Vec<CanonicalChannelMetadata>,
    // Opaque payloads, passed through unchanged
    #[serde(default)]
    pub items: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub financial_details: Option<Value>,
    #[serde(default)]
    pub shipping_details: Option<Value>,
    #[serde(default)]
    pub payment_details: Option<Value>,
    #[serde(default)]
    pub fulfillment_details: Option<Value>,
    /// The time the order happened at the upstream channel. Defaults to ingestion time.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl CanonicalOrder {
    /// The customer's display name: the explicit name field, or first + last when the channel
    /// delivered them split.
    pub fn full_name(&self) -> String {
        if !self.customer_name.trim().is_empty() {
            return self.customer_name.trim().to_string();
        }
        let joined = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        joined.trim().to_string()
    }

    /// The channel status string to run through the status resolver.
    pub fn channel_status(&self) -> &str {
        if self.original_status.is_empty() { &self.status } else { &self.original_status }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalChannelMetadata {
    #[serde(default)]
    pub channel_source: String,
    #[serde(default)]
    pub raw_data: Value,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl From<CanonicalChannelMetadata> for NewChannelMetadata {
    fn from(value: CanonicalChannelMetadata) -> Self {
        Self {
            channel_source: value.channel_source,
            raw_data: value.raw_data.to_string(),
            version: value.version,
            received_at: value.received_at,
        }
    }
}

//--------------------------------------  CanonicalOrderBuilder  ------------------------------------------------------

/// Fluent builder over [`CanonicalOrder`], mainly for tests and the manual-order adapter.
#[derive(Debug, Clone, Default)]
pub struct CanonicalOrderBuilder {
    order: CanonicalOrder,
}

impl CanonicalOrderBuilder {
    pub fn new(external_id: &str, integration_id: i64, business_id: i64) -> Self {
        let order = CanonicalOrder {
            external_id: external_id.to_string(),
            integration_id,
            business_id: Some(business_id),
            ..CanonicalOrder::default()
        };
        Self { order }
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.order.platform = platform.to_string();
        if self.order.integration_type.is_empty() {
            self.order.integration_type = platform.to_string();
        }
        self
    }

    pub fn order_number(mut self, number: &str) -> Self {
        self.order.order_number = number.to_string();
        self
    }

    pub fn total(mut self, total: f64, currency: &str) -> Self {
        self.order.total_amount = total;
        self.order.currency = currency.to_string();
        self
    }

    pub fn customer(mut self, name: &str, email: &str, phone: &str) -> Self {
        self.order.customer_name = name.to_string();
        self.order.customer_email = email.to_string();
        self.order.customer_phone = phone.to_string();
        self
    }

    pub fn dni(mut self, dni: &str) -> Self {
        self.order.customer_dni = dni.to_string();
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.order.status = status.to_string();
        self
    }

    pub fn original_status(mut self, status: &str) -> Self {
        self.order.original_status = status.to_string();
        self
    }

    pub fn financial_status(mut self, status: &str) -> Self {
        self.order.financial_status = status.to_string();
        self
    }

    pub fn shipping_address(mut self, street: &str, street2: &str, city: &str, state: &str, country: &str) -> Self {
        self.order.addresses.push(NewAddress {
            address_type: super::db_types::ADDRESS_TYPE_SHIPPING.to_string(),
            street: street.to_string(),
            street2: street2.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            country: country.to_string(),
            ..NewAddress::default()
        });
        self
    }

    pub fn item(mut self, sku: &str, name: &str, quantity: i64, unit_price: f64) -> Self {
        self.order.order_items.push(NewOrderItem {
            sku: sku.to_string(),
            name: name.to_string(),
            quantity,
            unit_price,
            total_price: unit_price * quantity as f64,
            ..NewOrderItem::default()
        });
        self
    }

    pub fn payment(mut self, payment: NewPayment) -> Self {
        self.order.payments.push(payment);
        self
    }

    pub fn shipment(mut self, shipment: NewShipment) -> Self {
        self.order.shipments.push(shipment);
        self
    }

    pub fn channel_snapshot(mut self, source: &str, raw: Value) -> Self {
        self.order.channel_metadata.push(CanonicalChannelMetadata {
            channel_source: source.to_string(),
            raw_data: raw,
            version: 1,
            received_at: None,
        });
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.order.metadata = Some(metadata);
        self
    }

    pub fn payment_details(mut self, details: Value) -> Self {
        self.order.payment_details = Some(details);
        self
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.order.occurred_at = Some(at);
        self
    }

    pub fn build(self) -> CanonicalOrder {
        self.order
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_minimal_envelope() {
        let payload = r#"{
            "external_id": "EXT-1",
            "integration_id": 10,
            "business_id": 1,
            "platform": "shopify",
            "total_amount": 115.0,
            "currency": "USD",
            "customer_email": "a@b.com",
            "order_number": "ORD-1"
        }"#;
        let order: CanonicalOrder = serde_json::from_str(payload).unwrap();
        assert_eq!(order.external_id, "EXT-1");
        assert_eq!(order.integration_id, 10);
        assert_eq!(order.business_id, Some(1));
        assert_eq!(order.total_amount, 115.0);
        assert!(order.order_items.is_empty());
        assert!(order.addresses.is_empty());
    }

    #[test]
    fn satellite_arrays_pass_through() {
        let payload = r#"{
            "external_id": "EXT-2",
            "integration_id": 3,
            "business_id": 7,
            "order_items": [{"sku": "SKU-1", "name": "Widget", "quantity": 2, "unit_price": 10.0, "total_price": 20.0}],
            "payments": [{"payment_method_id": 4, "amount": 20.0, "currency": "COP", "status": "completed", "gateway": "cod"}],
            "metadata": {"tags": "vip, contra entrega"}
        }"#;
        let order: CanonicalOrder = serde_json::from_str(payload).unwrap();
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.order_items[0].quantity, 2);
        assert_eq!(order.payments[0].gateway.as_deref(), Some("cod"));
        assert!(order.metadata.unwrap().get("tags").is_some());
    }

    #[test]
    fn full_name_prefers_explicit_name() {
        let mut order = CanonicalOrder { customer_name: "Juan Perez".into(), ..CanonicalOrder::default() };
        assert_eq!(order.full_name(), "Juan Perez");
        order.customer_name = String::new();
        order.first_name = "Juan".into();
        order.last_name = "Perez".into();
        assert_eq!(order.full_name(), "Juan Perez");
        order.last_name = String::new();
        assert_eq!(order.full_name(), "Juan");
    }
}
