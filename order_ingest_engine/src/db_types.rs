use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     --------------------------------------------------------

/// The internal order status vocabulary. Channel statuses are mapped into this space by the
/// status resolver; the raw channel string is preserved in [`Order::original_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    Pending,
    Processing,
    OnHold,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatusType {
    /// The allowed transitions out of each state. Anything not listed here is illegal and is
    /// rejected by the ingestion pipeline.
    pub fn can_transition_to(self, to: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, to),
            (Pending, Processing | Cancelled | OnHold)
                | (Processing, Completed | Cancelled | OnHold | Shipped)
                | (OnHold, Pending | Processing | Cancelled)
                | (Shipped, Delivered | Failed)
                | (Delivered, Refunded)
                | (Completed, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Processing => "processing",
            OrderStatusType::OnHold => "on_hold",
            OrderStatusType::Shipped => "shipped",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Refunded => "refunded",
            OrderStatusType::Failed => "failed",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "on_hold" => Ok(Self::OnHold),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    IntegrationType    --------------------------------------------------------

/// The upstream channels the gateway ingests from. The numeric ids are fixed and shared with
/// the status rule table; 0 means the channel is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    Unknown,
    Shopify,
    Whatsapp,
    Mercadolibre,
    Woocommerce,
}

impl IntegrationType {
    pub fn id(&self) -> i64 {
        match self {
            IntegrationType::Unknown => 0,
            IntegrationType::Shopify => 1,
            IntegrationType::Whatsapp => 2,
            IntegrationType::Mercadolibre => 3,
            IntegrationType::Woocommerce => 4,
        }
    }

    /// Case-insensitive parse, tolerant of the misspellings that show up in real channel
    /// payloads.
    pub fn from_channel_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "shopify" | "shopifi" | "shopfy" => Self::Shopify,
            "whatsapp" | "whats_app" | "whats-app" | "wsp" => Self::Whatsapp,
            "mercadolibre" | "mercado_libre" | "mercado-libre" | "meli" => Self::Mercadolibre,
            "woocommerce" | "woo_commerce" | "woo" | "wordpress" => Self::Woocommerce,
            _ => Self::Unknown,
        }
    }
}

impl Display for IntegrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntegrationType::Unknown => "unknown",
            IntegrationType::Shopify => "shopify",
            IntegrationType::Whatsapp => "whatsapp",
            IntegrationType::Mercadolibre => "mercadolibre",
            IntegrationType::Woocommerce => "woocommerce",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------      PaymentState     --------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl From<String> for PaymentState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => {
                error!("Invalid payment state: {value}. Defaulting to pending");
                Self::Pending
            },
        }
    }
}

//--------------------------------------        OrderId        --------------------------------------------------------

/// Opaque order identifier, assigned at persist time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Order         --------------------------------------------------------

/// The aggregate root. One row per canonical order; satellites hang off [`Order::id`].
///
/// The flat customer/shipping/payment fields are denormalizations filled in by the mapper so
/// that consumers of the event stream (and the scorer) never need to join against the
/// satellite tables.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub business_id: i64,
    pub integration_id: i64,
    pub integration_type: String,
    pub integration_type_id: i64,
    pub platform: String,
    pub external_id: String,
    pub order_number: String,
    pub internal_number: String,
    // Money, store currency
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub shipping_cost: f64,
    pub total_amount: f64,
    pub currency: String,
    pub cod_total: f64,
    // Money, buyer's local (presentment) currency
    pub presentment_subtotal: f64,
    pub presentment_tax: f64,
    pub presentment_discount: f64,
    pub presentment_shipping_cost: f64,
    pub presentment_total: f64,
    pub presentment_currency: String,
    // Customer denormalization
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_dni: String,
    // Shipping denormalization
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_country: String,
    pub shipping_postal_code: String,
    pub shipping_lat: Option<f64>,
    pub shipping_lng: Option<f64>,
    // Payment rollup
    pub payment_method_id: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    // Logistics rollup
    pub tracking_number: Option<String>,
    pub guide: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub warehouse: Option<String>,
    pub driver: Option<String>,
    pub is_last_mile: bool,
    pub weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    // Status
    pub status: String,
    pub original_status: String,
    pub status_id: Option<i64>,
    pub payment_status_id: Option<i64>,
    pub fulfillment_status_id: Option<i64>,
    // Score
    pub delivery_probability: Option<f64>,
    /// JSON array of short human-readable strings. Never NULL; defaults to `[]`.
    pub negative_factors: String,
    // Messaging-driven state
    pub is_confirmed: bool,
    /// Pipe-delimited, append-only log of customer-initiated change requests.
    pub novelty: String,
    // Opaque channel payloads, preserved as JSON text
    pub items: Option<String>,
    pub metadata: Option<String>,
    pub financial_details: Option<String>,
    pub shipping_details: Option<String>,
    pub payment_details: Option<String>,
    pub fulfillment_details: Option<String>,
    // Timestamps
    pub occurred_at: DateTime<Utc>,
    pub imported_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    // Transient fields, never persisted on the root row.
    #[sqlx(default)]
    #[serde(default)]
    pub address2: String,
    #[sqlx(default)]
    #[serde(default)]
    pub customer_order_count: Option<i64>,
}

impl Order {
    /// The parsed [`negative_factors`](Self::negative_factors) column. A malformed value
    /// (which the pipeline never writes) parses as the empty list.
    pub fn factors(&self) -> Vec<String> {
        serde_json::from_str(&self.negative_factors).unwrap_or_default()
    }

    pub fn status_type(&self) -> Option<OrderStatusType> {
        self.status.parse().ok()
    }

    pub fn metadata_json(&self) -> Option<serde_json::Value> {
        self.metadata.as_deref().and_then(|m| serde_json::from_str(m).ok())
    }

    pub fn payment_details_json(&self) -> Option<serde_json::Value> {
        self.payment_details.as_deref().and_then(|m| serde_json::from_str(m).ok())
    }
}

//--------------------------------------       NewOrder        --------------------------------------------------------

/// Everything needed to insert a new order root row. The database assigns the opaque id and
/// the row timestamps; every other field is the mapper's responsibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOrder {
    pub business_id: i64,
    pub integration_id: i64,
    pub integration_type: String,
    pub integration_type_id: i64,
    pub platform: String,
    pub external_id: String,
    pub order_number: String,
    pub internal_number: String,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub shipping_cost: f64,
    pub total_amount: f64,
    pub currency: String,
    pub cod_total: f64,
    pub presentment_subtotal: f64,
    pub presentment_tax: f64,
    pub presentment_discount: f64,
    pub presentment_shipping_cost: f64,
    pub presentment_total: f64,
    pub presentment_currency: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_dni: String,
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_country: String,
    pub shipping_postal_code: String,
    pub shipping_lat: Option<f64>,
    pub shipping_lng: Option<f64>,
    pub payment_method_id: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub guide: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub warehouse: Option<String>,
    pub driver: Option<String>,
    pub is_last_mile: bool,
    pub weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub status: String,
    pub original_status: String,
    pub status_id: Option<i64>,
    pub payment_status_id: Option<i64>,
    pub fulfillment_status_id: Option<i64>,
    pub delivery_probability: Option<f64>,
    pub negative_factors: String,
    pub items: Option<String>,
    pub metadata: Option<String>,
    pub financial_details: Option<String>,
    pub shipping_details: Option<String>,
    pub payment_details: Option<String>,
    pub fulfillment_details: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub imported_at: DateTime<Utc>,
    /// Transient; consumed by the scorer, never written to the root row.
    pub address2: String,
}

//--------------------------------------      OrderItem        --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: Option<String>,
    pub sku: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub title: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub tax: f64,
    pub tax_rate: Option<f64>,
    pub discount: f64,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOrderItem {
    pub product_id: Option<String>,
    pub sku: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub title: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub tax: f64,
    pub tax_rate: Option<f64>,
    pub discount: f64,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub weight: Option<f64>,
}

//--------------------------------------       Address         --------------------------------------------------------

pub const ADDRESS_TYPE_SHIPPING: &str = "shipping";
pub const ADDRESS_TYPE_BILLING: &str = "billing";

/// A shipping or billing address. `address_type` is kept as free text since some channels
/// deliver untyped addresses; the mapper treats an empty type as shipping when it is the only
/// address on the order.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub order_id: OrderId,
    pub address_type: String,
    pub contact_name: String,
    pub phone: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub instructions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAddress {
    pub address_type: String,
    pub contact_name: String,
    pub phone: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub instructions: String,
}

impl NewAddress {
    pub fn is_shipping(&self) -> bool {
        self.address_type == ADDRESS_TYPE_SHIPPING || self.address_type.is_empty()
    }
}

//--------------------------------------       Payment         --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub payment_method_id: i64,
    pub amount: f64,
    pub currency: String,
    pub exchange_rate: Option<f64>,
    pub status: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub gateway: Option<String>,
    pub refund_id: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPayment {
    pub payment_method_id: i64,
    pub amount: f64,
    pub currency: String,
    pub exchange_rate: Option<f64>,
    pub status: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub gateway: Option<String>,
    pub refund_id: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Default for NewPayment {
    fn default() -> Self {
        Self {
            payment_method_id: 0,
            amount: 0.0,
            currency: String::new(),
            exchange_rate: None,
            status: PaymentState::Pending,
            paid_at: None,
            transaction_id: None,
            reference: None,
            gateway: None,
            refund_id: None,
            refunded_at: None,
        }
    }
}

//--------------------------------------       Shipment        --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub order_id: OrderId,
    pub carrier_name: String,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub guide: Option<String>,
    pub guide_url: Option<String>,
    pub status: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cost: f64,
    pub insurance_cost: f64,
    pub weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub warehouse: Option<String>,
    pub driver: Option<String>,
    pub is_last_mile: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewShipment {
    pub carrier_name: String,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub guide: Option<String>,
    pub guide_url: Option<String>,
    pub status: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cost: f64,
    pub insurance_cost: f64,
    pub weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub warehouse: Option<String>,
    pub driver: Option<String>,
    pub is_last_mile: bool,
}

//--------------------------------------    ChannelMetadata    --------------------------------------------------------

/// The raw upstream payload for an order, as received from the channel. Preserved verbatim so
/// downstream systems (and the scorer's address-complement fallback) can reach fields the
/// canonical mapping dropped.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub id: i64,
    pub order_id: OrderId,
    pub channel_source: String,
    pub raw_data: String,
    pub version: i64,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub is_latest: bool,
    pub synced_at: Option<DateTime<Utc>>,
    pub sync_attempts: i64,
}

impl ChannelMetadata {
    pub fn raw_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.raw_data).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewChannelMetadata {
    pub channel_source: String,
    pub raw_data: String,
    pub version: i64,
    pub received_at: Option<DateTime<Utc>>,
}

//--------------------------------------        Client         --------------------------------------------------------

/// A tenant-scoped customer row. Orders reference clients weakly, by id; client rows are only
/// ever created through the customer resolver.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub business_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub dni: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewClient {
    pub business_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub dni: Option<String>,
}

//--------------------------------------        Product        --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub business_id: i64,
    pub sku: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    pub business_id: i64,
    pub sku: String,
    pub name: String,
}

//--------------------------------------      OrderError       --------------------------------------------------------

/// Classification of an unprocessable inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnmarshalError,
    ValidationError,
    ProcessingError,
    DatabaseError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::UnmarshalError => "unmarshal_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ProcessingError => "processing_error",
            ErrorKind::DatabaseError => "database_error",
        };
        write!(f, "{s}")
    }
}

/// A row in the error sink. Append-only; operators resurrect entries by re-publishing
/// `raw_data` to the ingestion queue.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderError {
    pub id: i64,
    pub external_id: Option<String>,
    pub integration_id: Option<i64>,
    pub business_id: Option<i64>,
    pub platform: Option<String>,
    pub error_type: ErrorKind,
    pub error_message: String,
    pub raw_data: Vec<u8>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderError {
    pub external_id: Option<String>,
    pub integration_id: Option<i64>,
    pub business_id: Option<i64>,
    pub platform: Option<String>,
    pub error_type: ErrorKind,
    pub error_message: String,
    pub raw_data: Vec<u8>,
}

//--------------------------------------      FullOrder        --------------------------------------------------------

/// An order root with all satellites preloaded. This is what the publisher and the scorer
/// operate on, so that no consumer of the event stream ever needs to read the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub addresses: Vec<Address>,
    pub payments: Vec<Payment>,
    pub shipments: Vec<Shipment>,
    pub channel_metadata: Vec<ChannelMetadata>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in ["pending", "processing", "on_hold", "shipped", "delivered", "completed", "cancelled", "refunded",
            "failed"]
        {
            let parsed: OrderStatusType = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("paid".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn transition_table() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(OnHold));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Shipped));
        assert!(!Processing.can_transition_to(Refunded));
        assert!(OnHold.can_transition_to(Pending));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Failed));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(Delivered.can_transition_to(Refunded));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Shipped));
    }

    #[test]
    fn integration_type_table() {
        assert_eq!(IntegrationType::from_channel_name("Shopify").id(), 1);
        assert_eq!(IntegrationType::from_channel_name("shopifi").id(), 1);
        assert_eq!(IntegrationType::from_channel_name("WHATS_APP").id(), 2);
        assert_eq!(IntegrationType::from_channel_name("meli").id(), 3);
        assert_eq!(IntegrationType::from_channel_name("woo").id(), 4);
        assert_eq!(IntegrationType::from_channel_name("etsy").id(), 0);
    }
}
