//! The manual-order adapter.
//!
//! Operators create orders by hand (phone sales, spreadsheet imports) without any channel
//! context. This adapter fills in the blanks — integration binding, external id, a
//! `prob-NNNN` sequential order number — maps the flat request into the canonical DTO and
//! funnels it through the same pipeline as every other channel.

use chrono::Utc;
use log::*;
use order_ingest_engine::{
    canonical::CanonicalOrder,
    db_types::{NewAddress, NewOrderItem, NewPayment, ADDRESS_TYPE_SHIPPING},
    order_objects::IngestOutcome,
    OrderIngestApi,
    OrderIngestDatabase,
    StatusManagement,
};
use pog_common::{MANUAL_ORDER_PREFIX, MANUAL_PLATFORM};
use serde::Deserialize;

use crate::errors::ServerError;

pub const AUTO_ORDER_NUMBER: &str = "AUTO";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualOrderRequest {
    pub business_id: i64,
    #[serde(default)]
    pub integration_id: Option<i64>,
    #[serde(default)]
    pub external_id: Option<String>,
    /// Absent or `"AUTO"` means "assign the next `prob-NNNN` number".
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_dni: String,
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
    pub shipping_street: String,
    #[serde(default)]
    pub shipping_street2: String,
    #[serde(default)]
    pub shipping_city: String,
    #[serde(default)]
    pub shipping_state: String,
    #[serde(default)]
    pub shipping_country: String,
    #[serde(default)]
    pub shipping_postal_code: String,
    #[serde(default)]
    pub shipping_instructions: String,
    #[serde(default)]
    pub payment_method_id: Option<i64>,
    #[serde(default)]
    pub payment_gateway: Option<String>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub notes: String,
}

/// Fill the defaults and hand off to the pipeline. This is the only synchronous creation
/// path, so errors surface to the caller instead of the error sink.
pub async fn create_manual_order<B: OrderIngestDatabase>(
    api: &OrderIngestApi<B>,
    request: ManualOrderRequest,
) -> Result<IngestOutcome, ServerError> {
    if request.business_id == 0 {
        return Err(ServerError::InvalidManualOrder("business_id is required".to_string()));
    }
    let platform = request.platform.clone().filter(|p| !p.is_empty()).unwrap_or_else(|| MANUAL_PLATFORM.to_string());

    let integration_id = match request.integration_id.filter(|id| *id != 0) {
        Some(id) => id,
        None => api
            .db()
            .default_integration_for_business(request.business_id, Some(&platform))
            .await
            .map_err(order_ingest_engine::OrderIngestError::from)?
            .unwrap_or(0),
    };

    let external_id = request
        .external_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{platform}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()));

    let order_number = match request.order_number.as_deref() {
        Some(number) if !number.is_empty() && number != AUTO_ORDER_NUMBER => number.to_string(),
        _ => next_order_number(api, request.business_id).await?,
    };
    debug!("🖊️ Manual order for business {} gets number {order_number}", request.business_id);

    let canonical = to_canonical(&request, &platform, integration_id, &external_id, &order_number);
    Ok(api.map_and_save(canonical).await?)
}

/// The next number in the tenant's `prob-NNNN` sequence.
async fn next_order_number<B: OrderIngestDatabase>(
    api: &OrderIngestApi<B>,
    business_id: i64,
) -> Result<String, ServerError> {
    let last = api
        .db()
        .last_manual_order_number(business_id)
        .await
        .map_err(order_ingest_engine::OrderIngestError::from)?;
    let next = last
        .as_deref()
        .and_then(|number| number.strip_prefix(MANUAL_ORDER_PREFIX))
        .and_then(|suffix| suffix.parse::<u32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    Ok(format!("{MANUAL_ORDER_PREFIX}{next:04}"))
}

fn to_canonical(
    request: &ManualOrderRequest,
    platform: &str,
    integration_id: i64,
    external_id: &str,
    order_number: &str,
) -> CanonicalOrder {
    let mut canonical = CanonicalOrder {
        external_id: external_id.to_string(),
        integration_id,
        business_id: Some(request.business_id),
        integration_type: "platform".to_string(),
        platform: platform.to_string(),
        order_number: order_number.to_string(),
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        customer_dni: request.customer_dni.clone(),
        subtotal: request.subtotal,
        tax: request.tax,
        discount: request.discount,
        shipping_cost: request.shipping_cost,
        total_amount: request.total_amount,
        currency: request.currency.clone(),
        order_items: request.items.clone(),
        ..CanonicalOrder::default()
    };

    if !request.shipping_street.is_empty() || !request.shipping_city.is_empty() {
        canonical.addresses.push(NewAddress {
            address_type: ADDRESS_TYPE_SHIPPING.to_string(),
            contact_name: request.customer_name.clone(),
            phone: request.customer_phone.clone(),
            street: request.shipping_street.clone(),
            street2: request.shipping_street2.clone(),
            city: request.shipping_city.clone(),
            state: request.shipping_state.clone(),
            country: request.shipping_country.clone(),
            postal_code: request.shipping_postal_code.clone(),
            lat: None,
            lng: None,
            instructions: request.shipping_instructions.clone(),
        });
    }

    canonical.payments.push(NewPayment {
        payment_method_id: request.payment_method_id.filter(|id| *id != 0).unwrap_or(1),
        amount: request.total_amount,
        currency: request.currency.clone(),
        gateway: request.payment_gateway.clone(),
        ..NewPayment::default()
    });

    if !request.notes.is_empty() {
        canonical.metadata = Some(serde_json::json!({ "notes": request.notes }));
    }

    canonical
}
