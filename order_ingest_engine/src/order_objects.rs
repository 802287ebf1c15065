//! Query and result objects shared between the public API and the backend traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Search criteria for orders. Every field is optional; empty filter means "everything for the
/// tenant the caller scoped to".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub business_id: Option<i64>,
    pub integration_id: Option<i64>,
    pub external_id: Option<String>,
    pub order_number: Option<String>,
    pub customer_email: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.business_id.is_none()
            && self.integration_id.is_none()
            && self.external_id.is_none()
            && self.order_number.is_none()
            && self.customer_email.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn with_business_id(mut self, id: i64) -> Self {
        self.business_id = Some(id);
        self
    }

    pub fn with_order_number(mut self, number: &str) -> Self {
        self.order_number = Some(number.to_string());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }
}

/// The result of a `map_and_save` call.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub order: Order,
    /// True when a new row was inserted; false when the call converged on the update path.
    pub created: bool,
    /// True when the update path mutated at least one field.
    pub changed: bool,
    /// Set when the internal status moved, so callers can see the observed transition.
    pub status_change: Option<StatusChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: String,
    pub current: String,
}

/// Field-by-field difference between a stored order root and an incoming canonical mapping.
/// `None` means "unchanged, leave the column alone". Nullable columns use a nested `Option` so
/// a diff can explicitly null a value out.
#[derive(Debug, Clone, Default)]
pub struct OrderDiff {
    pub order_number: Option<String>,
    pub internal_number: Option<String>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub discount: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub cod_total: Option<f64>,
    pub presentment_subtotal: Option<f64>,
    pub presentment_tax: Option<f64>,
    pub presentment_discount: Option<f64>,
    pub presentment_shipping_cost: Option<f64>,
    pub presentment_total: Option<f64>,
    pub presentment_currency: Option<String>,
    pub customer_id: Option<Option<String>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_dni: Option<String>,
    pub shipping_street: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_lat: Option<Option<f64>>,
    pub shipping_lng: Option<Option<f64>>,
    pub payment_method_id: Option<i64>,
    pub is_paid: Option<bool>,
    pub paid_at: Option<Option<DateTime<Utc>>>,
    pub tracking_number: Option<Option<String>>,
    pub guide: Option<Option<String>>,
    pub delivery_date: Option<Option<DateTime<Utc>>>,
    pub delivered_at: Option<Option<DateTime<Utc>>>,
    pub warehouse: Option<Option<String>>,
    pub driver: Option<Option<String>>,
    pub is_last_mile: Option<bool>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub status: Option<String>,
    pub original_status: Option<String>,
    pub status_id: Option<Option<i64>>,
    pub payment_status_id: Option<Option<i64>>,
    pub fulfillment_status_id: Option<Option<i64>>,
    pub items: Option<Option<String>>,
    pub metadata: Option<Option<String>>,
    pub financial_details: Option<Option<String>>,
    pub shipping_details: Option<Option<String>>,
    pub payment_details: Option<Option<String>>,
    pub fulfillment_details: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl OrderDiff {
    pub fn is_empty(&self) -> bool {
        // A diff is empty iff no setter fired. Checking the handful of fields the update path
        // can actually produce would be fragile; this enumerates all of them.
        self.order_number.is_none()
            && self.internal_number.is_none()
            && self.subtotal.is_none()
            && self.tax.is_none()
            && self.discount.is_none()
            && self.shipping_cost.is_none()
            && self.total_amount.is_none()
            && self.currency.is_none()
            && self.cod_total.is_none()
            && self.presentment_subtotal.is_none()
            && self.presentment_tax.is_none()
            && self.presentment_discount.is_none()
            && self.presentment_shipping_cost.is_none()
            && self.presentment_total.is_none()
            && self.presentment_currency.is_none()
            && self.customer_id.is_none()
            && self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.customer_phone.is_none()
            && self.customer_dni.is_none()
            && self.shipping_street.is_none()
            && self.shipping_city.is_none()
            && self.shipping_state.is_none()
            && self.shipping_country.is_none()
            && self.shipping_postal_code.is_none()
            && self.shipping_lat.is_none()
            && self.shipping_lng.is_none()
            && self.payment_method_id.is_none()
            && self.is_paid.is_none()
            && self.paid_at.is_none()
            && self.tracking_number.is_none()
            && self.guide.is_none()
            && self.delivery_date.is_none()
            && self.delivered_at.is_none()
            && self.warehouse.is_none()
            && self.driver.is_none()
            && self.is_last_mile.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.width.is_none()
            && self.length.is_none()
            && self.status.is_none()
            && self.original_status.is_none()
            && self.status_id.is_none()
            && self.payment_status_id.is_none()
            && self.fulfillment_status_id.is_none()
            && self.items.is_none()
            && self.metadata.is_none()
            && self.financial_details.is_none()
            && self.shipping_details.is_none()
            && self.payment_details.is_none()
            && self.fulfillment_details.is_none()
            && self.occurred_at.is_none()
    }
}
