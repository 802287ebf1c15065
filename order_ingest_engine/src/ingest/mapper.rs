//! Canonical-to-entity mapping and the derivation rules that run while building the root row.

use chrono::Utc;

use crate::{
    canonical::CanonicalOrder,
    db_types::{IntegrationType, NewOrder, PaymentState},
};

/// Everything the mapper needs that required a database round-trip: the resolved customer and
/// the status-id triplet. Built by the pipeline before mapping.
#[derive(Debug, Clone, Default)]
pub struct MappedContext {
    pub customer_id: Option<String>,
    pub status_id: Option<i64>,
    pub payment_status_id: Option<i64>,
    pub fulfillment_status_id: Option<i64>,
}

/// Build the root row from the canonical DTO, applying the derivation rules:
///
/// * `payment_method_id` falls back to the sentinel `1` when no payment carries one;
/// * `is_paid`/`paid_at` roll up from the first completed payment;
/// * the flat `shipping_*` fields come from the first shipping (or untyped) address, with
///   `street2` concatenated onto the street and kept aside as the transient `address2`;
/// * `integration_type_id` comes from the fixed channel table;
/// * `occurred_at`/`imported_at` default to now;
/// * `negative_factors` starts as the empty list.
pub fn build_new_order(canonical: &CanonicalOrder, ctx: &MappedContext) -> NewOrder {
    let now = Utc::now();
    let integration_type = if canonical.integration_type.is_empty() {
        canonical.platform.clone()
    } else {
        canonical.integration_type.clone()
    };
    let integration_type_id = IntegrationType::from_channel_name(&integration_type).id();

    let mut order = NewOrder {
        business_id: canonical.business_id.unwrap_or_default(),
        integration_id: canonical.integration_id,
        integration_type,
        integration_type_id,
        platform: canonical.platform.clone(),
        external_id: canonical.external_id.clone(),
        order_number: canonical.order_number.clone(),
        internal_number: canonical.internal_number.clone(),
        subtotal: canonical.subtotal,
        tax: canonical.tax,
        discount: canonical.discount,
        shipping_cost: canonical.shipping_cost,
        total_amount: canonical.total_amount,
        currency: canonical.currency.clone(),
        cod_total: canonical.cod_total,
        presentment_subtotal: canonical.presentment_subtotal,
        presentment_tax: canonical.presentment_tax,
        presentment_discount: canonical.presentment_discount,
        presentment_shipping_cost: canonical.presentment_shipping_cost,
        presentment_total: canonical.presentment_total,
        presentment_currency: canonical.presentment_currency.clone(),
        customer_id: ctx.customer_id.clone(),
        customer_name: canonical.full_name(),
        customer_email: canonical.customer_email.trim().to_string(),
        customer_phone: canonical.customer_phone.trim().to_string(),
        customer_dni: canonical.customer_dni.trim().to_string(),
        payment_method_id: 1,
        tracking_number: canonical.tracking_number.clone(),
        guide: canonical.guide.clone(),
        delivery_date: canonical.delivery_date,
        delivered_at: canonical.delivered_at,
        warehouse: canonical.warehouse.clone(),
        driver: canonical.driver.clone(),
        is_last_mile: canonical.is_last_mile,
        weight: canonical.weight,
        height: canonical.height,
        width: canonical.width,
        length: canonical.length,
        status: if canonical.status.is_empty() { "pending".to_string() } else { canonical.status.clone() },
        original_status: canonical.channel_status().to_string(),
        status_id: ctx.status_id,
        payment_status_id: ctx.payment_status_id,
        fulfillment_status_id: ctx.fulfillment_status_id,
        delivery_probability: None,
        negative_factors: "[]".to_string(),
        items: canonical.items.as_ref().map(|v| v.to_string()),
        metadata: canonical.metadata.as_ref().map(|v| v.to_string()),
        financial_details: canonical.financial_details.as_ref().map(|v| v.to_string()),
        shipping_details: canonical.shipping_details.as_ref().map(|v| v.to_string()),
        payment_details: canonical.payment_details.as_ref().map(|v| v.to_string()),
        fulfillment_details: canonical.fulfillment_details.as_ref().map(|v| v.to_string()),
        occurred_at: canonical.occurred_at.unwrap_or(now),
        imported_at: now,
        ..NewOrder::default()
    };

    if let Some(first) = canonical.payments.first() {
        if first.payment_method_id != 0 {
            order.payment_method_id = first.payment_method_id;
        }
        if first.status == PaymentState::Completed && first.paid_at.is_some() {
            order.is_paid = true;
            order.paid_at = first.paid_at;
        }
    }

    if let Some(address) = canonical.addresses.iter().find(|a| a.is_shipping()) {
        order.shipping_street = if address.street2.trim().is_empty() {
            address.street.clone()
        } else {
            format!("{} {}", address.street, address.street2)
        };
        order.address2 = address.street2.clone();
        order.shipping_city = address.city.clone();
        order.shipping_state = address.state.clone();
        order.shipping_country = address.country.clone();
        order.shipping_postal_code = address.postal_code.clone();
        order.shipping_lat = address.lat;
        order.shipping_lng = address.lng;
    }

    order
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        canonical::CanonicalOrderBuilder,
        db_types::{NewPayment, PaymentState},
    };

    fn base() -> CanonicalOrderBuilder {
        CanonicalOrderBuilder::new("EXT-1", 10, 1).platform("shopify").total(115.0, "USD")
    }

    #[test]
    fn payment_method_defaults_to_sentinel() {
        let order = build_new_order(&base().build(), &MappedContext::default());
        assert_eq!(order.payment_method_id, 1);
        assert!(!order.is_paid);
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn paid_rollup_requires_completed_and_timestamp() {
        let paid_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let canonical = base()
            .payment(NewPayment {
                payment_method_id: 4,
                amount: 115.0,
                currency: "USD".into(),
                status: PaymentState::Completed,
                paid_at: Some(paid_at),
                ..NewPayment::default()
            })
            .build();
        let order = build_new_order(&canonical, &MappedContext::default());
        assert_eq!(order.payment_method_id, 4);
        assert!(order.is_paid);
        assert_eq!(order.paid_at, Some(paid_at));

        // completed but no timestamp: not paid
        let mut canonical = base().build();
        canonical.payments.push(NewPayment {
            status: PaymentState::Completed,
            payment_method_id: 4,
            ..NewPayment::default()
        });
        let order = build_new_order(&canonical, &MappedContext::default());
        assert!(!order.is_paid);
    }

    #[test]
    fn shipping_flat_fields_concatenate_street2() {
        let canonical = base().shipping_address("Calle 123", "Apto 201", "Bogotá", "Cundinamarca", "CO").build();
        let order = build_new_order(&canonical, &MappedContext::default());
        assert_eq!(order.shipping_street, "Calle 123 Apto 201");
        assert_eq!(order.address2, "Apto 201");
        assert_eq!(order.shipping_city, "Bogotá");
    }

    #[test]
    fn integration_type_falls_back_to_platform() {
        let mut canonical = base().build();
        canonical.integration_type = String::new();
        let order = build_new_order(&canonical, &MappedContext::default());
        assert_eq!(order.integration_type, "shopify");
        assert_eq!(order.integration_type_id, 1);
    }

    #[test]
    fn timestamps_default_to_now() {
        let order = build_new_order(&base().build(), &MappedContext::default());
        assert!(order.occurred_at.timestamp() > 0);
        assert!(order.imported_at.timestamp() > 0);
        assert_eq!(order.negative_factors, "[]");
    }

    #[test]
    fn explicit_occurred_at_is_preserved() {
        let at = Utc.with_ymd_and_hms(2024, 4, 30, 8, 30, 0).unwrap();
        let order = build_new_order(&base().occurred_at(at).build(), &MappedContext::default());
        assert_eq!(order.occurred_at, at);
    }

    #[test]
    fn empty_status_defaults_to_pending() {
        let order = build_new_order(&base().build(), &MappedContext::default());
        assert_eq!(order.status, "pending");
        let order = build_new_order(&base().status("completed").build(), &MappedContext::default());
        assert_eq!(order.status, "completed");
    }

    #[test]
    fn opaque_payloads_pass_through() {
        let canonical = base().metadata(serde_json::json!({"tags": "vip"})).build();
        let order = build_new_order(&canonical, &MappedContext::default());
        assert_eq!(order.metadata.as_deref(), Some(r#"{"tags":"vip"}"#));
    }
}
