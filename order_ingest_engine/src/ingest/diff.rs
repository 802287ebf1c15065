//! Field-by-field diffing between a stored order and an incoming canonical mapping.
//!
//! Channel adapters send sparse payloads: a follow-up webhook routinely omits fields the
//! first delivery carried. Zero values (empty strings, 0.0, `None`) are therefore read as
//! "absent" rather than "erase" — a field only enters the diff when the incoming value is
//! present and differs from the stored one. Booleans latch upward for the same reason.

use crate::{
    db_types::{Address, NewAddress, NewOrder, NewOrderItem, NewPayment, NewShipment, Order, OrderItem, Payment, Shipment},
    order_objects::OrderDiff,
};

pub fn compute_diff(existing: &Order, incoming: &NewOrder) -> OrderDiff {
    let mut diff = OrderDiff::default();

    macro_rules! diff_str {
        ($field:ident) => {
            if !incoming.$field.is_empty() && incoming.$field != existing.$field {
                diff.$field = Some(incoming.$field.clone());
            }
        };
    }
    macro_rules! diff_num {
        ($field:ident) => {
            if incoming.$field != 0.0 && incoming.$field != existing.$field {
                diff.$field = Some(incoming.$field);
            }
        };
    }
    macro_rules! diff_opt {
        ($field:ident) => {
            if incoming.$field.is_some() && incoming.$field != existing.$field {
                diff.$field = Some(incoming.$field.clone());
            }
        };
    }

    diff_str!(order_number);
    diff_str!(internal_number);
    diff_str!(currency);
    diff_str!(presentment_currency);
    diff_str!(customer_name);
    diff_str!(customer_email);
    diff_str!(customer_phone);
    diff_str!(customer_dni);
    diff_str!(shipping_street);
    diff_str!(shipping_city);
    diff_str!(shipping_state);
    diff_str!(shipping_country);
    diff_str!(shipping_postal_code);
    diff_str!(status);
    diff_str!(original_status);

    diff_num!(subtotal);
    diff_num!(tax);
    diff_num!(discount);
    diff_num!(shipping_cost);
    diff_num!(total_amount);
    diff_num!(cod_total);
    diff_num!(presentment_subtotal);
    diff_num!(presentment_tax);
    diff_num!(presentment_discount);
    diff_num!(presentment_shipping_cost);
    diff_num!(presentment_total);
    diff_num!(weight);
    diff_num!(height);
    diff_num!(width);
    diff_num!(length);

    diff_opt!(customer_id);
    diff_opt!(shipping_lat);
    diff_opt!(shipping_lng);
    diff_opt!(paid_at);
    diff_opt!(tracking_number);
    diff_opt!(guide);
    diff_opt!(delivery_date);
    diff_opt!(delivered_at);
    diff_opt!(warehouse);
    diff_opt!(driver);
    diff_opt!(status_id);
    diff_opt!(payment_status_id);
    diff_opt!(fulfillment_status_id);
    diff_opt!(items);
    diff_opt!(metadata);
    diff_opt!(financial_details);
    diff_opt!(shipping_details);
    diff_opt!(payment_details);
    diff_opt!(fulfillment_details);

    // The sentinel payment method means "no payment information came with this delivery".
    if incoming.payment_method_id != 1 && incoming.payment_method_id != existing.payment_method_id {
        diff.payment_method_id = Some(incoming.payment_method_id);
    }
    if incoming.is_paid && !existing.is_paid {
        diff.is_paid = Some(true);
    }
    if incoming.is_last_mile && !existing.is_last_mile {
        diff.is_last_mile = Some(true);
    }
    if incoming.occurred_at != existing.occurred_at {
        diff.occurred_at = Some(incoming.occurred_at);
    }

    diff
}

// Stored-row views of the satellite insert types, for structural comparison.

fn item_as_new(item: &OrderItem) -> NewOrderItem {
    NewOrderItem {
        product_id: item.product_id.clone(),
        sku: item.sku.clone(),
        variant_id: item.variant_id.clone(),
        name: item.name.clone(),
        title: item.title.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        total_price: item.total_price,
        tax: item.tax,
        tax_rate: item.tax_rate,
        discount: item.discount,
        image_url: item.image_url.clone(),
        product_url: item.product_url.clone(),
        weight: item.weight,
    }
}

fn address_as_new(address: &Address) -> NewAddress {
    NewAddress {
        address_type: address.address_type.clone(),
        contact_name: address.contact_name.clone(),
        phone: address.phone.clone(),
        street: address.street.clone(),
        street2: address.street2.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        country: address.country.clone(),
        postal_code: address.postal_code.clone(),
        lat: address.lat,
        lng: address.lng,
        instructions: address.instructions.clone(),
    }
}

fn payment_as_new(payment: &Payment) -> NewPayment {
    NewPayment {
        payment_method_id: payment.payment_method_id,
        amount: payment.amount,
        currency: payment.currency.clone(),
        exchange_rate: payment.exchange_rate,
        status: payment.status,
        paid_at: payment.paid_at,
        transaction_id: payment.transaction_id.clone(),
        reference: payment.reference.clone(),
        gateway: payment.gateway.clone(),
        refund_id: payment.refund_id.clone(),
        refunded_at: payment.refunded_at,
    }
}

fn shipment_as_new(shipment: &Shipment) -> NewShipment {
    NewShipment {
        carrier_name: shipment.carrier_name.clone(),
        tracking_number: shipment.tracking_number.clone(),
        tracking_url: shipment.tracking_url.clone(),
        guide: shipment.guide.clone(),
        guide_url: shipment.guide_url.clone(),
        status: shipment.status.clone(),
        shipped_at: shipment.shipped_at,
        delivered_at: shipment.delivered_at,
        cost: shipment.cost,
        insurance_cost: shipment.insurance_cost,
        weight: shipment.weight,
        height: shipment.height,
        width: shipment.width,
        length: shipment.length,
        warehouse: shipment.warehouse.clone(),
        driver: shipment.driver.clone(),
        is_last_mile: shipment.is_last_mile,
    }
}

pub fn items_equivalent(stored: &[OrderItem], incoming: &[NewOrderItem]) -> bool {
    stored.len() == incoming.len() && stored.iter().map(item_as_new).zip(incoming).all(|(a, b)| &a == b)
}

pub fn addresses_equivalent(stored: &[Address], incoming: &[NewAddress]) -> bool {
    stored.len() == incoming.len() && stored.iter().map(address_as_new).zip(incoming).all(|(a, b)| &a == b)
}

pub fn payments_equivalent(stored: &[Payment], incoming: &[NewPayment]) -> bool {
    stored.len() == incoming.len() && stored.iter().map(payment_as_new).zip(incoming).all(|(a, b)| &a == b)
}

pub fn shipments_equivalent(stored: &[Shipment], incoming: &[NewShipment]) -> bool {
    stored.len() == incoming.len() && stored.iter().map(shipment_as_new).zip(incoming).all(|(a, b)| &a == b)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        canonical::CanonicalOrderBuilder,
        ingest::mapper::{build_new_order, MappedContext},
        test_utils::sample_order,
    };

    fn incoming_like(existing: &Order) -> NewOrder {
        let canonical = CanonicalOrderBuilder::new(&existing.external_id, existing.integration_id, existing.business_id)
            .platform(&existing.platform)
            .order_number(&existing.order_number)
            .total(existing.total_amount, &existing.currency)
            .customer(&existing.customer_name, &existing.customer_email, &existing.customer_phone)
            .status(&existing.status)
            .original_status(&existing.original_status)
            .build();
        let mut incoming = build_new_order(&canonical, &MappedContext {
            customer_id: existing.customer_id.clone(),
            status_id: existing.status_id,
            payment_status_id: existing.payment_status_id,
            fulfillment_status_id: existing.fulfillment_status_id,
        });
        incoming.subtotal = existing.subtotal;
        incoming.tax = existing.tax;
        incoming.occurred_at = existing.occurred_at;
        incoming
    }

    #[test]
    fn identical_mapping_produces_empty_diff() {
        let existing = sample_order();
        let incoming = incoming_like(&existing);
        assert!(compute_diff(&existing, &incoming).is_empty());
    }

    #[test]
    fn sparse_payload_does_not_erase() {
        let existing = sample_order();
        let mut incoming = incoming_like(&existing);
        incoming.customer_email = String::new();
        incoming.total_amount = 0.0;
        let diff = compute_diff(&existing, &incoming);
        assert!(diff.customer_email.is_none());
        assert!(diff.total_amount.is_none());
    }

    #[test]
    fn changed_status_enters_the_diff() {
        let existing = sample_order();
        let mut incoming = incoming_like(&existing);
        incoming.status = "completed".into();
        let diff = compute_diff(&existing, &incoming);
        assert_eq!(diff.status.as_deref(), Some("completed"));
    }

    #[test]
    fn paid_flag_latches_up_only() {
        let mut existing = sample_order();
        let mut incoming = incoming_like(&existing);
        incoming.is_paid = true;
        assert_eq!(compute_diff(&existing, &incoming).is_paid, Some(true));

        existing.is_paid = true;
        incoming.is_paid = false;
        assert!(compute_diff(&existing, &incoming).is_paid.is_none());
    }

    #[test]
    fn satellite_equivalence_is_structural() {
        let stored = vec![];
        let incoming = vec![NewOrderItem { sku: "SKU-1".into(), quantity: 1, ..NewOrderItem::default() }];
        assert!(!items_equivalent(&stored, &incoming));
        assert!(items_equivalent(&[], &[]));
    }
}
