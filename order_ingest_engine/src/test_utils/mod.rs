//! Fixtures and environment helpers shared by unit and integration tests.

use chrono::Utc;
use serde_json::Value;

use crate::db_types::{
    Address,
    ChannelMetadata,
    FullOrder,
    NewPayment,
    Order,
    OrderId,
    Payment,
};

/// A minimal, valid, already-persisted order root. Tests override the fields they care about.
pub fn sample_order() -> Order {
    let now = Utc::now();
    Order {
        id: OrderId("ord-test".into()),
        business_id: 1,
        integration_id: 10,
        integration_type: "shopify".into(),
        integration_type_id: 1,
        platform: "shopify".into(),
        external_id: "EXT-TEST".into(),
        order_number: "ORD-TEST".into(),
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
        customer_name: "Juan Perez".into(),
        customer_email: "juan.perez@ejemplo.com".into(),
        customer_phone: "+573001234567".into(),
        customer_dni: String::new(),
        shipping_street: "Calle 123 # 45-67".into(),
        shipping_city: "Bogotá".into(),
        shipping_state: "Cundinamarca".into(),
        shipping_country: "CO".into(),
        shipping_postal_code: "110111".into(),
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
        original_status: "pending".into(),
        status_id: Some(1),
        payment_status_id: Some(1),
        fulfillment_status_id: Some(1),
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

pub fn full_order_from(order: Order) -> FullOrder {
    FullOrder { order, items: vec![], addresses: vec![], payments: vec![], shipments: vec![], channel_metadata: vec![] }
}

pub fn sample_payment_row(payment: NewPayment) -> Payment {
    Payment {
        id: 1,
        order_id: OrderId("ord-test".into()),
        payment_method_id: payment.payment_method_id,
        amount: payment.amount,
        currency: payment.currency,
        exchange_rate: payment.exchange_rate,
        status: payment.status,
        paid_at: payment.paid_at,
        transaction_id: payment.transaction_id,
        reference: payment.reference,
        gateway: payment.gateway,
        refund_id: payment.refund_id,
        refunded_at: payment.refunded_at,
    }
}

pub fn sample_address_row(address_type: &str, street: &str) -> Address {
    Address {
        id: 1,
        order_id: OrderId("ord-test".into()),
        address_type: address_type.into(),
        contact_name: String::new(),
        phone: String::new(),
        street: street.into(),
        street2: String::new(),
        city: String::new(),
        state: String::new(),
        country: String::new(),
        postal_code: String::new(),
        lat: None,
        lng: None,
        instructions: String::new(),
    }
}

pub fn sample_metadata_row(raw: Value) -> ChannelMetadata {
    ChannelMetadata {
        id: 1,
        order_id: OrderId("ord-test".into()),
        channel_source: "shopify".into(),
        raw_data: raw.to_string(),
        version: 1,
        received_at: Utc::now(),
        processed_at: None,
        is_latest: true,
        synced_at: None,
        sync_attempts: 0,
    }
}

#[cfg(feature = "sqlite")]
pub mod prepare_env {
    use rand::Rng;

    /// A unique throwaway SQLite path so parallel tests never share state.
    pub fn random_db_path() -> String {
        let mut rng = rand::thread_rng();
        format!("sqlite:///tmp/pog_test_{:016x}.db", rng.gen::<u64>())
    }

    pub async fn prepare_test_env(url: &str) {
        #[cfg(feature = "test_utils")]
        {
            dotenvy::from_filename(".env.test").ok();
            let _ = env_logger::try_init();
        }
        use sqlx::migrate::MigrateDatabase;
        sqlx::Sqlite::create_database(url).await.expect("Error creating test database");
    }
}
