//! End-to-end pipeline tests over a throwaway SQLite database.

mod support;

use order_ingest_engine::{
    canonical::CanonicalOrderBuilder,
    db_types::{NewPayment, PaymentState},
    events::OrderEventType,
    order_objects::OrderQueryFilter,
    OrderIngestError,
    OrderManagement,
};
use support::{setup, tear_down};

#[tokio::test]
async fn happy_create_emits_created_event() {
    let (api, log) = setup().await;
    let canonical = CanonicalOrderBuilder::new("EXT-1", 10, 1)
        .platform("shopify")
        .order_number("ORD-1")
        .total(115.0, "USD")
        .customer("", "a@b.com", "")
        .build();

    let outcome = api.map_and_save(canonical).await.expect("Error ingesting order");
    assert!(outcome.created);
    assert!(!outcome.order.id.as_str().is_empty());
    assert_eq!(outcome.order.business_id, 1);
    assert_eq!(outcome.order.payment_method_id, 1);
    assert_eq!(outcome.order.negative_factors, "[]");
    assert!(outcome.order.occurred_at.timestamp() > 0);
    assert!(outcome.order.imported_at.timestamp() > 0);

    log.settle().await;
    let created = log.of_type(OrderEventType::Created);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].order.items_summary, "Sin items");
    assert_eq!(created[0].order.shipping_address, "");
    assert_eq!(created[0].order.total_amount, 115.0);
    assert_eq!(log.of_type(OrderEventType::ScoreCalculationRequested).len(), 1);
    tear_down(api).await;
}

#[tokio::test]
async fn reingest_without_changes_is_silent() {
    let (api, log) = setup().await;
    let canonical = CanonicalOrderBuilder::new("EXT-2", 10, 1)
        .platform("shopify")
        .order_number("ORD-2")
        .total(99.0, "USD")
        .customer("Juan Perez", "juan@ejemplo.com", "+57300")
        .build();

    let first = api.map_and_save(canonical.clone()).await.expect("first ingest failed");
    assert!(first.created);
    let second = api.map_and_save(canonical).await.expect("second ingest failed");
    assert!(!second.created);
    assert!(!second.changed);
    assert_eq!(first.order.id, second.order.id);

    let rows = api
        .db()
        .search_orders(OrderQueryFilter::default().with_business_id(1).with_order_number("ORD-2"))
        .await
        .expect("search failed");
    assert_eq!(rows.len(), 1);

    log.settle().await;
    assert_eq!(log.of_type(OrderEventType::Created).len(), 1);
    assert_eq!(log.of_type(OrderEventType::Updated).len(), 0);
    tear_down(api).await;
}

#[tokio::test]
async fn status_transition_emits_status_changed() {
    let (api, log) = setup().await;
    let base = CanonicalOrderBuilder::new("EXT-3", 10, 1)
        .platform("shopify")
        .order_number("ORD-3")
        .total(10.0, "USD")
        .customer("Juan Perez", "juan@ejemplo.com", "+57300");

    api.map_and_save(base.clone().status("pending").build()).await.expect("create failed");
    // pending -> completed is not allowed directly; go through processing.
    api.map_and_save(base.clone().status("processing").build()).await.expect("processing failed");
    let outcome = api.map_and_save(base.status("completed").build()).await.expect("completed failed");
    assert!(outcome.changed);
    assert_eq!(outcome.order.status, "completed");
    let change = outcome.status_change.expect("expected a status change");
    assert_eq!(change.previous, "processing");
    assert_eq!(change.current, "completed");

    log.settle().await;
    let changed = log.of_type(OrderEventType::StatusChanged);
    assert_eq!(changed.len(), 2);
    // Handler tasks run concurrently, so don't rely on arrival order.
    assert!(changed.iter().any(|e| e.changes.previous_status.as_deref() == Some("pending")
        && e.changes.current_status.as_deref() == Some("processing")));
    assert!(changed.iter().any(|e| e.changes.previous_status.as_deref() == Some("processing")
        && e.changes.current_status.as_deref() == Some("completed")));
    assert!(log.of_type(OrderEventType::Updated).len() >= 2);
    tear_down(api).await;
}

#[tokio::test]
async fn illegal_status_transition_is_rejected() {
    let (api, log) = setup().await;
    let base = CanonicalOrderBuilder::new("EXT-4", 10, 1)
        .platform("shopify")
        .order_number("ORD-4")
        .total(10.0, "USD");

    api.map_and_save(base.clone().status("pending").build()).await.expect("create failed");
    let err = api.map_and_save(base.status("delivered").build()).await.expect_err("transition should fail");
    assert!(matches!(err, OrderIngestError::IllegalStatusTransition { .. }));

    log.settle().await;
    assert_eq!(log.of_type(OrderEventType::Updated).len(), 0);
    tear_down(api).await;
}

#[tokio::test]
async fn validation_rejects_missing_identity() {
    let (api, _log) = setup().await;
    let mut canonical = CanonicalOrderBuilder::new("EXT-5", 10, 1).build();
    canonical.integration_id = 0;
    let err = api.map_and_save(canonical).await.expect_err("should fail");
    assert!(matches!(err, OrderIngestError::IntegrationIdRequired));
    assert!(err.to_string().contains("integration_id is required"));

    let mut canonical = CanonicalOrderBuilder::new("EXT-5", 10, 1).build();
    canonical.business_id = None;
    let err = api.map_and_save(canonical).await.expect_err("should fail");
    assert!(matches!(err, OrderIngestError::BusinessIdRequired));
    assert!(err.to_string().contains("business_id is required"));
    tear_down(api).await;
}

#[tokio::test]
async fn customer_resolver_reuses_the_client_row() {
    let (api, _log) = setup().await;
    let first = api
        .map_and_save(
            CanonicalOrderBuilder::new("EXT-6", 10, 1)
                .platform("shopify")
                .customer("Maria Lopez", "maria@ejemplo.com", "+57311")
                .total(5.0, "USD")
                .build(),
        )
        .await
        .expect("first ingest failed");
    let second = api
        .map_and_save(
            CanonicalOrderBuilder::new("EXT-7", 10, 1)
                .platform("shopify")
                .customer("Maria Lopez", "maria@ejemplo.com", "+57311")
                .total(7.0, "USD")
                .build(),
        )
        .await
        .expect("second ingest failed");

    let customer_id = first.order.customer_id.clone().expect("client should be created");
    assert_eq!(second.order.customer_id.as_deref(), Some(customer_id.as_str()));
    let count = api.db().count_orders_for_client(&customer_id).await.expect("count failed");
    assert_eq!(count, 2);
    tear_down(api).await;
}

#[tokio::test]
async fn anonymous_orders_stay_unlinked() {
    let (api, _log) = setup().await;
    let outcome = api
        .map_and_save(CanonicalOrderBuilder::new("EXT-8", 10, 1).platform("shopify").total(5.0, "USD").build())
        .await
        .expect("ingest failed");
    assert!(outcome.order.customer_id.is_none());
    tear_down(api).await;
}

#[tokio::test]
async fn items_create_products_and_replace_structurally() {
    let (api, _log) = setup().await;
    let base = CanonicalOrderBuilder::new("EXT-9", 10, 1).platform("shopify").total(30.0, "USD");

    let outcome = api
        .map_and_save(base.clone().item("SKU-W", "Widget", 2, 10.0).build())
        .await
        .expect("create failed");
    let full = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch failed").expect("order exists");
    assert_eq!(full.items.len(), 1);
    assert!(full.items[0].product_id.is_some(), "item should be linked to an auto-created product");

    // Same SKU again plus a new line: products are reused, items are replaced wholesale.
    let outcome = api
        .map_and_save(base.item("SKU-W", "Widget", 2, 10.0).item("SKU-G", "Gadget", 1, 10.0).build())
        .await
        .expect("update failed");
    let updated = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch failed").expect("order exists");
    assert_eq!(updated.items.len(), 2);
    assert_eq!(updated.items[0].product_id, full.items[0].product_id);
    tear_down(api).await;
}

#[tokio::test]
async fn shrinking_satellites_are_not_applied() {
    let (api, _log) = setup().await;
    let with_address = CanonicalOrderBuilder::new("EXT-10", 10, 1)
        .platform("shopify")
        .total(20.0, "USD")
        .shipping_address("Calle 1", "Apto 2", "Bogotá", "DC", "CO")
        .build();
    let outcome = api.map_and_save(with_address).await.expect("create failed");

    // A sparse re-delivery with no addresses must not wipe the stored ones.
    let sparse = CanonicalOrderBuilder::new("EXT-10", 10, 1).platform("shopify").total(25.0, "USD").build();
    api.map_and_save(sparse).await.expect("update failed");
    let full = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch failed").expect("order exists");
    assert_eq!(full.addresses.len(), 1);
    assert_eq!(full.order.total_amount, 25.0);
    tear_down(api).await;
}

#[tokio::test]
async fn paid_rollup_and_presentment_fields_persist() {
    let (api, _log) = setup().await;
    let paid_at = chrono::Utc::now();
    let canonical = CanonicalOrderBuilder::new("EXT-11", 10, 1)
        .platform("shopify")
        .total(115.0, "USD")
        .payment(NewPayment {
            payment_method_id: 4,
            amount: 115.0,
            currency: "USD".into(),
            status: PaymentState::Completed,
            paid_at: Some(paid_at),
            gateway: Some("bancolombia".into()),
            ..NewPayment::default()
        })
        .build();
    let outcome = api.map_and_save(canonical).await.expect("ingest failed");
    assert!(outcome.order.is_paid);
    assert_eq!(outcome.order.payment_method_id, 4);
    assert!(outcome.order.paid_at.is_some());

    let full = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch failed").expect("order exists");
    assert_eq!(full.payments.len(), 1);
    assert_eq!(full.payments[0].status, PaymentState::Completed);
    tear_down(api).await;
}

#[tokio::test]
async fn novelty_log_preserves_history() {
    let (api, _log) = setup().await;
    let outcome = api
        .map_and_save(CanonicalOrderBuilder::new("EXT-N", 10, 1).platform("whatsapp").total(10.0, "COP").build())
        .await
        .expect("ingest failed");

    api.db().append_novelty(&outcome.order.id, "Cancelación solicitada vía WhatsApp: tarde (Teléfono: +1)")
        .await
        .expect("first append failed");
    let order = api
        .db()
        .append_novelty(&outcome.order.id, "Novedad vía WhatsApp [cambio de dirección]: Calle 9 (Teléfono: +1)")
        .await
        .expect("second append failed");
    assert_eq!(
        order.novelty,
        "Cancelación solicitada vía WhatsApp: tarde (Teléfono: +1) | Novedad vía WhatsApp [cambio de dirección]: \
         Calle 9 (Teléfono: +1)"
    );
    tear_down(api).await;
}

#[tokio::test]
async fn soft_deleted_orders_disappear_from_reads() {
    let (api, _log) = setup().await;
    let outcome = api
        .map_and_save(CanonicalOrderBuilder::new("EXT-D", 10, 1).platform("shopify").total(10.0, "USD").build())
        .await
        .expect("ingest failed");

    api.db().soft_delete_order(&outcome.order.id).await.expect("soft delete failed");
    assert!(api.db().fetch_order_by_id(&outcome.order.id).await.expect("fetch failed").is_none());
    assert!(api.db().fetch_order_by_external_id("EXT-D", 10).await.expect("fetch failed").is_none());
    tear_down(api).await;
}

#[tokio::test]
async fn search_filters_by_status() {
    let (api, _log) = setup().await;
    api.map_and_save(
        CanonicalOrderBuilder::new("EXT-S1", 10, 1).platform("shopify").status("pending").total(1.0, "USD").build(),
    )
    .await
    .expect("ingest failed");
    api.map_and_save(
        CanonicalOrderBuilder::new("EXT-S2", 10, 1).platform("shopify").status("processing").total(2.0, "USD").build(),
    )
    .await
    .expect("ingest failed");

    let pending = api
        .db()
        .search_orders(
            OrderQueryFilter::default()
                .with_business_id(1)
                .with_status(order_ingest_engine::db_types::OrderStatusType::Pending),
        )
        .await
        .expect("search failed");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].external_id, "EXT-S1");
    tear_down(api).await;
}

#[tokio::test]
async fn channel_metadata_versions_append_only_when_fresh() {
    let (api, _log) = setup().await;
    let base = CanonicalOrderBuilder::new("EXT-12", 10, 1).platform("shopify").total(10.0, "USD");
    let snap_a = base.clone().channel_snapshot("shopify", serde_json::json!({"v": 1})).build();
    let outcome = api.map_and_save(snap_a.clone()).await.expect("create failed");

    // Identical snapshot: nothing appended.
    api.map_and_save(snap_a).await.expect("re-ingest failed");
    let full = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch").expect("order exists");
    assert_eq!(full.channel_metadata.len(), 1);

    // New raw payload: appended, latest flag moves.
    let snap_b = base.channel_snapshot("shopify", serde_json::json!({"v": 2})).build();
    api.map_and_save(snap_b).await.expect("update failed");
    let full = api.db().fetch_full_order(&outcome.order.id).await.expect("fetch").expect("order exists");
    assert_eq!(full.channel_metadata.len(), 2);
    assert_eq!(full.channel_metadata.iter().filter(|m| m.is_latest).count(), 1);
    tear_down(api).await;
}
