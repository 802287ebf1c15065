use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId},
    helpers::new_entity_id,
    order_objects::{OrderDiff, OrderQueryFilter},
    traits::OrderApiError,
};

/// Inserts a new order root row. The opaque id is generated here; the database enforces the
/// `(external_id, integration_id)` uniqueness that makes re-ingestion converge on the update
/// path.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderApiError> {
    let id = OrderId(new_entity_id("ord"));
    let inserted = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                id, business_id, integration_id, integration_type, integration_type_id, platform,
                external_id, order_number, internal_number,
                subtotal, tax, discount, shipping_cost, total_amount, currency, cod_total,
                presentment_subtotal, presentment_tax, presentment_discount,
                presentment_shipping_cost, presentment_total, presentment_currency,
                customer_id, customer_name, customer_email, customer_phone, customer_dni,
                shipping_street, shipping_city, shipping_state, shipping_country,
                shipping_postal_code, shipping_lat, shipping_lng,
                payment_method_id, is_paid, paid_at,
                tracking_number, guide, delivery_date, delivered_at, warehouse, driver,
                is_last_mile, weight, height, width, length,
                status, original_status, status_id, payment_status_id, fulfillment_status_id,
                delivery_probability, negative_factors,
                items, metadata, financial_details, shipping_details, payment_details,
                fulfillment_details, occurred_at, imported_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34,
                $35, $36, $37, $38, $39, $40, $41, $42, $43, $44, $45, $46, $47, $48, $49, $50,
                $51, $52, $53, $54, $55, $56, $57, $58, $59, $60, $61, $62, $63
            )
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(order.business_id)
    .bind(order.integration_id)
    .bind(&order.integration_type)
    .bind(order.integration_type_id)
    .bind(&order.platform)
    .bind(&order.external_id)
    .bind(&order.order_number)
    .bind(&order.internal_number)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.discount)
    .bind(order.shipping_cost)
    .bind(order.total_amount)
    .bind(&order.currency)
    .bind(order.cod_total)
    .bind(order.presentment_subtotal)
    .bind(order.presentment_tax)
    .bind(order.presentment_discount)
    .bind(order.presentment_shipping_cost)
    .bind(order.presentment_total)
    .bind(&order.presentment_currency)
    .bind(&order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.customer_dni)
    .bind(&order.shipping_street)
    .bind(&order.shipping_city)
    .bind(&order.shipping_state)
    .bind(&order.shipping_country)
    .bind(&order.shipping_postal_code)
    .bind(order.shipping_lat)
    .bind(order.shipping_lng)
    .bind(order.payment_method_id)
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(&order.tracking_number)
    .bind(&order.guide)
    .bind(order.delivery_date)
    .bind(order.delivered_at)
    .bind(&order.warehouse)
    .bind(&order.driver)
    .bind(order.is_last_mile)
    .bind(order.weight)
    .bind(order.height)
    .bind(order.width)
    .bind(order.length)
    .bind(&order.status)
    .bind(&order.original_status)
    .bind(order.status_id)
    .bind(order.payment_status_id)
    .bind(order.fulfillment_status_id)
    .bind(order.delivery_probability)
    .bind(&order.negative_factors)
    .bind(&order.items)
    .bind(&order.metadata)
    .bind(&order.financial_details)
    .bind(&order.shipping_details)
    .bind(&order.payment_details)
    .bind(&order.fulfillment_details)
    .bind(order.occurred_at)
    .bind(order.imported_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}/{}] inserted with id {}", order.external_id, order.integration_id, inserted.id);
    Ok(inserted)
}

pub async fn fetch_order_by_id(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order_by_external_id(
    external_id: &str,
    integration_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE external_id = $1 AND integration_id = $2 AND deleted_at IS NULL")
        .bind(external_id)
        .bind(integration_id)
        .fetch_optional(conn)
        .await
}

/// Checks whether an order with this channel identity exists, returning its opaque id.
pub async fn order_exists(
    external_id: &str,
    integration_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderId>, OrderApiError> {
    let order = fetch_order_by_external_id(external_id, integration_id, conn).await?;
    Ok(order.map(|o| o.id))
}

pub async fn fetch_order_by_order_number(
    business_id: i64,
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders WHERE business_id = $1 AND order_number = $2 AND deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(business_id)
    .bind(order_number)
    .fetch_optional(conn)
    .await
}

/// Applies a field diff to the root row. Only the columns present in the diff are touched.
pub async fn update_order(
    id: &OrderId,
    diff: OrderDiff,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    if diff.is_empty() {
        trace!("🗃️ Empty diff for order {id}; returning the stored row untouched");
        return fetch_order_by_id(id, conn).await?.ok_or_else(|| OrderApiError::OrderNotFound(id.clone()));
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    macro_rules! push_field {
        ($field:ident) => {
            if let Some(value) = diff.$field {
                set_clause.push(concat!(stringify!($field), " = "));
                set_clause.push_bind_unseparated(value);
            }
        };
    }
    push_field!(order_number);
    push_field!(internal_number);
    push_field!(subtotal);
    push_field!(tax);
    push_field!(discount);
    push_field!(shipping_cost);
    push_field!(total_amount);
    push_field!(currency);
    push_field!(cod_total);
    push_field!(presentment_subtotal);
    push_field!(presentment_tax);
    push_field!(presentment_discount);
    push_field!(presentment_shipping_cost);
    push_field!(presentment_total);
    push_field!(presentment_currency);
    push_field!(customer_id);
    push_field!(customer_name);
    push_field!(customer_email);
    push_field!(customer_phone);
    push_field!(customer_dni);
    push_field!(shipping_street);
    push_field!(shipping_city);
    push_field!(shipping_state);
    push_field!(shipping_country);
    push_field!(shipping_postal_code);
    push_field!(shipping_lat);
    push_field!(shipping_lng);
    push_field!(payment_method_id);
    push_field!(is_paid);
    push_field!(paid_at);
    push_field!(tracking_number);
    push_field!(guide);
    push_field!(delivery_date);
    push_field!(delivered_at);
    push_field!(warehouse);
    push_field!(driver);
    push_field!(is_last_mile);
    push_field!(weight);
    push_field!(height);
    push_field!(width);
    push_field!(length);
    push_field!(status);
    push_field!(original_status);
    push_field!(status_id);
    push_field!(payment_status_id);
    push_field!(fulfillment_status_id);
    push_field!(items);
    push_field!(metadata);
    push_field!(financial_details);
    push_field!(shipping_details);
    push_field!(payment_details);
    push_field!(fulfillment_details);
    push_field!(occurred_at);
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str());
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let updated = builder
        .build()
        .fetch_optional(conn)
        .await?
        .map(|row: SqliteRow| Order::from_row(&row))
        .transpose()?;
    updated.ok_or_else(|| OrderApiError::OrderNotFound(id.clone()))
}

/// Fetches orders according to the criteria in the `OrderQueryFilter`, ordered by
/// `created_at` ascending.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE deleted_at IS NULL");
    if let Some(business_id) = query.business_id {
        builder.push(" AND business_id = ");
        builder.push_bind(business_id);
    }
    if let Some(integration_id) = query.integration_id {
        builder.push(" AND integration_id = ");
        builder.push_bind(integration_id);
    }
    if let Some(external_id) = query.external_id {
        builder.push(" AND external_id = ");
        builder.push_bind(external_id);
    }
    if let Some(order_number) = query.order_number {
        builder.push(" AND order_number = ");
        builder.push_bind(order_number);
    }
    if let Some(email) = query.customer_email {
        builder.push(" AND customer_email = ");
        builder.push_bind(email);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        builder.push(format!(" AND status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at <= ");
        builder.push_bind(until);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_all(conn).await
}

pub async fn set_confirmation(
    id: &OrderId,
    confirmed: bool,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET is_confirmed = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(confirmed)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| OrderApiError::OrderNotFound(id.clone()))
}

/// Appends to the pipe-delimited novelty log. Prior content is preserved.
pub async fn append_novelty(id: &OrderId, entry: &str, conn: &mut SqliteConnection) -> Result<Order, OrderApiError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders
        SET novelty = CASE WHEN novelty = '' THEN $1 ELSE novelty || ' | ' || $1 END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(entry)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| OrderApiError::OrderNotFound(id.clone()))
}

pub async fn update_score(
    id: &OrderId,
    score: f64,
    factors: &[String],
    conn: &mut SqliteConnection,
) -> Result<(), OrderApiError> {
    let factors_json = serde_json::to_string(factors).unwrap_or_else(|_| "[]".to_string());
    let rows = sqlx::query(
        "UPDATE orders SET delivery_probability = $1, negative_factors = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $3",
    )
    .bind(score)
    .bind(factors_json)
    .bind(id.as_str())
    .execute(conn)
    .await?
    .rows_affected();
    if rows == 0 {
        return Err(OrderApiError::OrderNotFound(id.clone()));
    }
    Ok(())
}

/// The most recent manual order number (`prob-NNNN`) for the tenant. The zero-padded suffix
/// makes lexicographic MAX equal to numeric MAX.
pub async fn last_manual_order_number(
    business_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT MAX(order_number) FROM orders WHERE business_id = $1 AND order_number LIKE 'prob-%'",
    )
    .bind(business_id)
    .fetch_one(conn)
    .await
}

pub async fn count_orders_for_client(client_id: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1 AND deleted_at IS NULL")
        .bind(client_id)
        .fetch_one(conn)
        .await
}

pub async fn soft_delete_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<(), OrderApiError> {
    let rows = sqlx::query(
        "UPDATE orders SET deleted_at = CURRENT_TIMESTAMP WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id.as_str())
    .execute(conn)
    .await?
    .rows_affected();
    if rows == 0 {
        return Err(OrderApiError::OrderNotFound(id.clone()));
    }
    Ok(())
}
