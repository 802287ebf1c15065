use sqlx::SqliteConnection;

use crate::db_types::{NewOrderItem, OrderId, OrderItem};

pub async fn insert_order_items(
    order_id: &OrderId,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, product_id, sku, variant_id, name, title, quantity,
                unit_price, total_price, tax, tax_rate, discount, image_url, product_url, weight
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order_id.as_str())
        .bind(&item.product_id)
        .bind(&item.sku)
        .bind(&item.variant_id)
        .bind(&item.name)
        .bind(&item.title)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(item.tax)
        .bind(item.tax_rate)
        .bind(item.discount)
        .bind(&item.image_url)
        .bind(&item.product_url)
        .bind(item.weight)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_items_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn delete_items_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
    Ok(())
}
