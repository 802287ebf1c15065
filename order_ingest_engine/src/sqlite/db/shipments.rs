use sqlx::SqliteConnection;

use crate::db_types::{NewShipment, OrderId, Shipment};

pub async fn insert_shipments(
    order_id: &OrderId,
    shipments: &[NewShipment],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for shipment in shipments {
        sqlx::query(
            r#"
            INSERT INTO shipments (
                order_id, carrier_name, tracking_number, tracking_url, guide, guide_url,
                status, shipped_at, delivered_at, cost, insurance_cost,
                weight, height, width, length, warehouse, driver, is_last_mile
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(order_id.as_str())
        .bind(&shipment.carrier_name)
        .bind(&shipment.tracking_number)
        .bind(&shipment.tracking_url)
        .bind(&shipment.guide)
        .bind(&shipment.guide_url)
        .bind(&shipment.status)
        .bind(shipment.shipped_at)
        .bind(shipment.delivered_at)
        .bind(shipment.cost)
        .bind(shipment.insurance_cost)
        .bind(shipment.weight)
        .bind(shipment.height)
        .bind(shipment.width)
        .bind(shipment.length)
        .bind(&shipment.warehouse)
        .bind(&shipment.driver)
        .bind(shipment.is_last_mile)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_shipments_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Shipment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shipments WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn delete_shipments_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM shipments WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
    Ok(())
}
