use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{ChannelMetadata, NewChannelMetadata, OrderId};

/// Appends a raw channel snapshot. The newest snapshot is the only one flagged `is_latest`.
pub async fn insert_channel_metadata(
    order_id: &OrderId,
    meta: &NewChannelMetadata,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE order_channel_metadata SET is_latest = 0 WHERE order_id = $1")
        .bind(order_id.as_str())
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO order_channel_metadata (
            order_id, channel_source, raw_data, version, received_at, is_latest
        ) VALUES ($1, $2, $3, $4, $5, 1)
        "#,
    )
    .bind(order_id.as_str())
    .bind(&meta.channel_source)
    .bind(&meta.raw_data)
    .bind(meta.version)
    .bind(meta.received_at.unwrap_or_else(Utc::now))
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_metadata_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<ChannelMetadata>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_channel_metadata WHERE order_id = $1 ORDER BY is_latest DESC, id DESC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}
