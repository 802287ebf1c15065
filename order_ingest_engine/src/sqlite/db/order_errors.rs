use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrderError, OrderError};

pub async fn insert_order_error(error: NewOrderError, conn: &mut SqliteConnection) -> Result<OrderError, sqlx::Error> {
    let inserted = sqlx::query_as::<_, OrderError>(
        r#"
        INSERT INTO order_errors (
            external_id, integration_id, business_id, platform, error_type, error_message, raw_data
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&error.external_id)
    .bind(error.integration_id)
    .bind(error.business_id)
    .bind(&error.platform)
    .bind(error.error_type.to_string())
    .bind(&error.error_message)
    .bind(&error.raw_data)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order error #{} recorded ({})", inserted.id, inserted.error_type);
    Ok(inserted)
}

pub async fn fetch_new_order_errors(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderError>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_errors WHERE status = 'new' ORDER BY id ASC LIMIT $1")
        .bind(limit)
        .fetch_all(conn)
        .await
}
