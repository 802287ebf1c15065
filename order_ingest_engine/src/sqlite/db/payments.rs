use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, OrderId, Payment};

pub async fn insert_payments(
    order_id: &OrderId,
    payments: &[NewPayment],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for payment in payments {
        sqlx::query(
            r#"
            INSERT INTO payments (
                order_id, payment_method_id, amount, currency, exchange_rate, status,
                paid_at, transaction_id, reference, gateway, refund_id, refunded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order_id.as_str())
        .bind(payment.payment_method_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.exchange_rate)
        .bind(payment.status.to_string())
        .bind(payment.paid_at)
        .bind(&payment.transaction_id)
        .bind(&payment.reference)
        .bind(&payment.gateway)
        .bind(&payment.refund_id)
        .bind(payment.refunded_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_payments_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn delete_payments_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM payments WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
    Ok(())
}
