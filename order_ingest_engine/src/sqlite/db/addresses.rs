use sqlx::SqliteConnection;

use crate::db_types::{Address, NewAddress, OrderId};

pub async fn insert_addresses(
    order_id: &OrderId,
    addresses: &[NewAddress],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for address in addresses {
        sqlx::query(
            r#"
            INSERT INTO addresses (
                order_id, address_type, contact_name, phone, street, street2,
                city, state, country, postal_code, lat, lng, instructions
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order_id.as_str())
        .bind(&address.address_type)
        .bind(&address.contact_name)
        .bind(&address.phone)
        .bind(&address.street)
        .bind(&address.street2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(address.lat)
        .bind(address.lng)
        .bind(&address.instructions)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_addresses_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn delete_addresses_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM addresses WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
    Ok(())
}
