use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Client, NewClient},
    helpers::new_entity_id,
};

pub async fn fetch_client_by_email(
    business_id: i64,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM clients WHERE business_id = $1 AND email = $2 AND deleted_at IS NULL LIMIT 1",
    )
    .bind(business_id)
    .bind(email)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_client_by_dni(
    business_id: i64,
    dni: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM clients WHERE business_id = $1 AND dni = $2 AND deleted_at IS NULL LIMIT 1")
        .bind(business_id)
        .bind(dni)
        .fetch_optional(conn)
        .await
}

pub async fn insert_client(client: NewClient, conn: &mut SqliteConnection) -> Result<Client, sqlx::Error> {
    let id = new_entity_id("cli");
    let inserted = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (id, business_id, name, email, phone, dni)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(client.business_id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.dni)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Client [{}] created for business {}", inserted.id, inserted.business_id);
    Ok(inserted)
}
