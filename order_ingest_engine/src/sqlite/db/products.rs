use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    helpers::new_entity_id,
};

pub async fn fetch_product_by_sku(
    business_id: i64,
    sku: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE business_id = $1 AND sku = $2 AND deleted_at IS NULL LIMIT 1")
        .bind(business_id)
        .bind(sku)
        .fetch_optional(conn)
        .await
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let id = new_entity_id("prd");
    let inserted = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, business_id, sku, name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(product.business_id)
    .bind(&product.sku)
    .bind(&product.name)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] created for sku {} (business {})", inserted.id, inserted.sku, inserted.business_id);
    Ok(inserted)
}
