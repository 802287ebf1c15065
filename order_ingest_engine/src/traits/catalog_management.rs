use thiserror::Error;

use crate::db_types::{Client, NewClient, NewProduct, Product};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A SKU is required to resolve a product")]
    SkuRequired,
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// Storage contract for the tenant-scoped catalog rows. Client and product rows are shared
/// across orders; the pipeline only ever creates them through the resolvers.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_client_by_email(&self, business_id: i64, email: &str) -> Result<Option<Client>, CatalogApiError>;

    async fn fetch_client_by_dni(&self, business_id: i64, dni: &str) -> Result<Option<Client>, CatalogApiError>;

    async fn insert_client(&self, client: NewClient) -> Result<Client, CatalogApiError>;

    async fn fetch_product_by_sku(&self, business_id: i64, sku: &str) -> Result<Option<Product>, CatalogApiError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;
}
