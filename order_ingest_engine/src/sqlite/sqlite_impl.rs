//! `SqliteDatabase` is a concrete implementation of an ingestion engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`traits`](crate::traits) module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{
    addresses,
    channel_metadata,
    clients,
    db_url,
    new_pool,
    order_errors,
    order_items,
    orders,
    payments,
    products,
    shipments,
    statuses,
};
use crate::{
    db_types::{
        Client,
        FullOrder,
        NewAddress,
        NewChannelMetadata,
        NewClient,
        NewOrder,
        NewOrderError,
        NewOrderItem,
        NewPayment,
        NewProduct,
        NewShipment,
        Order,
        OrderError,
        OrderId,
        Product,
    },
    order_objects::{OrderDiff, OrderQueryFilter},
    traits::{
        CatalogApiError,
        CatalogManagement,
        ErrorManagement,
        ErrorSinkError,
        OrderApiError,
        OrderIngestDatabase,
        OrderManagement,
        StatusApiError,
        StatusManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connect using the `POG_DATABASE_URL` environment variable, or the default path.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Run the embedded migrations. Idempotent; called once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn order_exists(&self, external_id: &str, integration_id: i64) -> Result<Option<OrderId>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::order_exists(external_id, integration_id, &mut conn).await
    }

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn fetch_order_by_external_id(
        &self,
        external_id: &str,
        integration_id: i64,
    ) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_external_id(external_id, integration_id, &mut conn).await?)
    }

    async fn fetch_order_by_order_number(
        &self,
        business_id: i64,
        order_number: &str,
    ) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_number(business_id, order_number, &mut conn).await?)
    }

    async fn fetch_full_order(&self, id: &OrderId) -> Result<Option<FullOrder>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_id(id, &mut conn).await? else {
            return Ok(None);
        };
        let items = order_items::fetch_items_for_order(id, &mut conn).await?;
        let addresses = addresses::fetch_addresses_for_order(id, &mut conn).await?;
        let payments = payments::fetch_payments_for_order(id, &mut conn).await?;
        let shipments = shipments::fetch_shipments_for_order(id, &mut conn).await?;
        let channel_metadata = channel_metadata::fetch_metadata_for_order(id, &mut conn).await?;
        Ok(Some(FullOrder { order, items, addresses, payments, shipments, channel_metadata }))
    }

    async fn insert_order_tree(
        &self,
        order: NewOrder,
        items: &[NewOrderItem],
        addrs: &[NewAddress],
        pmts: &[NewPayment],
        shpts: &[NewShipment],
        metadata: &[NewChannelMetadata],
    ) -> Result<Order, OrderApiError> {
        let mut tx = self.pool.begin().await?;
        let inserted = orders::insert_order(order, &mut tx).await?;
        let id = inserted.id.clone();
        order_items::insert_order_items(&id, items, &mut tx).await?;
        addresses::insert_addresses(&id, addrs, &mut tx).await?;
        payments::insert_payments(&id, pmts, &mut tx).await?;
        shipments::insert_shipments(&id, shpts, &mut tx).await?;
        for meta in metadata {
            channel_metadata::insert_channel_metadata(&id, meta, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {id} persisted with {} item(s), {} address(es)", items.len(), addrs.len());
        Ok(inserted)
    }

    async fn update_order_root(&self, id: &OrderId, diff: OrderDiff) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order(id, diff, &mut conn).await
    }

    async fn replace_order_items(&self, id: &OrderId, items: &[NewOrderItem]) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        order_items::delete_items_for_order(id, &mut tx).await?;
        order_items::insert_order_items(id, items, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_addresses(&self, id: &OrderId, addrs: &[NewAddress]) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        addresses::delete_addresses_for_order(id, &mut tx).await?;
        addresses::insert_addresses(id, addrs, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_payments(&self, id: &OrderId, pmts: &[NewPayment]) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        payments::delete_payments_for_order(id, &mut tx).await?;
        payments::insert_payments(id, pmts, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_shipments(&self, id: &OrderId, shpts: &[NewShipment]) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        shipments::delete_shipments_for_order(id, &mut tx).await?;
        shipments::insert_shipments(id, shpts, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn append_channel_metadata(&self, id: &OrderId, meta: NewChannelMetadata) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        channel_metadata::insert_channel_metadata(id, &meta, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(query, &mut conn).await?)
    }

    async fn set_confirmation(&self, id: &OrderId, confirmed: bool) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_confirmation(id, confirmed, &mut conn).await
    }

    async fn append_novelty(&self, id: &OrderId, entry: &str) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::append_novelty(id, entry, &mut conn).await
    }

    async fn update_score(&self, id: &OrderId, score: f64, factors: &[String]) -> Result<(), OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_score(id, score, factors, &mut conn).await
    }

    async fn last_manual_order_number(&self, business_id: i64) -> Result<Option<String>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::last_manual_order_number(business_id, &mut conn).await?)
    }

    async fn count_orders_for_client(&self, client_id: &str) -> Result<i64, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::count_orders_for_client(client_id, &mut conn).await?)
    }

    async fn soft_delete_order(&self, id: &OrderId) -> Result<(), OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::soft_delete_order(id, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_client_by_email(&self, business_id: i64, email: &str) -> Result<Option<Client>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(clients::fetch_client_by_email(business_id, email, &mut conn).await?)
    }

    async fn fetch_client_by_dni(&self, business_id: i64, dni: &str) -> Result<Option<Client>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(clients::fetch_client_by_dni(business_id, dni, &mut conn).await?)
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(clients::insert_client(client, &mut conn).await?)
    }

    async fn fetch_product_by_sku(&self, business_id: i64, sku: &str) -> Result<Option<Product>, CatalogApiError> {
        if sku.trim().is_empty() {
            return Err(CatalogApiError::SkuRequired);
        }
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product_by_sku(business_id, sku, &mut conn).await?)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        if product.sku.trim().is_empty() {
            return Err(CatalogApiError::SkuRequired);
        }
        let mut conn = self.pool.acquire().await?;
        Ok(products::insert_product(product, &mut conn).await?)
    }
}

impl StatusManagement for SqliteDatabase {
    async fn resolve_order_status_id(
        &self,
        integration_type_id: i64,
        original_status: &str,
    ) -> Result<Option<i64>, StatusApiError> {
        if original_status.trim().is_empty() {
            return Ok(None);
        }
        let mut conn = self.pool.acquire().await?;
        Ok(statuses::resolve_order_status_id(integration_type_id, original_status, &mut conn).await?)
    }

    async fn resolve_payment_status_id(&self, code: &str) -> Result<Option<i64>, StatusApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(statuses::resolve_payment_status_id(code, &mut conn).await?)
    }

    async fn resolve_fulfillment_status_id(&self, code: &str) -> Result<Option<i64>, StatusApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(statuses::resolve_fulfillment_status_id(code, &mut conn).await?)
    }

    async fn default_integration_for_business(
        &self,
        business_id: i64,
        platform: Option<&str>,
    ) -> Result<Option<i64>, StatusApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(statuses::default_integration_for_business(business_id, platform, &mut conn).await?)
    }
}

impl ErrorManagement for SqliteDatabase {
    async fn record_order_error(&self, error: NewOrderError) -> Result<OrderError, ErrorSinkError> {
        let mut conn = self.pool.acquire().await?;
        Ok(order_errors::insert_order_error(error, &mut conn).await?)
    }

    async fn fetch_new_order_errors(&self, limit: i64) -> Result<Vec<OrderError>, ErrorSinkError> {
        let mut conn = self.pool.acquire().await?;
        Ok(order_errors::fetch_new_order_errors(limit, &mut conn).await?)
    }
}

impl OrderIngestDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), crate::traits::OrderIngestError> {
        self.pool.close().await;
        Ok(())
    }
}
