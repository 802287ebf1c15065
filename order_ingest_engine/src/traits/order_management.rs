use thiserror::Error;

use crate::{
    db_types::{
        FullOrder,
        NewAddress,
        NewChannelMetadata,
        NewOrder,
        NewOrderItem,
        NewPayment,
        NewShipment,
        Order,
        OrderId,
    },
    order_objects::{OrderDiff, OrderQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists. {0}")]
    AlreadyExists(String),
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db) if db.message().contains("UNIQUE constraint failed") => OrderApiError::AlreadyExists(db.message().to_string()),
            Some(db) if db.message().contains("FOREIGN KEY constraint failed") => {
                OrderApiError::DataIntegrity(db.message().to_string())
            },
            _ => OrderApiError::DatabaseError(e.to_string()),
        }
    }
}

/// Storage contract for the order aggregate and its satellites.
///
/// The root insert is the durability point: [`insert_order_tree`](OrderManagement::insert_order_tree)
/// runs root + satellites in one transaction, so a satellite write failure rolls the whole
/// order back.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Returns the opaque id when an order with this channel identity already exists.
    async fn order_exists(&self, external_id: &str, integration_id: i64) -> Result<Option<OrderId>, OrderApiError>;

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderApiError>;

    async fn fetch_order_by_external_id(
        &self,
        external_id: &str,
        integration_id: i64,
    ) -> Result<Option<Order>, OrderApiError>;

    /// Order-number lookup scoped to a tenant; used by the messaging consumers, which only
    /// know the human-facing number.
    async fn fetch_order_by_order_number(
        &self,
        business_id: i64,
        order_number: &str,
    ) -> Result<Option<Order>, OrderApiError>;

    /// The root row plus every satellite, preloaded.
    async fn fetch_full_order(&self, id: &OrderId) -> Result<Option<FullOrder>, OrderApiError>;

    /// Atomically insert the root and all satellite rows. Returns the stored root.
    async fn insert_order_tree(
        &self,
        order: NewOrder,
        items: &[NewOrderItem],
        addresses: &[NewAddress],
        payments: &[NewPayment],
        shipments: &[NewShipment],
        channel_metadata: &[NewChannelMetadata],
    ) -> Result<Order, OrderApiError>;

    /// Apply a field diff to the root row. An empty diff is a caller bug and returns the
    /// stored row untouched.
    async fn update_order_root(&self, id: &OrderId, diff: OrderDiff) -> Result<Order, OrderApiError>;

    async fn replace_order_items(&self, id: &OrderId, items: &[NewOrderItem]) -> Result<(), OrderApiError>;

    async fn replace_addresses(&self, id: &OrderId, addresses: &[NewAddress]) -> Result<(), OrderApiError>;

    async fn replace_payments(&self, id: &OrderId, payments: &[NewPayment]) -> Result<(), OrderApiError>;

    async fn replace_shipments(&self, id: &OrderId, shipments: &[NewShipment]) -> Result<(), OrderApiError>;

    /// Append a new raw channel snapshot, clearing `is_latest` on the previous ones.
    async fn append_channel_metadata(&self, id: &OrderId, meta: NewChannelMetadata) -> Result<(), OrderApiError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    async fn set_confirmation(&self, id: &OrderId, confirmed: bool) -> Result<Order, OrderApiError>;

    /// Append to the pipe-delimited novelty log, preserving prior content.
    async fn append_novelty(&self, id: &OrderId, entry: &str) -> Result<Order, OrderApiError>;

    async fn update_score(&self, id: &OrderId, score: f64, factors: &[String]) -> Result<(), OrderApiError>;

    /// The most recent `prob-NNNN` order number for the tenant, if any.
    async fn last_manual_order_number(&self, business_id: i64) -> Result<Option<String>, OrderApiError>;

    async fn count_orders_for_client(&self, client_id: &str) -> Result<i64, OrderApiError>;

    async fn soft_delete_order(&self, id: &OrderId) -> Result<(), OrderApiError>;
}
