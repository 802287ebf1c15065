//! The canonical ingestion pipeline.
//!
//! [`OrderIngestApi`] is the single write path for orders: idempotent upsert of the aggregate
//! root plus its satellites, customer/product resolution, channel-status mapping and event
//! emission.

mod api;
mod diff;
mod mapper;
mod resolvers;

pub use api::OrderIngestApi;
pub use diff::{addresses_equivalent, compute_diff, items_equivalent, payments_equivalent, shipments_equivalent};
pub use mapper::{build_new_order, MappedContext};
pub use resolvers::{resolve_customer, resolve_product};
