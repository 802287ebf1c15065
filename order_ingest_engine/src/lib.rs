//! Probability Order Gateway — ingestion engine
//!
//! The ingestion engine is the core of a multi-tenant commerce platform: it receives order
//! records from heterogeneous upstream channels and turns each one into a single, canonical,
//! deduplicated, scored order whose lifecycle events fan out to the downstream subsystems.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly; use the public API instead. The exception is the data types used in
//!    the database, which are defined in the `db_types` module and are public.
//! 2. The ingestion public API ([`mod@ingest`]): the idempotent `map_and_save` upsert, the
//!    customer/product resolvers and the channel-status mapping. Backends implement the
//!    traits in [`mod@traits`] to plug in.
//! 3. The event fabric ([`mod@events`]): every state transition emits an enriched envelope
//!    that carries the complete order snapshot. A simple hook system lets the server wire
//!    these into the pub/sub channel and the durable broker.
//!
//! The delivery-probability scorer ([`mod@scoring`]) is a pure function and can be used
//! standalone.

pub mod canonical;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod ingest;
pub mod order_objects;
pub mod scoring;
pub mod status;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ingest::OrderIngestApi;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogManagement,
    ErrorManagement,
    OrderIngestDatabase,
    OrderIngestError,
    OrderManagement,
    StatusManagement,
};
