//! # Probability Order Gateway server
//!
//! The deployable half of the gateway. It is responsible for:
//! * draining the canonical ingestion queue and funnelling orders through the pipeline,
//! * fanning lifecycle events out to the pub/sub channel and the durable broker,
//! * applying WhatsApp confirmations, cancellations and novelties back onto orders,
//! * recalculating delivery-probability scores asynchronously,
//! * creating manual orders with auto-assigned numbers.
//!
//! ## Configuration
//! The server is configured via `POG_*` environment variables. See [config](config/index.html)
//! for more information.

pub mod config;
pub mod errors;
pub mod manual;
pub mod publisher;
pub mod server;
pub mod workers;
