//! Long-running queue workers: one task per subscription, per-message dispatch, detached
//! tasks for publishing. Every worker honours the shared shutdown signal and drains its
//! in-flight handler before returning.

pub mod canonical_consumer;
pub mod score_worker;
pub mod whatsapp_consumer;
