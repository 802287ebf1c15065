mod channel;
mod envelope;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use envelope::{EventChanges, OrderEventEnvelope, OrderSnapshot, SnapshotItem, new_event_id};
pub use event_types::OrderEventType;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
