use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderEventEnvelope};

/// The producer side handed to the ingestion pipeline. Every envelope the pipeline emits is
/// published to each registered producer.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_event_producer: Vec<EventProducer<OrderEventEnvelope>>,
}

pub struct EventHandlers {
    pub on_order_event: Option<EventHandler<OrderEventEnvelope>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_event = hooks.on_order_event.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_event }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_event {
            result.order_event_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_event {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_event: Option<Handler<OrderEventEnvelope>>,
}

impl EventHooks {
    pub fn on_order_event<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderEventEnvelope) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_event = Some(Arc::new(f));
        self
    }
}
