//! The broker topology, exactly as declared at startup.

/// Durable fanout exchange every lifecycle event is published to.
pub const EVENTS_EXCHANGE: &str = "orders.events";

/// Durable queues bound to [`EVENTS_EXCHANGE`] with an empty routing key, one per downstream
/// subsystem.
pub const BOUND_QUEUES: [&str; 4] =
    ["orders.events.invoicing", "orders.events.whatsapp", "orders.events.score", "orders.events.inventory"];

/// Fallback queue for event types the router does not recognize.
pub const GENERIC_QUEUE: &str = "orders.events.generic";

/// `order.confirmation_requested` publishes here instead of a type-specific queue.
pub const CONFIRMATION_QUEUE: &str = "orders.confirmation.requested";

/// Inbound: canonical orders from the integration adapters.
pub const CANONICAL_QUEUE: &str = "probability.orders.canonical";

/// Inbound: messaging-driven replies.
pub const WHATSAPP_CONFIRMED_QUEUE: &str = "orders.whatsapp.confirmed";
pub const WHATSAPP_CANCELLED_QUEUE: &str = "orders.whatsapp.cancelled";
pub const WHATSAPP_NOVELTY_QUEUE: &str = "orders.whatsapp.novelty";

/// The queue a given wire event type is routed to.
pub fn queue_for_event(event_type: &str) -> String {
    if event_type == "order.confirmation_requested" {
        return CONFIRMATION_QUEUE.to_string();
    }
    match event_type.strip_prefix("order.") {
        Some(suffix) if !suffix.is_empty() => format!("orders.events.{suffix}"),
        _ => GENERIC_QUEUE.to_string(),
    }
}

/// Every queue the gateway declares at startup.
pub fn all_queues() -> Vec<String> {
    let mut queues: Vec<String> = BOUND_QUEUES.iter().map(|q| q.to_string()).collect();
    queues.extend(
        [
            "created",
            "updated",
            "cancelled",
            "status_changed",
            "delivered",
            "shipped",
            "payment_received",
            "refunded",
            "failed",
            "on_hold",
            "processing",
            "score_calculation_requested",
            "score_calculated",
        ]
        .iter()
        .map(|suffix| format!("orders.events.{suffix}")),
    );
    queues.push(GENERIC_QUEUE.to_string());
    queues.push(CONFIRMATION_QUEUE.to_string());
    queues.push(CANONICAL_QUEUE.to_string());
    queues.push(WHATSAPP_CONFIRMED_QUEUE.to_string());
    queues.push(WHATSAPP_CANCELLED_QUEUE.to_string());
    queues.push(WHATSAPP_NOVELTY_QUEUE.to_string());
    queues
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn event_routing() {
        assert_eq!(queue_for_event("order.created"), "orders.events.created");
        assert_eq!(queue_for_event("order.status_changed"), "orders.events.status_changed");
        assert_eq!(queue_for_event("order.confirmation_requested"), "orders.confirmation.requested");
        assert_eq!(queue_for_event("something.else"), GENERIC_QUEUE);
        assert_eq!(queue_for_event(""), GENERIC_QUEUE);
    }

    #[test]
    fn declared_queues_cover_the_routing_table() {
        let queues = all_queues();
        for ev in ["order.created", "order.updated", "order.cancelled", "order.status_changed",
            "order.confirmation_requested", "order.score_calculation_requested"]
        {
            assert!(queues.contains(&queue_for_event(ev)), "missing queue for {ev}");
        }
        assert!(queues.contains(&CANONICAL_QUEUE.to_string()));
    }
}
