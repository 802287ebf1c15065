//! Wiring: database, broker, pub/sub, event hooks and workers.

use std::sync::Arc;

use amqp_tools::{AmqpBroker, MessageBroker, PubSubChannel};
use log::*;
use order_ingest_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderIngestApi,
    SqliteDatabase,
};
use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    publisher::DualPublisher,
    workers::{canonical_consumer, score_worker, whatsapp_consumer},
};

/// Start everything and run until the process receives ctrl-c. The shutdown signal drains
/// every subscription before the function returns.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let broker = AmqpBroker::new(&config.broker).await?;
    if config.declare_topology {
        broker.declare_topology().await?;
    }
    let pubsub = PubSubChannel::new(&config.pubsub_channel, config.pubsub_capacity);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    start_workers(&config, db, broker, pubsub, shutdown_rx).await?;

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown requested; draining workers");
    let _ = shutdown_tx.send(true);
    // Give in-flight handlers a moment to settle their deliveries.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    Ok(())
}

/// Wire the hook fabric and spawn one worker per subscription. Factored out of
/// [`run_server`] so tests can run the full fabric against a [`MemoryBroker`]
/// (`amqp_tools::MemoryBroker`).
pub async fn start_workers<Br: MessageBroker>(
    config: &ServerConfig,
    db: SqliteDatabase,
    broker: Br,
    pubsub: PubSubChannel,
    shutdown: watch::Receiver<bool>,
) -> Result<Arc<OrderIngestApi<SqliteDatabase>>, ServerError> {
    let publisher = Arc::new(DualPublisher::new(broker.clone(), pubsub.clone()));

    let producers = start_event_fabric(config.event_buffer_size, Arc::clone(&publisher)).await;
    let api = Arc::new(OrderIngestApi::new(db.clone(), producers));

    let consumer_api = Arc::clone(&api);
    let consumer_broker = broker.clone();
    let consumer_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = canonical_consumer::run_canonical_consumer(consumer_api, consumer_broker, consumer_shutdown).await {
            error!("🚀️ Canonical consumer stopped with an error: {e}");
        }
    });

    whatsapp_consumer::run_whatsapp_consumers(db.clone(), Arc::clone(&publisher), broker.clone(), shutdown.clone())
        .await?;

    let score_db = db.clone();
    let score_publisher = Arc::clone(&publisher);
    let score_subscription = pubsub.subscribe();
    tokio::spawn(async move {
        if let Err(e) = score_worker::run_score_worker(score_db, score_publisher, score_subscription, shutdown).await {
            error!("🚀️ Score worker stopped with an error: {e}");
        }
    });

    info!("🚀️ All workers started");
    Ok(api)
}

/// Install the dual publisher as the pipeline's event hook and start the handler loop.
async fn start_event_fabric<Br: MessageBroker>(
    buffer_size: usize,
    publisher: Arc<DualPublisher<Br>>,
) -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.on_order_event(move |envelope| {
        let publisher = Arc::clone(&publisher);
        Box::pin(async move {
            publisher.publish(envelope).await;
        })
    });
    let handlers = EventHandlers::new(buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}
