use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use log::*;
use order_ingest_engine::{
    events::{EventHandlers, EventHooks, OrderEventEnvelope, OrderEventType},
    OrderIngestApi,
    OrderIngestDatabase,
    SqliteDatabase,
};
use rand::Rng;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let mut rng = rand::thread_rng();
    format!("sqlite:///tmp/pog_engine_test_{:016x}.db", rng.gen::<u64>())
}

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    Sqlite::create_database(url).await.expect("Error creating test database");
    debug!("🚀 Created test database at {url}");
}

/// Captures every envelope the pipeline emits, so tests can assert on the event stream.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<OrderEventEnvelope>>>,
}

impl EventLog {
    pub fn hooks(&self) -> EventHooks {
        let log = self.events.clone();
        let mut hooks = EventHooks::default();
        hooks.on_order_event(move |envelope| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(envelope);
            }
            .boxed()
        });
        hooks
    }

    pub fn snapshot(&self) -> Vec<OrderEventEnvelope> {
        self.events.lock().unwrap().clone()
    }

    pub fn of_type(&self, event_type: OrderEventType) -> Vec<OrderEventEnvelope> {
        self.snapshot().into_iter().filter(|e| e.event_type == event_type).collect()
    }

    /// The hook fabric is asynchronous; give it a beat to drain before asserting.
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

pub async fn setup() -> (OrderIngestApi<SqliteDatabase>, EventLog) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running DB migrations");
    let log = EventLog::default();
    let handlers = EventHandlers::new(50, log.hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    (OrderIngestApi::new(db, producers), log)
}

pub async fn tear_down(mut api: OrderIngestApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.ok();
}
