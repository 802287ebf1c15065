use std::env;

use amqp_tools::BrokerConfig;
use log::*;
use pog_common::parse_boolean_flag;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pog_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 16;
const DEFAULT_PUBSUB_CHANNEL: &str = "orders.events.live";
const DEFAULT_PUBSUB_CAPACITY: usize = 256;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 50;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub broker: BrokerConfig,
    /// Name of the lossy pub/sub channel carrying live event envelopes.
    pub pubsub_channel: String,
    pub pubsub_capacity: usize,
    /// Buffer size of the in-process event hook channel between the pipeline and the
    /// publisher.
    pub event_buffer_size: usize,
    /// Whether to declare the broker topology at startup. Disable when the operator manages
    /// exchanges and queues out of band.
    pub declare_topology: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            broker: BrokerConfig::default(),
            pubsub_channel: DEFAULT_PUBSUB_CHANNEL.to_string(),
            pubsub_capacity: DEFAULT_PUBSUB_CAPACITY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            declare_topology: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("POG_DATABASE_URL").unwrap_or_else(|_| {
            error!("🪛️ POG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_var("POG_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let broker = BrokerConfig::from_env_or_default();
        let pubsub_channel =
            env::var("POG_PUBSUB_CHANNEL").unwrap_or_else(|_| DEFAULT_PUBSUB_CHANNEL.to_string());
        let pubsub_capacity = parse_var("POG_PUBSUB_CAPACITY", DEFAULT_PUBSUB_CAPACITY);
        let event_buffer_size = parse_var("POG_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let declare_topology = parse_boolean_flag(env::var("POG_DECLARE_TOPOLOGY").ok(), true);
        Self {
            database_url,
            max_connections,
            broker,
            pubsub_channel,
            pubsub_capacity,
            event_buffer_size,
            declare_topology,
        }
    }
}

fn parse_var<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T
where T::Err: std::fmt::Display {
    env::var(name)
        .ok()
        .and_then(|s| {
            s.parse::<T>()
                .map_err(|e| error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}."))
                .ok()
        })
        .unwrap_or(default)
}
