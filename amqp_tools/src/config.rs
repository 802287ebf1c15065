use std::env;

use log::*;
use pog_common::Secret;

const DEFAULT_AMQP_URL: &str = "amqp://127.0.0.1:5672/%2f";
const DEFAULT_POOL_SIZE: usize = 8;
const DEFAULT_PREFETCH: u16 = 25;

/// Broker connection settings, read from the environment.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Full AMQP URL, credentials included.
    pub url: Secret<String>,
    pub pool_size: usize,
    pub prefetch: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: Secret::new(DEFAULT_AMQP_URL.to_string()),
            pool_size: DEFAULT_POOL_SIZE,
            prefetch: DEFAULT_PREFETCH,
        }
    }
}

impl BrokerConfig {
    pub fn from_env_or_default() -> Self {
        let url = env::var("POG_AMQP_URL").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ POG_AMQP_URL is not set. Using the default local broker URL.");
            Secret::new(DEFAULT_AMQP_URL.to_string())
        });
        let pool_size = env::var("POG_AMQP_POOL_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| error!("🪛️ Invalid POG_AMQP_POOL_SIZE: {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_POOL_SIZE);
        let prefetch = env::var("POG_CONSUMER_PREFETCH")
            .ok()
            .and_then(|s| {
                s.parse::<u16>()
                    .map_err(|e| error!("🪛️ Invalid POG_CONSUMER_PREFETCH: {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_PREFETCH);
        Self { url, pool_size, prefetch }
    }
}
