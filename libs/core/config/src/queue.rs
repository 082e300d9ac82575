use crate::{env_parse_or, ConfigError, FromEnv};
use std::env;
use std::time::Duration;

pub const DEFAULT_QUEUE_URL: &str = "nats://localhost:4222";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Broker connection settings.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

impl FromEnv for QueueConfig {
    /// Reads `QUEUE_URL`, then `NATS_URL`, then falls back to the local default.
    fn from_env() -> Result<Self, ConfigError> {
        let url = ["QUEUE_URL", "NATS_URL"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUEUE_URL.to_string());

        let connect_timeout = Duration::from_secs(env_parse_or(
            "QUEUE_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?);

        Ok(Self {
            url,
            connect_timeout,
        })
    }
}
