//! Process configuration, loaded once at startup.

use core_config::queue::QueueConfig;
use core_config::server::ServerConfig;
use core_config::{env_parse_or, ConfigError, Environment, FromEnv};
use email::EmailConfig;

/// Delivery ceiling per message when `QUEUE_MAX_DELIVER` is unset.
pub const DEFAULT_MAX_DELIVER: u32 = 5;

#[derive(Clone, Debug)]
pub struct WorkerSettings {
    pub max_deliver: u32,
}

impl FromEnv for WorkerSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_deliver: env_parse_or("QUEUE_MAX_DELIVER", DEFAULT_MAX_DELIVER)?.max(1),
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub email: EmailConfig,
    pub worker: WorkerSettings,
}

impl FromEnv for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            email: EmailConfig::from_env()?,
            worker: WorkerSettings::from_env()?,
        })
    }
}
