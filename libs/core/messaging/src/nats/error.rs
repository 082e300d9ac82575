//! Error types for the NATS transport.

use crate::nats::ConsumerState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NatsError {
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::ConnectError),

    #[error("JetStream error: {0}")]
    JetStream(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot {operation} while consumer is {state}")]
    InvalidState {
        operation: &'static str,
        state: ConsumerState,
    },

    #[error("Receive loop failed: {0}")]
    Worker(String),
}

impl NatsError {
    pub fn from_jetstream_error(error: impl std::fmt::Display) -> Self {
        Self::JetStream(error.to_string())
    }

    pub fn publish_error(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn consumer_error(msg: impl Into<String>) -> Self {
        Self::Consumer(msg.into())
    }
}
