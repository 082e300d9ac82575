//! NATS JetStream transport for [`MessageHandler`](crate::MessageHandler).
//!
//! ```text
//! publisher ──▶ subject "emails" ──▶ stream EMAILS (work queue)
//!                                          │ durable pull consumer
//!                                          ▼
//!                                    QueueConsumer ──▶ MessageHandler ──▶ Processor
//!                                          │
//!                        discard ──▶ stream EMAILS_DLQ
//! ```
//!
//! Redelivery of transiently failing messages is bounded twice: by the
//! consumer's `max_deliver` on the broker, and by the handler discarding the
//! attempt that reaches the same ceiling.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = WorkerConfig::from_stream::<EmailQueue>();
//! let mut consumer = QueueConsumer::new(url, config, processor);
//! consumer.connect().await?;
//! consumer.start().await?;
//! shutdown_signal().await;
//! consumer.close().await?;
//! ```

mod config;
mod consumer;
mod dlq;
mod error;
pub mod metrics;

pub use config::{StreamConfig, WorkerConfig};
pub use consumer::{ConsumerState, QueueConsumer};
pub use dlq::{DlqEntry, DlqManager};
pub use error::NatsError;
pub use metrics::{init_metrics, QueueMetrics};
