//! Configuration for NATS JetStream queue consumers.

use std::time::Duration;

/// Compile-time queue definition.
///
/// # Example
///
/// ```rust,ignore
/// struct EmailQueue;
///
/// impl StreamConfig for EmailQueue {
///     const STREAM_NAME: &'static str = "EMAILS";
///     const SUBJECT: &'static str = "emails";
///     const CONSUMER_NAME: &'static str = "email-worker";
///     const DLQ_STREAM: &'static str = "EMAILS_DLQ";
///     const DLQ_SUBJECT: &'static str = "emails.dlq";
/// }
/// ```
pub trait StreamConfig {
    /// JetStream stream name
    const STREAM_NAME: &'static str;

    /// Subject publishers write to; this is the queue name clients see
    const SUBJECT: &'static str;

    /// Durable consumer name, shared by all worker replicas
    const CONSUMER_NAME: &'static str;

    /// Dead letter stream name
    const DLQ_STREAM: &'static str;

    /// Subject dead letters are published on
    const DLQ_SUBJECT: &'static str;

    /// Delivery ceiling per message
    const MAX_DELIVER: u32 = 3;

    /// Seconds before an unacknowledged delivery is redelivered
    const ACK_WAIT_SECS: u64 = 30;
}

/// Runtime settings for a [`QueueConsumer`](super::QueueConsumer).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub stream_name: String,
    pub subject: String,
    pub consumer_name: String,
    pub dlq_stream: String,
    pub dlq_subject: String,

    /// Messages pulled per request. Handling is still sequential.
    pub batch_size: usize,

    /// How long a pull request waits for messages
    pub fetch_timeout: Duration,

    pub max_deliver: u32,
    pub ack_wait: Duration,

    /// Stream retention limits
    pub max_messages: i64,
    pub max_age: Duration,
    pub dlq_max_age: Duration,

    pub connect_timeout: Duration,

    /// Pause after a failed pull before trying again
    pub error_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stream_name: "JOBS".to_string(),
            subject: "jobs".to_string(),
            consumer_name: "worker".to_string(),
            dlq_stream: "JOBS_DLQ".to_string(),
            dlq_subject: "jobs.dlq".to_string(),
            batch_size: 1,
            fetch_timeout: Duration::from_secs(5),
            max_deliver: 3,
            ack_wait: Duration::from_secs(30),
            max_messages: 100_000,
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            dlq_max_age: Duration::from_secs(30 * 24 * 60 * 60),
            connect_timeout: Duration::from_secs(10),
            error_backoff: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    pub fn from_stream<S: StreamConfig>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            subject: S::SUBJECT.to_string(),
            consumer_name: S::CONSUMER_NAME.to_string(),
            dlq_stream: S::DLQ_STREAM.to_string(),
            dlq_subject: S::DLQ_SUBJECT.to_string(),
            max_deliver: S::MAX_DELIVER,
            ack_wait: Duration::from_secs(S::ACK_WAIT_SECS),
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_deliver(mut self, max_deliver: u32) -> Self {
        self.max_deliver = max_deliver.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
