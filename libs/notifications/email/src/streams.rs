//! Queue definition for email notifications

use messaging::nats::StreamConfig;

/// Email notification queue on NATS JetStream.
pub struct EmailQueue;

impl StreamConfig for EmailQueue {
    const STREAM_NAME: &'static str = "EMAILS";

    /// Queue name publishers send to
    const SUBJECT: &'static str = "emails";

    const CONSUMER_NAME: &'static str = "email-worker";

    const DLQ_STREAM: &'static str = "EMAILS_DLQ";

    const DLQ_SUBJECT: &'static str = "emails.dlq";

    /// Max delivery attempts before the DLQ
    const MAX_DELIVER: u32 = 5;

    const ACK_WAIT_SECS: u64 = 30;
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::nats::WorkerConfig;

    #[test]
    fn test_email_queue_config() {
        let config = WorkerConfig::from_stream::<EmailQueue>();
        assert_eq!(config.stream_name, "EMAILS");
        assert_eq!(config.subject, "emails");
        assert_eq!(config.consumer_name, "email-worker");
        assert_eq!(config.dlq_stream, "EMAILS_DLQ");
        assert_eq!(config.max_deliver, 5);
    }
}
