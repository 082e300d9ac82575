//! Dead letter stream for discarded messages.

use crate::nats::config::WorkerConfig;
use crate::nats::error::NatsError;
use async_nats::jetstream::stream::Config as JsStreamConfig;
use async_nats::jetstream::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Publishes discarded messages to a separate stream so they can be inspected
/// and replayed by hand.
#[derive(Clone)]
pub struct DlqManager {
    jetstream: Context,
    stream: String,
    subject: String,
    max_age: Duration,
}

impl DlqManager {
    pub fn new(jetstream: Context, config: &WorkerConfig) -> Self {
        Self {
            jetstream,
            stream: config.dlq_stream.clone(),
            subject: config.dlq_subject.clone(),
            max_age: config.dlq_max_age,
        }
    }

    pub async fn ensure_stream(&self) -> Result<(), NatsError> {
        self.jetstream
            .get_or_create_stream(JsStreamConfig {
                name: self.stream.clone(),
                subjects: vec![self.subject.clone()],
                max_messages: 10_000,
                max_age: self.max_age,
                ..Default::default()
            })
            .await
            .map_err(NatsError::from_jetstream_error)?;

        info!(stream = %self.stream, subject = %self.subject, "DLQ stream ready");
        Ok(())
    }

    /// Publish a dead letter and wait for the broker to persist it.
    pub async fn publish(&self, entry: &DlqEntry) -> Result<u64, NatsError> {
        let payload = serde_json::to_vec(entry)?;

        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?;

        debug!(
            original_sequence = entry.original_sequence,
            dlq_sequence = ack.sequence,
            "Moved message to DLQ"
        );

        Ok(ack.sequence)
    }
}

/// A discarded message with the reason it was discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqEntry {
    pub stream: String,
    /// Original body. Lossy UTF-8 so malformed bytes still land somewhere.
    pub payload: String,
    pub reason: String,
    pub original_sequence: u64,
    pub delivery_count: u32,
    pub failed_at: DateTime<Utc>,
}

impl DlqEntry {
    pub fn new(
        stream: impl Into<String>,
        payload: &[u8],
        reason: impl Into<String>,
        original_sequence: u64,
        delivery_count: u32,
    ) -> Self {
        Self {
            stream: stream.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            reason: reason.into(),
            original_sequence,
            delivery_count,
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_keeps_invalid_utf8() {
        let entry = DlqEntry::new("EMAILS", b"{\"to\":\xff}", "malformed", 42, 1);
        assert_eq!(entry.stream, "EMAILS");
        assert!(entry.payload.starts_with("{\"to\":"));
        assert!(entry.payload.contains('\u{FFFD}'));
        assert_eq!(entry.original_sequence, 42);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = DlqEntry::new("EMAILS", br#"{"to":"a@b.c"}"#, "unknown template", 7, 3);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["reason"], "unknown template");
        assert_eq!(json["delivery_count"], 3);
        assert_eq!(json["payload"], r#"{"to":"a@b.c"}"#);
        assert!(json["failed_at"].is_string());
    }
}
