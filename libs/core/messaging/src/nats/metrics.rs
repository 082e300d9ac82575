//! Prometheus metrics for queue consumers.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Counters and timings labelled by stream and processor.
#[derive(Clone)]
pub struct QueueMetrics {
    stream_name: String,
    processor_name: String,
}

impl QueueMetrics {
    pub fn new(stream_name: &str, processor_name: &str) -> Self {
        Self {
            stream_name: stream_name.to_string(),
            processor_name: processor_name.to_string(),
        }
    }

    pub fn message_received(&self) {
        counter!(
            "queue_consumer_messages_received_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn message_acked(&self, duration: Duration) {
        counter!(
            "queue_consumer_messages_acked_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);

        histogram!(
            "queue_consumer_processing_seconds",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn message_requeued(&self) {
        counter!(
            "queue_consumer_messages_requeued_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn message_dead_lettered(&self) {
        counter!(
            "queue_consumer_messages_dead_lettered_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }
}

/// Install the global Prometheus recorder.
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
