//! Per-message handling, independent of the queue transport.
//!
//! [`MessageHandler::handle`] decodes a raw payload, runs the processor and
//! returns an [`AckDecision`]. Transports only apply the decision.

use crate::error::ProcessingError;
use crate::job::Job;
use crate::processor::Processor;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// What the transport should do with a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckDecision {
    /// Processed; remove from the queue.
    Ack,
    /// Not processed. With `requeue` the message is redelivered after
    /// `delay`, otherwise it is removed and dead-lettered.
    Nack {
        requeue: bool,
        delay: Duration,
        reason: String,
    },
}

impl AckDecision {
    pub fn retry_later(delay: Duration, reason: impl Into<String>) -> Self {
        Self::Nack {
            requeue: true,
            delay,
            reason: reason.into(),
        }
    }

    pub fn discard(reason: impl Into<String>) -> Self {
        Self::Nack {
            requeue: false,
            delay: Duration::ZERO,
            reason: reason.into(),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack)
    }

    pub fn is_requeue(&self) -> bool {
        matches!(self, Self::Nack { requeue: true, .. })
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, Self::Nack { requeue: false, .. })
    }
}

/// Decodes, validates and processes one message at a time.
pub struct MessageHandler<J, P> {
    processor: Arc<P>,
    max_attempts: u32,
    _job: PhantomData<fn() -> J>,
}

impl<J: Job, P: Processor<J>> MessageHandler<J, P> {
    /// `max_attempts` caps deliveries of a transiently failing message; the
    /// attempt that reaches it is discarded instead of requeued.
    pub fn new(processor: P, max_attempts: u32) -> Self {
        Self::from_arc(Arc::new(processor), max_attempts)
    }

    pub fn from_arc(processor: Arc<P>, max_attempts: u32) -> Self {
        Self {
            processor,
            max_attempts: max_attempts.max(1),
            _job: PhantomData,
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Handle one delivery. `attempt` is 1 for the first delivery.
    pub async fn handle(&self, payload: &[u8], attempt: u32) -> AckDecision {
        let job: J = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(e) => {
                let err = ProcessingError::from(e);
                error!(
                    processor = self.processor.name(),
                    error = %err,
                    payload_len = payload.len(),
                    "Malformed message body, discarding"
                );
                return AckDecision::discard(err.to_string());
            }
        };

        if let Err(err) = job.validate() {
            error!(
                processor = self.processor.name(),
                job_type = job.job_type(),
                error = %err,
                "Invalid message, discarding"
            );
            return AckDecision::discard(err.to_string());
        }

        match self.processor.process(&job).await {
            Ok(()) => {
                debug!(
                    processor = self.processor.name(),
                    job_type = job.job_type(),
                    attempt,
                    "Message processed"
                );
                AckDecision::Ack
            }
            Err(err) => self.decide_failure(&job, err, attempt),
        }
    }

    fn decide_failure(&self, job: &J, err: ProcessingError, attempt: u32) -> AckDecision {
        let category = err.category();

        if !category.is_retryable() {
            error!(
                processor = self.processor.name(),
                job_type = job.job_type(),
                category = %category,
                error = %err,
                "Permanent failure, discarding message"
            );
            return AckDecision::discard(err.to_string());
        }

        if err.should_retry(attempt, self.max_attempts) {
            let delay = Duration::from_millis(err.backoff_delay_ms(attempt.saturating_sub(1)));
            warn!(
                processor = self.processor.name(),
                job_type = job.job_type(),
                category = %category,
                error = %err,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Transient failure, requeueing message"
            );
            AckDecision::retry_later(delay, err.to_string())
        } else {
            error!(
                processor = self.processor.name(),
                job_type = job.job_type(),
                category = %category,
                error = %err,
                attempt,
                "Delivery attempts exhausted, discarding message"
            );
            AckDecision::discard(format!("gave up after {} attempts: {}", attempt, err))
        }
    }
}
