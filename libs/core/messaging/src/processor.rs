//! Processor trait for job execution.

use crate::error::ProcessingError;
use crate::job::Job;
use async_trait::async_trait;

/// Job processor trait.
///
/// The processor is transport-agnostic; the worker turns its result into an
/// acknowledgment decision based on [`ProcessingError::category`]:
/// - `Ok(())`: acknowledge
/// - `Transient` / `RateLimited`: requeue with backoff, bounded by the
///   worker's delivery ceiling
/// - `Permanent`: discard without requeue
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl Processor<NotificationRequest> for EmailProcessor {
///     async fn process(&self, job: &NotificationRequest) -> Result<(), ProcessingError> {
///         self.service
///             .deliver(&job.to, &job.template, &job.data)
///             .await
///             .map(|_| ())
///             .map_err(ProcessingError::from)
///     }
///
///     fn name(&self) -> &'static str {
///         "email_processor"
///     }
/// }
/// ```
#[async_trait]
pub trait Processor<J: Job>: Send + Sync {
    /// Process a decoded job.
    async fn process(&self, job: &J) -> Result<(), ProcessingError>;

    /// Processor name, used in logs and metric labels.
    fn name(&self) -> &'static str;
}
