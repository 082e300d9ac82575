//! Transport-agnostic queue processing.
//!
//! - [`Job`]: a decodable, self-validating message payload
//! - [`Processor`]: business logic for one job
//! - [`MessageHandler`]: decode → validate → process → [`AckDecision`]
//! - `nats` (feature): JetStream consumer applying those decisions
//!
//! Failures are classified by [`ErrorCategory`]; permanent ones are discarded,
//! transient ones requeued with backoff until the delivery ceiling.

mod error;
mod handler;
mod job;
mod processor;

#[cfg(feature = "nats")]
pub mod nats;

pub use error::{ErrorCategory, ProcessingError};
pub use handler::{AckDecision, MessageHandler};
pub use job::Job;
pub use processor::Processor;
