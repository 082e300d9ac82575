//! Error types for message processing.

use std::fmt;
use thiserror::Error;

/// Error categories determine the acknowledgment decision.
///
/// - **Transient**: temporary failure, the message is requeued with backoff
/// - **Permanent**: the message can never succeed, it is discarded
/// - **RateLimited**: upstream throttling, requeued with a longer backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
    RateLimited,
}

impl ErrorCategory {
    /// Whether another delivery attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorCategory::Permanent)
    }

    /// Base backoff delay in milliseconds.
    pub fn base_backoff_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 1_000,
            ErrorCategory::Permanent => 0,
            ErrorCategory::RateLimited => 5_000,
        }
    }

    /// Backoff ceiling in milliseconds.
    pub fn max_backoff_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 30_000,
            ErrorCategory::Permanent => 0,
            ErrorCategory::RateLimited => 120_000,
        }
    }

    /// Exponential backoff for the given number of previous failures.
    pub fn backoff_delay_ms(&self, previous_failures: u32) -> u64 {
        if !self.is_retryable() {
            return 0;
        }

        let delay = self
            .base_backoff_ms()
            .saturating_mul(2u64.saturating_pow(previous_failures));
        delay.min(self.max_backoff_ms())
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Permanent => write!(f, "permanent"),
            ErrorCategory::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Error that can occur while processing a single message.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Temporary failure (network timeout, provider unavailable)
    #[error("transient error: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unrecoverable failure (bad input, unknown template)
    #[error("permanent error: {message}")]
    Permanent {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rate limited by an upstream service
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
    },

    /// Message body could not be decoded
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProcessingError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            source: None,
        }
    }

    pub fn transient_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
            source: None,
        }
    }

    pub fn permanent_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Permanent {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: None,
        }
    }

    pub fn rate_limited_with_retry(message: impl Into<String>, retry_after_ms: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: Some(retry_after_ms),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProcessingError::Transient { .. } => ErrorCategory::Transient,
            ProcessingError::Permanent { .. } => ErrorCategory::Permanent,
            ProcessingError::RateLimited { .. } => ErrorCategory::RateLimited,
            ProcessingError::Malformed(_) => ErrorCategory::Permanent,
        }
    }

    /// Whether the message should be redelivered, given how many delivery
    /// attempts have already been made and the configured ceiling.
    pub fn should_retry(&self, attempt: u32, max_attempts: u32) -> bool {
        self.category().is_retryable() && attempt < max_attempts
    }

    /// Redelivery delay. A provider-supplied retry-after hint wins.
    pub fn backoff_delay_ms(&self, previous_failures: u32) -> u64 {
        if let ProcessingError::RateLimited {
            retry_after_ms: Some(ms),
            ..
        } = self
        {
            return *ms;
        }
        self.category().backoff_delay_ms(previous_failures)
    }
}
