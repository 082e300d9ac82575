//! Transactional email providers

pub mod mock;
pub mod resend;

pub use mock::MockProvider;
pub use resend::ResendProvider;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A fully rendered message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub from_name: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

impl OutboundEmail {
    /// `Name <address>` as it appears in the From header.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from)
    }
}

/// Result of sending an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// Provider-specific message ID
    pub message_id: String,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("authentication failed")]
    Auth,

    #[error("rate limit exceeded")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Trait for email providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send one email. No retries happen at this level.
    async fn send(&self, email: &OutboundEmail) -> Result<SendResult, ProviderError>;

    /// Check if the provider is usable
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Get provider name
    fn name(&self) -> &'static str;
}
