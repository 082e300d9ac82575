//! Recording provider for tests and local runs

use super::{EmailProvider, OutboundEmail, ProviderError, SendResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock email provider that captures sent emails.
///
/// Clones share the same outbox.
#[derive(Clone, Default)]
pub struct MockProvider {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
    failure: Option<ProviderError>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every send fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: Some(error),
        }
    }

    pub async fn sent_emails(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent
            .lock()
            .await
            .iter()
            .any(|e| e.to.iter().any(|to| to == address))
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    async fn send(&self, email: &OutboundEmail) -> Result<SendResult, ProviderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut sent = self.sent.lock().await;
        sent.push(email.clone());

        Ok(SendResult {
            message_id: format!("mock-{}", sent.len()),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
