//! Sends rendered emails through the configured provider with a fixed sender.

use crate::config::EmailConfig;
use crate::error::NotificationResult;
use crate::provider::{EmailProvider, OutboundEmail, SendResult};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct EmailDispatcher {
    provider: Arc<dyn EmailProvider>,
    from_email: String,
    from_name: String,
}

impl EmailDispatcher {
    pub fn new(
        provider: Arc<dyn EmailProvider>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            from_email: from_email.into(),
            from_name: from_name.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn EmailProvider>, config: &EmailConfig) -> Self {
        Self::new(provider, &config.from_email, &config.from_name)
    }

    pub fn from_email(&self) -> &str {
        &self.from_email
    }

    pub fn from_name(&self) -> &str {
        &self.from_name
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.is_ok()
    }

    /// Send one email to a single recipient. Exactly one provider call.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> NotificationResult<SendResult> {
        let email = OutboundEmail {
            from: self.from_email.clone(),
            from_name: self.from_name.clone(),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html: html_body.to_string(),
        };

        let result = self.provider.send(&email).await?;

        info!(
            to = %to,
            subject = %subject,
            message_id = %result.message_id,
            provider = self.provider.name(),
            "Email sent successfully"
        );

        Ok(result)
    }
}
