//! Render a template, derive the subject and dispatch.

use crate::dispatcher::EmailDispatcher;
use crate::error::NotificationResult;
use crate::provider::SendResult;
use crate::templates::{TemplateData, TemplateRegistry};
use serde_json::Value;
use std::sync::Arc;

/// Subject for a templated email: `data["Subject"]` when it is a string,
/// otherwise `Email from {sender_name}`.
pub fn subject_for(data: &TemplateData, sender_name: &str) -> String {
    match data.get("Subject") {
        Some(Value::String(subject)) => subject.clone(),
        _ => format!("Email from {}", sender_name),
    }
}

/// Rendered body and subject, before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
}

/// Stateless; safe to share across tasks.
#[derive(Clone)]
pub struct NotificationService {
    registry: Arc<TemplateRegistry>,
    dispatcher: EmailDispatcher,
}

impl NotificationService {
    pub fn new(registry: Arc<TemplateRegistry>, dispatcher: EmailDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn render(
        &self,
        template: &str,
        data: &TemplateData,
    ) -> NotificationResult<RenderedEmail> {
        Ok(RenderedEmail {
            html_body: self.registry.render(template, data)?,
            subject: subject_for(data, self.dispatcher.from_name()),
        })
    }

    /// Nothing is sent when rendering fails.
    pub async fn deliver(
        &self,
        to: &str,
        template: &str,
        data: &TemplateData,
    ) -> NotificationResult<SendResult> {
        let rendered = self.render(template, data)?;

        self.dispatcher
            .send(to, &rendered.subject, &rendered.html_body)
            .await
    }
}
