//! Templated email notifications for CineCore.
//!
//! ```text
//! NotificationRequest ──▶ EmailProcessor ──▶ NotificationService::deliver
//!                                              ├─ TemplateRegistry::render
//!                                              ├─ subject_for
//!                                              └─ EmailDispatcher
//!                                                   └─▶ EmailProvider (Resend)
//! ```
//!
//! `EmailProcessor` implements `messaging::Processor`, so the whole pipeline
//! runs under `messaging::MessageHandler` and the JetStream consumer.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod processor;
pub mod provider;
pub mod request;
pub mod service;
pub mod streams;
pub mod templates;

pub use config::{EmailConfig, SENDER_NAME};
pub use dispatcher::EmailDispatcher;
pub use error::{NotificationError, NotificationResult};
pub use processor::EmailProcessor;
pub use provider::{
    EmailProvider, MockProvider, OutboundEmail, ProviderError, ResendProvider, SendResult,
};
pub use request::NotificationRequest;
pub use service::{subject_for, NotificationService, RenderedEmail};
pub use streams::EmailQueue;
pub use templates::{
    EmbeddedTemplates, TemplateData, TemplateRegistry, TemplateSource, TEMPLATE_MANIFEST,
};

