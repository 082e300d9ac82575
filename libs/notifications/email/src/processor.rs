//! Queue processor for [`NotificationRequest`]s.

use crate::request::NotificationRequest;
use crate::service::NotificationService;
use async_trait::async_trait;
use messaging::{ProcessingError, Processor};
use tracing::{debug, info};

pub struct EmailProcessor {
    service: NotificationService,
}

impl EmailProcessor {
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Processor<NotificationRequest> for EmailProcessor {
    async fn process(&self, job: &NotificationRequest) -> Result<(), ProcessingError> {
        info!(
            to = %job.to,
            template = %job.template,
            "Processing email message"
        );

        let result = self
            .service
            .deliver(&job.to, &job.template, &job.data)
            .await?;

        debug!(message_id = %result.message_id, "Email message processed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email_processor"
    }
}
