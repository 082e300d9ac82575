//! Error types for the notification pipeline.

use crate::provider::ProviderError;
use messaging::ProcessingError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// No template with this name was loaded
    #[error("template {0} not found")]
    TemplateNotFound(String),

    /// A bundled template failed to compile; fatal at startup
    #[error("failed to parse template {name}: {source}")]
    TemplateParse {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("failed to send email: {0}")]
    Dispatch(#[from] ProviderError),
}

impl From<NotificationError> for ProcessingError {
    fn from(err: NotificationError) -> Self {
        let message = err.to_string();
        match err {
            NotificationError::Dispatch(ProviderError::RateLimited { retry_after_ms }) => {
                match retry_after_ms {
                    Some(ms) => ProcessingError::rate_limited_with_retry(message, ms),
                    None => ProcessingError::rate_limited(message),
                }
            }
            NotificationError::Dispatch(source) => {
                ProcessingError::transient_with_source(message, source)
            }
            other => ProcessingError::permanent_with_source(message, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::ErrorCategory;

    #[test]
    fn test_not_found_message() {
        let err = NotificationError::TemplateNotFound("nonexistent".to_string());
        assert_eq!(err.to_string(), "template nonexistent not found");
    }

    #[test]
    fn test_classification() {
        let not_found: ProcessingError =
            NotificationError::TemplateNotFound("x".to_string()).into();
        assert_eq!(not_found.category(), ErrorCategory::Permanent);

        let dispatch: ProcessingError =
            NotificationError::Dispatch(ProviderError::Transport("reset".to_string())).into();
        assert_eq!(dispatch.category(), ErrorCategory::Transient);

        let auth: ProcessingError = NotificationError::Dispatch(ProviderError::Auth).into();
        assert_eq!(auth.category(), ErrorCategory::Transient);

        let limited: ProcessingError = NotificationError::Dispatch(ProviderError::RateLimited {
            retry_after_ms: Some(2_000),
        })
        .into();
        assert_eq!(limited.category(), ErrorCategory::RateLimited);
        assert_eq!(limited.backoff_delay_ms(0), 2_000);
    }
}
