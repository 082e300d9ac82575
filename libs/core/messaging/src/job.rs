//! Job trait for queue message payloads.

use crate::error::ProcessingError;
use serde::de::DeserializeOwned;

/// A message payload that a worker can decode and process.
///
/// Jobs are decoded from JSON once per delivery and are immutable afterwards.
///
/// # Example
///
/// ```rust
/// use messaging::{Job, ProcessingError};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct ResizeImage {
///     path: String,
/// }
///
/// impl Job for ResizeImage {
///     fn validate(&self) -> Result<(), ProcessingError> {
///         if self.path.is_empty() {
///             return Err(ProcessingError::permanent("path is empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Job: DeserializeOwned + Send + Sync + 'static {
    /// Structural validation run right after decoding.
    ///
    /// Failures are permanent: the message is discarded without requeue.
    fn validate(&self) -> Result<(), ProcessingError> {
        Ok(())
    }

    /// Job type name for logs.
    fn job_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Ping {
        target: String,
    }

    impl Job for Ping {
        fn validate(&self) -> Result<(), ProcessingError> {
            if self.target.is_empty() {
                Err(ProcessingError::permanent("target is empty"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_job_validation() {
        let ok: Ping = serde_json::from_str(r#"{"target":"db"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let empty: Ping = serde_json::from_str(r#"{"target":""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_default_job_type() {
        let ping = Ping {
            target: "db".to_string(),
        };
        assert!(ping.job_type().ends_with("Ping"));
    }
}
