//! Inbound queue message.

use crate::templates::TemplateData;
use messaging::{Job, ProcessingError};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request to send one templated email.
///
/// ```json
/// {
///   "to": "jane@example.com",
///   "template": "welcome",
///   "template_data": {"UserName": "Jane"}
/// }
/// ```
///
/// A missing or `null` `template_data` is treated as an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NotificationRequest {
    /// Recipient address
    #[validate(email)]
    #[schema(example = "jane@example.com")]
    pub to: String,

    /// Template name, e.g. `welcome`
    #[validate(length(min = 1))]
    #[schema(example = "welcome")]
    pub template: String,

    /// Values substituted into the template. `Subject` also sets the subject line.
    #[serde(
        rename = "template_data",
        default,
        deserialize_with = "null_as_empty"
    )]
    #[schema(value_type = Object)]
    pub data: TemplateData,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<TemplateData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TemplateData>::deserialize(deserializer)?.unwrap_or_default())
}

impl NotificationRequest {
    pub fn new(to: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            template: template.into(),
            data: TemplateData::new(),
        }
    }

    pub fn with_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl Job for NotificationRequest {
    fn validate(&self) -> Result<(), ProcessingError> {
        Validate::validate(self).map_err(|e| {
            ProcessingError::permanent(format!("invalid notification request: {}", e))
        })
    }

    fn job_type(&self) -> &'static str {
        "notification"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::ErrorCategory;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let request: NotificationRequest = serde_json::from_value(json!({
            "to": "jane@example.com",
            "template": "welcome",
            "template_data": { "Subject": "Hi", "UserName": "Jane" }
        }))
        .unwrap();

        assert_eq!(request.to, "jane@example.com");
        assert_eq!(request.template, "welcome");
        assert_eq!(request.data["UserName"], "Jane");
    }

    #[test]
    fn test_template_data_optional() {
        let request: NotificationRequest =
            serde_json::from_str(r#"{"to":"jane@example.com","template":"welcome"}"#).unwrap();
        assert!(request.data.is_empty());
    }

    #[test]
    fn test_null_template_data_is_empty() {
        let request: NotificationRequest = serde_json::from_value(json!({
            "to": "jane@example.com",
            "template": "welcome",
            "template_data": null
        }))
        .unwrap();
        assert!(request.data.is_empty());
        assert!(Job::validate(&request).is_ok());
    }

    #[test]
    fn test_non_object_template_data_is_rejected() {
        let result = serde_json::from_value::<NotificationRequest>(json!({
            "to": "jane@example.com",
            "template": "welcome",
            "template_data": ["UserName"]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_template_data_key() {
        let request =
            NotificationRequest::new("jane@example.com", "welcome").with_data("UserName", "Jane");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["template_data"]["UserName"], "Jane");
    }

    #[test]
    fn test_validation() {
        assert!(Job::validate(&NotificationRequest::new("jane@example.com", "welcome")).is_ok());

        let bad_address =
            Job::validate(&NotificationRequest::new("not-an-email", "welcome")).unwrap_err();
        assert_eq!(bad_address.category(), ErrorCategory::Permanent);

        assert!(Job::validate(&NotificationRequest::new("jane@example.com", "")).is_err());
    }
}
