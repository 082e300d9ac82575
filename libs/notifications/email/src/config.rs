//! Provider credentials and sender identity.

use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use std::fmt;
use std::time::Duration;

/// Display name on every outgoing email.
pub const SENDER_NAME: &str = "CineCore";

pub const DEFAULT_FROM_EMAIL: &str = "noreply@yourdomain.com";

#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub timeout: Duration,
}

impl EmailConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            from_name: SENDER_NAME.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_from_email(mut self, from_email: impl Into<String>) -> Self {
        self.from_email = from_email.into();
        self
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FromEnv for EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("RESEND_API_KEY")?;
        let from_email = env_or_default("RESEND_FROM_EMAIL", DEFAULT_FROM_EMAIL);
        let timeout = Duration::from_secs(env_parse_or("EMAIL_PROVIDER_TIMEOUT_SECS", 10u64)?);

        Ok(Self {
            api_key,
            from_email,
            from_name: SENDER_NAME.to_string(),
            timeout,
        })
    }
}
