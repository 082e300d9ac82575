pub mod queue;
pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment environment, selects log format and verbosity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read a variable, falling back to `default` when unset or blank.
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Read a required variable. A blank value counts as missing.
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Read and parse a variable, falling back to `default` when unset or blank.
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::ParseError {
                    key: key.to_string(),
                    details: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["production", "PRODUCTION", "Production"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert_eq!(Environment::from_env(), Environment::Production);
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default_with_value() {
        temp_env::with_var("OBV_TEST_VAR", Some("test_value"), || {
            assert_eq!(env_or_default("OBV_TEST_VAR", "default"), "test_value");
        });
    }

    #[test]
    fn test_env_or_default_blank_uses_default() {
        temp_env::with_var("OBV_BLANK_VAR", Some(""), || {
            assert_eq!(env_or_default("OBV_BLANK_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("OBV_MISSING_VAR", || {
            assert_eq!(
                env_or_default("OBV_MISSING_VAR", "default_value"),
                "default_value"
            );
        });
    }

    #[test]
    fn test_env_required_success() {
        temp_env::with_var("OBV_REQUIRED_VAR", Some("required_value"), || {
            let result = env_required("OBV_REQUIRED_VAR");
            assert_eq!(result.unwrap(), "required_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("OBV_MISSING_REQUIRED", || {
            let err = env_required("OBV_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("OBV_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_required_blank_is_missing() {
        temp_env::with_var("OBV_EMPTY_REQUIRED", Some("  "), || {
            let err = env_required("OBV_EMPTY_REQUIRED").unwrap_err();
            assert!(matches!(
                err,
                ConfigError::MissingEnvVar(ref key) if key == "OBV_EMPTY_REQUIRED"
            ));
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var("OBV_NUMBER", Some("42"), || {
            assert_eq!(env_parse_or("OBV_NUMBER", 7u32).unwrap(), 42);
        });
        temp_env::with_var_unset("OBV_NUMBER", || {
            assert_eq!(env_parse_or("OBV_NUMBER", 7u32).unwrap(), 7);
        });
        temp_env::with_var("OBV_NUMBER", Some("seven"), || {
            let err = env_parse_or("OBV_NUMBER", 7u32).unwrap_err();
            assert!(err.to_string().contains("OBV_NUMBER"));
        });
    }
}
