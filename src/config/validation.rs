//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the base URL and submission endpoint shape
//! - Validate value ranges (timeouts > 0, known log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// One semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api.base_url {0:?} is not a valid URL")]
    InvalidBaseUrl(String),

    #[error("api.base_url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("api.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("submission.endpoint must start with \"/\", got {0:?}")]
    InvalidEndpoint(String),

    #[error("wallet.private_key_env must not be empty")]
    EmptyKeyVariable,

    #[error("observability.log_level {0:?} is not a known level")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check everything serde cannot.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidBaseUrl(config.api.base_url.clone())),
    }

    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if !config.submission.endpoint.starts_with('/') {
        errors.push(ValidationError::InvalidEndpoint(config.submission.endpoint.clone()));
    }

    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::EmptyKeyVariable);
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://ledger".into();
        config.api.timeout_secs = 0;
        config.submission.endpoint = "v3/transactions".into();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnsupportedScheme("ftp".into()),
                ValidationError::ZeroTimeout,
                ValidationError::InvalidEndpoint("v3/transactions".into()),
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_unparseable_base_url() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidBaseUrl("not a url".into())]);
    }
}
