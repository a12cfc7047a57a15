//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, limits > 0)
//! - Check that header names/values, log filters and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.port must not be 0")]
    ZeroPort,

    #[error("server.request_timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("server.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("router.default_headers: invalid header name \"{0}\"")]
    InvalidHeaderName(String),

    #[error("router.default_headers: invalid value for header \"{0}\"")]
    InvalidHeaderValue(String),

    #[error("logger.level: invalid filter \"{0}\"")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address: invalid socket address \"{0}\"")]
    InvalidMetricsAddress(String),
}

/// Check every semantic constraint and collect all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if let Err(err) = config.router.header_map() {
        errors.push(err);
    }

    if EnvFilter::try_new(&config.logger.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logger.level.clone()));
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
