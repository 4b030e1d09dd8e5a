//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, window > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Validate the full configuration, collecting every failure.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "must be a valid socket address"));
    }
    if config.listener.max_connections == 0 {
        errors.push(err("listener.max_connections", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.rate_limit.limit == 0 {
        errors.push(err("rate_limit.limit", "must be greater than zero"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(err("rate_limit.window_secs", "must be greater than zero"));
    }
    if config.pagination.default_limit == 0 {
        errors.push(err("pagination.default_limit", "must be greater than zero"));
    }
    if config.pagination.max_limit == 0 {
        errors.push(err("pagination.max_limit", "must be greater than zero"));
    }
    if config.pagination.default_limit > config.pagination.max_limit {
        errors.push(err(
            "pagination.default_limit",
            "must not exceed pagination.max_limit",
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            "must be a valid socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
