//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! A classifier mode that disagrees with the entrypoint list is not a
//! validation error: the engine logs it and passes requests through.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::reroute::OriginTemplate;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::invalid(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.upstream.address.trim().is_empty() {
        errors.push(ValidationError::invalid("upstream.address", "must not be empty"));
    }

    let skew = &config.skew_protection;
    if skew.cookie_name.trim().is_empty() {
        errors.push(ValidationError::invalid("skew_protection.cookie_name", "must not be empty"));
    }
    if !skew.cookie_path.starts_with('/') {
        errors.push(ValidationError::invalid("skew_protection.cookie_path", "must start with '/'"));
    }
    if skew.secret_environment_variable_name.trim().is_empty() {
        errors.push(ValidationError::invalid(
            "skew_protection.secret_environment_variable_name",
            "must not be empty",
        ));
    }

    if let Err(e) = OriginTemplate::new(config.reroute.origin_template.clone()) {
        errors.push(ValidationError::invalid("reroute.origin_template", e.to_string()));
    }
    if config.reroute.timeout_secs == 0 {
        errors.push(ValidationError::invalid("reroute.timeout_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::invalid("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::invalid(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
