//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (shutdown timeout > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a loaded config.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("env must not be empty")]
    EmptyEnv,
    #[error("shutdown_timeout must be greater than zero")]
    ZeroShutdownTimeout,
    #[error("http_server.address `{0}` is not a host:port pair")]
    InvalidAddress(String),
    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
    #[error("resources[{0}] has an empty name")]
    UnnamedResource(usize),
}

/// Check a parsed config, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.env.trim().is_empty() {
        errors.push(ValidationError::EmptyEnv);
    }

    if config.shutdown_timeout.is_zero() {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if !is_host_port(&config.http_server.address) {
        errors.push(ValidationError::InvalidAddress(config.http_server.address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for (index, resource) in config.resources.iter().enumerate() {
        if resource.name.trim().is_empty() {
            errors.push(ValidationError::UnnamedResource(index));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Host names such as "localhost" are resolved at bind time, only the shape is checked here.
fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResourceConfig;
    use std::time::Duration;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.env = " ".into();
        config.shutdown_timeout = Duration::ZERO;
        config.http_server.address = "localhost".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();
        config.resources.push(ResourceConfig {
            name: String::new(),
            delay: Duration::ZERO,
            fail_with: None,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyEnv,
                ValidationError::ZeroShutdownTimeout,
                ValidationError::InvalidAddress("localhost".into()),
                ValidationError::InvalidMetricsAddress("nowhere".into()),
                ValidationError::UnnamedResource(0),
            ]
        );
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn accepts_ipv6_and_port_zero() {
        let mut config = ServiceConfig::default();
        config.http_server.address = "[::1]:0".into();
        assert!(validate_config(&config).is_ok());
    }
}
