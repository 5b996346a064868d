//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Deployment environment name (e.g., "local", "prod").
    #[serde(default = "default_env")]
    pub env: String,

    /// Time budget for running every shutdown task. Required.
    ///
    /// Accepts a duration string such as `5s` or `1m30s`. A bare integer is
    /// read as whole seconds, not nanoseconds.
    #[serde(with = "duration")]
    pub shutdown_timeout: Duration,

    /// HTTP listener settings.
    #[serde(default)]
    pub http_server: HttpServerConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// External connections torn down on shutdown.
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

fn default_env() -> String {
    "local".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            shutdown_timeout: Duration::from_secs(5),
            http_server: HttpServerConfig::default(),
            observability: ObservabilityConfig::default(),
            resources: Vec::new(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpServerConfig {
    /// Listen address (e.g., "localhost:8080").
    pub address: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// An external connection closed during shutdown.
///
/// The teardown is simulated: it waits `delay`, then succeeds or fails with
/// `fail_with`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Task name used in logs and failure reports.
    pub name: String,

    /// How long the teardown takes.
    #[serde(default, with = "duration")]
    pub delay: Duration,

    /// Failure reason to report instead of succeeding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_with: Option<String>,
}
