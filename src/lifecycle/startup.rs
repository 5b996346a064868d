//! Startup orchestration.
//!
//! # Responsibilities
//! - Start optional background subsystems (metrics exporter)
//! - Bind the listener before any traffic is accepted
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and happens before the closer is involved

use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{HttpServerConfig, ObservabilityConfig};
use crate::observability::metrics;

/// Error raised before the serve loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("cannot start metrics exporter: {0}")]
    Metrics(#[from] BuildError),
}

/// Bind the HTTP listener to the configured address.
pub async fn bind_listener(config: &HttpServerConfig) -> Result<TcpListener, StartupError> {
    let bind_error = |source| StartupError::Bind {
        address: config.address.clone(),
        source,
    };

    let listener = TcpListener::bind(&config.address).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

/// Start the metrics exporter if it is enabled.
pub fn start_metrics(config: &ObservabilityConfig) -> Result<(), StartupError> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .metrics_address
        .parse()
        .map_err(|_| StartupError::MetricsAddress(config.metrics_address.clone()))?;
    metrics::init_metrics(addr)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let config = HttpServerConfig {
            address: "127.0.0.1:0".into(),
        };
        let listener = bind_listener(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = HttpServerConfig {
            address: taken.local_addr().unwrap().to_string(),
        };

        let err = bind_listener(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }

    #[test]
    fn disabled_metrics_is_a_noop() {
        let config = ObservabilityConfig {
            metrics_enabled: false,
            metrics_address: "not an address".into(),
        };
        assert!(start_metrics(&config).is_ok());
    }
}
