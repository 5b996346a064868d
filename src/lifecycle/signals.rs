//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers
//! - Turn the first termination signal into a cancelled lifecycle token
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before the token is handed out, so a signal
//!   arriving during startup is not lost
//! - Fires at most once; later signals are absorbed, the shutdown deadline
//!   bounds how long the process keeps running

use tokio_util::sync::CancellationToken;

/// Install termination handlers and return a token cancelled by the first signal.
///
/// Must be called from within a Tokio runtime.
pub fn install() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!(signal = "SIGTERM", "Shutdown signal received");
                }
                _ = sigint.recv() => {
                    tracing::info!(signal = "SIGINT", "Shutdown signal received");
                }
            }
            trigger.cancel();
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!(signal = "CTRL+C", "Shutdown signal received");
                    trigger.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for CTRL+C");
                }
            }
        });
    }

    Ok(token)
}
