//! Top-level serve loop.
//!
//! # Flow
//! ```text
//! new(config, reporter)
//!     → register "HTTP server" teardown first, so it leads every report
//! run(listener, shutdown)
//!     → spawn HTTP serve loop (stops on its own token)
//!     → wait: shutdown token cancelled | serve loop died
//!     → close(Deadline::after(shutdown_timeout))
//! ```

use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::deadline::Deadline;
use crate::lifecycle::report::ShutdownReporter;
use crate::lifecycle::shutdown::{BoxError, CloseError, Closer, RegisterError};

/// Name of the teardown task that drains the HTTP listener.
pub const HTTP_SERVER_TASK: &str = "HTTP server";

type ServeOutcome = Result<(), String>;

/// Error ending [`ServiceRunner::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The serve loop stopped before a shutdown signal arrived.
    #[error("listen and serve: {0}")]
    Serve(String),

    /// Shutdown ran but some tasks failed or the deadline passed.
    #[error("closer: {0}")]
    Close(#[from] CloseError),
}

/// Owns the HTTP server and drives it through startup and shutdown.
pub struct ServiceRunner {
    config: ServiceConfig,
    closer: Closer,
    server: HttpServer,
    stop: CancellationToken,
    served: Shared<BoxFuture<'static, ServeOutcome>>,
    served_tx: oneshot::Sender<ServeOutcome>,
}

impl ServiceRunner {
    /// Create the runner and register the HTTP server teardown.
    ///
    /// The teardown cancels the serve loop and waits for open connections to
    /// drain, bounded by the shutdown deadline. If `run` was never called
    /// there is nothing to drain and it succeeds at once.
    pub fn new(
        config: ServiceConfig,
        reporter: Arc<dyn ShutdownReporter>,
    ) -> Result<Self, RegisterError> {
        let closer = Closer::with_reporter(reporter);
        let stop = CancellationToken::new();
        let (served_tx, served_rx) = oneshot::channel::<ServeOutcome>();
        let served = served_rx
            .map(|received| received.unwrap_or(Ok(())))
            .boxed()
            .shared();

        let drained = served.clone();
        let trigger = stop.clone();
        closer.register(HTTP_SERVER_TASK, move |deadline: Deadline| async move {
            trigger.cancel();
            tokio::select! {
                result = drained => result.map_err(BoxError::from),
                _ = deadline.expired() => {
                    Err(BoxError::from("deadline exceeded while draining connections"))
                }
            }
        })?;

        Ok(Self {
            config,
            closer,
            server: HttpServer::new(),
            stop,
            served,
            served_tx,
        })
    }

    /// The closer that `run` will invoke on shutdown.
    ///
    /// Collaborators register their own teardown here before calling `run`.
    /// They run after the HTTP server teardown in registration order.
    pub fn closer(&self) -> &Closer {
        &self.closer
    }

    /// Serve until `shutdown` is cancelled, then close everything within
    /// the configured shutdown timeout.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), RunError> {
        let ServiceRunner {
            config,
            closer,
            server,
            stop,
            served,
            served_tx,
        } = self;

        let address = listener
            .local_addr()
            .map_err(|e| RunError::Serve(e.to_string()))?;

        let serving = tokio::spawn(server.run(listener, stop));
        // A panicking serve loop still reports through the join error.
        tokio::spawn(async move {
            let outcome = match serving.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let _ = served_tx.send(outcome);
        });

        tracing::info!(address = %address, env = %config.env, "Listening");

        let serve_failure = tokio::select! {
            _ = shutdown.cancelled() => None,
            result = served => Some(
                result.err().unwrap_or_else(|| "server stopped unexpectedly".to_string()),
            ),
        };

        if let Some(reason) = &serve_failure {
            tracing::error!(error = %reason, "HTTP server stopped before shutdown was requested");
        }

        tracing::info!(
            timeout_ms = config.shutdown_timeout.as_millis() as u64,
            "Shutting down server gracefully"
        );
        let closed = closer.close(Deadline::after(config.shutdown_timeout)).await;

        match serve_failure {
            Some(reason) => {
                if let Err(e) = closed {
                    tracing::error!(error = %e, "Shutdown after serve failure was incomplete");
                }
                Err(RunError::Serve(reason))
            }
            None => closed.map_err(RunError::Close),
        }
    }
}
