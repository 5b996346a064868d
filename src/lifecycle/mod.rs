//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Start metrics → Bind listener
//!
//! Run (runner.rs):
//!     Register teardown → Serve → wait for signal
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel lifecycle token
//!
//! Shutdown (shutdown.rs):
//!     Deadline derived → every registered task runs concurrently
//!     → all done (Ok / aggregated failures) or deadline hit (timeout)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listener
//! - Teardown is concurrent, not ordered
//! - Shutdown has a single shared deadline, no per-task timeouts

pub mod deadline;
pub mod report;
pub mod runner;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use deadline::Deadline;
pub use report::{NoopReporter, ShutdownReporter, TracingReporter};
pub use runner::{RunError, ServiceRunner, HTTP_SERVER_TASK};
pub use shutdown::{BoxError, CloseError, Closer, RegisterError, TaskFailure};
pub use startup::StartupError;
