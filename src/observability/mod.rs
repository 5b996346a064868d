//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events: stdout + JSON file)
//!     → metrics.rs (counters, histograms)
//!
//! Shutdown progress reaches both through lifecycle::report::TracingReporter.
//! ```

pub mod logging;
pub mod metrics;
