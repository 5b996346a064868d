//! Diagnostic sink for shutdown progress.
//!
//! # Design Decisions
//! - Passed into the closer explicitly, never looked up globally
//! - Callbacks are synchronous and must not block
//! - Every callback has an empty default so sinks implement only what they need

use std::error::Error;
use std::time::Duration;

use crate::observability::metrics;

/// Receives lifecycle events while a [`Closer`](crate::lifecycle::Closer) runs.
pub trait ShutdownReporter: Send + Sync {
    /// `close` drained `tasks` registrations and has `budget` left before the deadline.
    fn close_started(&self, _tasks: usize, _budget: Duration) {}

    /// A task's action is about to run.
    fn task_started(&self, _name: &str) {}

    /// A task's action returned success.
    fn task_succeeded(&self, _name: &str, _elapsed: Duration) {}

    /// A task's action returned an error or panicked.
    fn task_failed(&self, _name: &str, _elapsed: Duration, _reason: &(dyn Error + 'static)) {}

    /// The deadline fired while `pending` tasks were still running.
    fn deadline_exceeded(&self, _pending: &[String]) {}

    /// Every task finished before the deadline; `failed` of them reported an error.
    fn close_finished(&self, _elapsed: Duration, _failed: usize) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ShutdownReporter for NoopReporter {}

/// Forwards events to `tracing` and records shutdown metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ShutdownReporter for TracingReporter {
    fn close_started(&self, tasks: usize, budget: Duration) {
        tracing::info!(
            tasks,
            budget_ms = budget.as_millis() as u64,
            "Ready to execute close funcs"
        );
    }

    fn task_started(&self, name: &str) {
        tracing::debug!(task = %name, "Closing");
    }

    fn task_succeeded(&self, name: &str, elapsed: Duration) {
        tracing::info!(
            task = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            "Closed"
        );
        metrics::record_shutdown_task(name, "success", elapsed);
    }

    fn task_failed(&self, name: &str, elapsed: Duration, reason: &(dyn Error + 'static)) {
        tracing::error!(
            task = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %reason,
            "Close failed"
        );
        metrics::record_shutdown_task(name, "failure", elapsed);
    }

    fn deadline_exceeded(&self, pending: &[String]) {
        tracing::warn!(
            pending = ?pending,
            "Shutdown deadline exceeded, abandoning running tasks"
        );
        metrics::record_deadline_exceeded();
    }

    fn close_finished(&self, elapsed: Duration, failed: usize) {
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            failed,
            "All close funcs finished"
        );
    }
}
