//! Shutdown coordination for the service.
//!
//! # Protocol
//! ```text
//! register(name, action) ... register(name, action)     (any task, any order)
//!     │
//! close(deadline)
//!     ├─ lock → mark closing → drain registry → unlock
//!     ├─ spawn one tokio task per action ──┐
//!     ├─ spawn fan-in supervisor (join_all) ◀┘ ─→ done
//!     └─ select { done, deadline }
//!            done     → Ok or TaskFailures (registration order)
//!            deadline → DeadlineExceeded (still-running tasks abandoned)
//! ```
//!
//! # Design Decisions
//! - The registry lock is only held to append or to drain, never across an await
//! - Registration after `close` has started is rejected, the action never runs
//! - A second `close` drains an empty registry and returns `Ok(())`
//! - Outcomes land in per-index slots behind a mutex, so reports keep registration order
//! - No per-task timeout and no forced cancellation: actions that ignore the
//!   deadline keep running after `close` returns

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::lifecycle::deadline::Deadline;
use crate::lifecycle::report::{NoopReporter, ShutdownReporter};

/// Opaque failure reason returned by a teardown action.
pub type BoxError = Box<dyn Error + Send + Sync>;

type ActionFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type Action = Box<dyn FnOnce(Deadline) -> ActionFuture + Send>;
type Outcome = Result<(), BoxError>;

/// Error returned when a task cannot be registered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// `close` has already drained the registry.
    #[error("shutdown already started, task `{name}` was not registered")]
    Closing { name: String },
}

/// One failed teardown action.
#[derive(Debug, Error)]
#[error("{name}: {reason}")]
pub struct TaskFailure {
    name: String,
    reason: BoxError,
}

impl TaskFailure {
    /// Name the task was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reason reported by the action.
    pub fn reason(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.reason
    }
}

/// Error returned by [`Closer::close`].
#[derive(Debug, Error)]
pub enum CloseError {
    /// The deadline fired before every task finished.
    #[error("shutdown cancelled: deadline exceeded, {}", describe_pending(.pending))]
    DeadlineExceeded { pending: Vec<String> },

    /// Every task finished but at least one reported an error.
    #[error("shutdown finished with error(s):\n{}", describe_failures(.0))]
    TaskFailures(Vec<TaskFailure>),
}

impl CloseError {
    /// Whether this is the timeout path.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, CloseError::DeadlineExceeded { .. })
    }

    /// Failed tasks in registration order; empty on the timeout path.
    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            CloseError::TaskFailures(failures) => failures,
            CloseError::DeadlineExceeded { .. } => &[],
        }
    }

    /// Tasks still running when the deadline fired; empty otherwise.
    pub fn pending(&self) -> &[String] {
        match self {
            CloseError::DeadlineExceeded { pending } => pending,
            CloseError::TaskFailures(_) => &[],
        }
    }
}

fn describe_pending(pending: &[String]) -> String {
    format!("{} task(s) still running: {}", pending.len(), pending.join(", "))
}

fn describe_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("[!] {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
#[error("task panicked: {0}")]
struct TaskPanicked(String);

struct ShutdownTask {
    name: String,
    action: Action,
}

impl fmt::Debug for ShutdownTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Registry {
    tasks: Vec<ShutdownTask>,
    closing: bool,
}

struct Inner {
    registry: Mutex<Registry>,
    reporter: Arc<dyn ShutdownReporter>,
}

/// Registry of named teardown actions, run together under one deadline.
///
/// Cloning is cheap and every clone shares the same registry, so independent
/// subsystems can register their own teardown concurrently.
#[derive(Clone)]
pub struct Closer {
    inner: Arc<Inner>,
}

impl Closer {
    /// Create a closer that reports nothing.
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(NoopReporter))
    }

    /// Create a closer that reports progress to `reporter`.
    pub fn with_reporter(reporter: Arc<dyn ShutdownReporter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                reporter,
            }),
        }
    }

    /// Append a teardown action.
    ///
    /// Names are not required to be unique. Fails once `close` has started;
    /// the rejected action is dropped without running.
    pub fn register<F, Fut, E>(
        &self,
        name: impl Into<String>,
        action: F,
    ) -> Result<(), RegisterError>
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let name = name.into();
        let mut registry = self.lock_registry();
        if registry.closing {
            return Err(RegisterError::Closing { name });
        }

        let action: Action = Box::new(move |deadline| -> ActionFuture {
            Box::pin(async move { action(deadline).await.map_err(Into::into) })
        });
        registry.tasks.push(ShutdownTask { name, action });
        Ok(())
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.lock_registry().tasks.len()
    }

    /// Whether no tasks are waiting to run.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `close` has been called.
    pub fn is_closing(&self) -> bool {
        self.lock_registry().closing
    }

    /// Run every registered action concurrently and wait for all of them or
    /// for `deadline`, whichever comes first.
    ///
    /// On the timeout path this returns as soon as the deadline fires. Actions
    /// still running are left to finish in the background and their outcomes
    /// are discarded.
    pub async fn close(&self, deadline: Deadline) -> Result<(), CloseError> {
        let tasks = {
            let mut registry = self.lock_registry();
            registry.closing = true;
            std::mem::take(&mut registry.tasks)
        };

        let reporter = Arc::clone(&self.inner.reporter);
        reporter.close_started(tasks.len(), deadline.remaining());
        let started = Instant::now();

        if tasks.is_empty() {
            reporter.close_finished(started.elapsed(), 0);
            return Ok(());
        }

        let names: Vec<String> = tasks.iter().map(|task| task.name.clone()).collect();
        let slots: Arc<Mutex<Vec<Option<Outcome>>>> = Arc::new(Mutex::new(
            std::iter::repeat_with(|| None).take(tasks.len()).collect(),
        ));

        let handles: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                tokio::spawn(run_task(
                    index,
                    task,
                    deadline,
                    Arc::clone(&slots),
                    Arc::clone(&reporter),
                ))
            })
            .collect();

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            join_all(handles).await;
            let _ = done_tx.send(());
        });

        tokio::select! {
            _ = done_rx => {}
            _ = deadline.expired() => {
                let pending: Vec<String> = lock(&slots)
                    .iter()
                    .zip(&names)
                    .filter(|(slot, _)| slot.is_none())
                    .map(|(_, name)| name.clone())
                    .collect();

                // Every slot filled means the work finished as the deadline fired.
                if !pending.is_empty() {
                    reporter.deadline_exceeded(&pending);
                    return Err(CloseError::DeadlineExceeded { pending });
                }
            }
        }

        let outcomes = std::mem::take(&mut *lock(&slots));
        let failures: Vec<TaskFailure> = names
            .into_iter()
            .zip(outcomes)
            .filter_map(|(name, outcome)| match outcome {
                Some(Err(reason)) => Some(TaskFailure { name, reason }),
                Some(Ok(())) => None,
                None => Some(TaskFailure {
                    name,
                    reason: "task was cancelled before completing".into(),
                }),
            })
            .collect();

        reporter.close_finished(started.elapsed(), failures.len());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError::TaskFailures(failures))
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        lock(&self.inner.registry)
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock_registry();
        f.debug_struct("Closer")
            .field("tasks", &registry.tasks)
            .field("closing", &registry.closing)
            .finish()
    }
}

async fn run_task(
    index: usize,
    task: ShutdownTask,
    deadline: Deadline,
    slots: Arc<Mutex<Vec<Option<Outcome>>>>,
    reporter: Arc<dyn ShutdownReporter>,
) {
    let ShutdownTask { name, action } = task;
    reporter.task_started(&name);
    let started = Instant::now();

    let outcome = match AssertUnwindSafe(action(deadline)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Box::new(TaskPanicked(panic_message(&*payload))) as BoxError),
    };

    let elapsed = started.elapsed();
    match &outcome {
        Ok(()) => reporter.task_succeeded(&name, elapsed),
        Err(reason) => reporter.task_failed(&name, elapsed, &**reason),
    }

    if let Some(slot) = lock(&slots).get_mut(index) {
        *slot = Some(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// Pushes, drains and slot writes cannot leave the data half-updated, so a
// poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
