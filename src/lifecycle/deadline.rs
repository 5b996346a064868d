//! Shutdown deadline shared by the closer and every teardown action.

use std::time::Duration;
use tokio::time::Instant;

// Roughly 30 years, the same horizon tokio uses for an unbounded sleep.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A point in time after which shutdown stops waiting.
///
/// The deadline is owned by whoever starts the shutdown. It is handed to
/// [`Closer::close`](crate::lifecycle::Closer::close) and copied into each
/// action so that actions able to bound their own work can do so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline at an absolute instant.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Deadline `timeout` from now.
    ///
    /// A timeout too large to represent as an instant is clamped to a far
    /// future instant instead of overflowing.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { at }
    }

    /// The instant the deadline fires.
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Completes when the deadline fires.
    pub async fn expired(self) {
        tokio::time::sleep_until(self.at).await;
    }
}
