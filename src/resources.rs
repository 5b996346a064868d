//! Simulated external connections (database, cache, message bus).
//!
//! Each one stands in for a real client whose teardown takes some time and
//! may fail. They are registered with the closer like any other resource.

use std::time::Duration;

use crate::config::ResourceConfig;
use crate::lifecycle::{BoxError, Closer, Deadline, RegisterError};

/// A connection whose disconnect takes `delay` and then succeeds or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedResource {
    name: String,
    delay: Duration,
    failure: Option<String>,
}

impl SimulatedResource {
    /// A resource that disconnects cleanly after `delay`.
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            failure: None,
        }
    }

    /// Make the disconnect fail with `reason`.
    pub fn failing_with(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Task name used when registering the disconnect.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait out the delay, then report the configured outcome.
    ///
    /// The deadline is deliberately ignored: a slow disconnect keeps running
    /// after the closer stops waiting for it.
    pub async fn disconnect(self, _deadline: Deadline) -> Result<(), BoxError> {
        tokio::time::sleep(self.delay).await;
        match self.failure {
            Some(reason) => Err(reason.into()),
            None => Ok(()),
        }
    }

    /// Register this resource's disconnect with `closer`.
    pub fn register(self, closer: &Closer) -> Result<(), RegisterError> {
        let name = self.name.clone();
        closer.register(name, move |deadline| self.disconnect(deadline))
    }
}

impl From<&ResourceConfig> for SimulatedResource {
    fn from(config: &ResourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            delay: config.delay,
            failure: config.fail_with.clone(),
        }
    }
}

/// Register every configured resource, in config order.
pub fn register_all(closer: &Closer, resources: &[ResourceConfig]) -> Result<(), RegisterError> {
    for resource in resources {
        SimulatedResource::from(resource).register(closer)?;
        tracing::debug!(task = %resource.name, "Registered resource teardown");
    }
    Ok(())
}
