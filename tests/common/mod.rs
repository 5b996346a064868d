//! Shared helpers for closer and service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grash::lifecycle::{BoxError, Closer};

/// Counts how many times each registered action ran.
#[derive(Clone, Default)]
pub struct Invocations {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

#[allow(dead_code)]
impl Invocations {
    pub fn count(&self, name: &str) -> usize {
        self.counts.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.counts.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn record(&self, name: &str) {
        *self.counts.lock().unwrap().entry(name.to_string()).or_default() += 1;
    }
}

/// Register an action that sleeps `delay`, records its invocation, then
/// succeeds or fails with `failure`.
pub fn register_timed(
    closer: &Closer,
    invocations: &Invocations,
    name: &str,
    delay: Duration,
    failure: Option<&str>,
) {
    let invocations = invocations.clone();
    let task = name.to_string();
    let failure = failure.map(str::to_string);
    closer
        .register(name, move |_deadline| async move {
            tokio::time::sleep(delay).await;
            invocations.record(&task);
            match failure {
                Some(reason) => Err(BoxError::from(reason)),
                None => Ok(()),
            }
        })
        .unwrap();
}
