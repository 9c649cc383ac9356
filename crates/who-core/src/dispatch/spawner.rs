//! Fire-and-forget task submission
//!
//! Every provider call and webhook delivery runs as a detached tokio task.
//! The caller never waits for completion and nothing cancels a task once it
//! is running; it ends on its own or at its own timeout.
//!
//! ## Scaling Risk
//!
//! An unbounded spawner puts one task in flight per matching entry per
//! change, with no backpressure. A burst of identifier changes can therefore
//! open any number of outbound connections. A bounded spawner caps the number
//! of running tasks and drops new work when the cap is reached.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::config::DispatchConfig;

/// Submits detached tasks, optionally capped
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    /// Name used in log lines ("dns", "webhook")
    name: &'static str,

    /// Permits for in-flight tasks; `None` means unbounded
    limit: Option<Arc<Semaphore>>,
}

impl TaskSpawner {
    /// Spawner with no cap on in-flight tasks
    pub fn unbounded(name: &'static str) -> Self {
        Self { name, limit: None }
    }

    /// Spawner that keeps at most `max_in_flight` tasks running
    ///
    /// A cap of zero is raised to one.
    pub fn bounded(name: &'static str, max_in_flight: usize) -> Self {
        Self {
            name,
            limit: Some(Arc::new(Semaphore::new(max_in_flight.max(1)))),
        }
    }

    /// Build a spawner from the shared dispatch settings
    pub fn from_config(name: &'static str, config: &DispatchConfig) -> Self {
        match config.max_in_flight {
            Some(max) => Self::bounded(name, max),
            None => Self::unbounded(name),
        }
    }

    /// Whether this spawner caps in-flight tasks
    pub fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }

    /// Spawn `task` without waiting for it
    ///
    /// Returns `false` when the task was dropped: either the cap is reached
    /// or there is no tokio runtime on the calling thread.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot dispatch {} task outside a tokio runtime: {}", self.name, e);
                return false;
            }
        };

        match &self.limit {
            None => {
                handle.spawn(task);
                true
            }
            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => {
                    handle.spawn(async move {
                        task.await;
                        drop(permit);
                    });
                    true
                }
                Err(_) => {
                    warn!(
                        "Too many {} tasks in flight, dropping this one. Consider raising max_in_flight.",
                        self.name
                    );
                    false
                }
            },
        }
    }
}
