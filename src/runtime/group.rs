//! Structured task group with first-error aggregation.
//!
//! Every task shares one [`CancelScope`]. The first task to fail records its
//! error and cancels the scope on the spot, so siblings start winding down
//! without waiting for [`TaskGroup::wait`].

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

use super::cancel::{CancelReason, CancelScope};
use crate::error::{Error, Result};

type ErrorSlot = Arc<Mutex<Option<Error>>>;

/// A fixed set of cooperating tasks joined as one unit.
pub struct TaskGroup {
    scope: CancelScope,
    tasks: JoinSet<()>,
    first_error: ErrorSlot,
}

impl TaskGroup {
    #[must_use]
    pub fn new(scope: CancelScope) -> Self {
        Self {
            scope,
            tasks: JoinSet::new(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// The scope shared by every task in the group.
    #[must_use]
    pub fn scope(&self) -> &CancelScope {
        &self.scope
    }

    /// Spawn a named task onto the group.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut guard = CompletionGuard {
            slot: Arc::clone(&self.first_error),
            scope: self.scope.clone(),
            name,
            armed: true,
        };

        self.tasks.spawn(
            async move {
                debug!("Task started");
                let result = task.await;
                guard.armed = false;
                match result {
                    Ok(()) => debug!("Task finished"),
                    Err(err) => {
                        if err.is_cancelled() {
                            debug!(error = %err, "Task stopped");
                        } else {
                            warn!(error = %err, "Task failed");
                        }
                        record_failure(&guard.slot, &guard.scope, name, err);
                    }
                }
            }
            .instrument(info_span!("task", name)),
        );
    }

    /// Wait for every task to finish and return the first error, if any.
    pub async fn wait(mut self) -> Result<()> {
        // Panics are recorded by the task's guard; the join error adds nothing.
        while self.tasks.join_next().await.is_some() {}

        match self.first_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Records a failure if the task is dropped before it completes.
struct CompletionGuard {
    slot: ErrorSlot,
    scope: CancelScope,
    name: &'static str,
    armed: bool,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.armed {
            record_failure(
                &self.slot,
                &self.scope,
                self.name,
                Error::TaskPanicked { task: self.name },
            );
        }
    }
}

fn record_failure(slot: &ErrorSlot, scope: &CancelScope, name: &'static str, err: Error) {
    {
        let mut first = slot.lock();
        if first.is_none() {
            *first = Some(err);
        }
    }
    scope.cancel(CancelReason::TaskFailed(name));
}
