//! Process-wide cancellation scope.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::port::signal::Termination;

/// Why a scope was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// An operator sent a termination signal.
    Signal(Termination),
    /// A task in the group returned an error.
    TaskFailed(&'static str),
    /// The network went away before it became ready.
    NetworkStopped,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "{signal} received"),
            Self::TaskFailed(task) => write!(f, "task {task} failed"),
            Self::NetworkStopped => write!(f, "network stopped"),
        }
    }
}

/// A cloneable cancellation scope shared by every task of a run.
///
/// Cancellation is sticky: the first [`cancel`](Self::cancel) records its
/// reason, later calls are no-ops.
#[derive(Debug, Clone)]
pub struct CancelScope {
    tx: Arc<watch::Sender<Option<CancelReason>>>,
}

impl CancelScope {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel the scope. Returns `true` only for the call that cancelled it.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Reason recorded by the first cancellation, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        *self.tx.borrow()
    }

    /// Resolve once the scope is cancelled, yielding the recorded reason.
    pub async fn cancelled(&self) -> CancelReason {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                return CancelReason::NetworkStopped;
            }
        }
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_cancel_wins() {
        let scope = CancelScope::new();
        assert!(!scope.is_cancelled());

        assert!(scope.cancel(CancelReason::Signal(Termination::Interrupt)));
        assert!(!scope.cancel(CancelReason::TaskFailed("launcher")));

        assert!(scope.is_cancelled());
        assert_eq!(
            scope.reason(),
            Some(CancelReason::Signal(Termination::Interrupt))
        );
    }

    #[test]
    fn clones_share_state() {
        let scope = CancelScope::new();
        let clone = scope.clone();
        clone.cancel(CancelReason::NetworkStopped);
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_for_waiters_registered_before_cancel() {
        let scope = CancelScope::new();
        let waiter = {
            let scope = scope.clone();
            tokio::spawn(async move { scope.cancelled().await })
        };
        tokio::task::yield_now().await;

        scope.cancel(CancelReason::TaskFailed("provisioner"));
        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter unblocked")
            .expect("join");
        assert_eq!(reason, CancelReason::TaskFailed("provisioner"));
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_after_cancel() {
        let scope = CancelScope::new();
        scope.cancel(CancelReason::NetworkStopped);
        assert_eq!(scope.cancelled().await, CancelReason::NetworkStopped);
    }

    #[test]
    fn reason_display_names_the_cause() {
        assert_eq!(
            CancelReason::Signal(Termination::Terminate).to_string(),
            "SIGTERM received"
        );
        assert_eq!(
            CancelReason::TaskFailed("launcher").to_string(),
            "task launcher failed"
        );
    }
}
