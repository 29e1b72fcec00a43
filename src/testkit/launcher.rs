//! Scripted [`NetworkLauncher`] for orchestration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Timeline;
use crate::domain::id::VmId;
use crate::error::{Error, LaunchError, Result};
use crate::port::launcher::{LaunchRequest, NetworkLauncher};
use crate::runtime::cancel::CancelScope;

/// What the launcher does once started.
#[derive(Debug, Clone, Copy)]
pub enum LaunchScript {
    /// Bootstrap after `delay`, then stay up until cancelled.
    Bootstrap { delay: Duration },
    /// Fail after `delay` without ever becoming ready.
    FailBeforeReady { delay: Duration },
    /// Become ready at once, then lose a node after `delay`.
    FailAfterReady { delay: Duration },
    /// Return cleanly after `delay` without ever becoming ready.
    ExitUnready { delay: Duration },
    /// Never bootstrap; wait for cancellation.
    Hang,
}

/// Launcher that follows a [`LaunchScript`] and records what it did.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    script: LaunchScript,
    timeline: Timeline,
    starts: Arc<AtomicUsize>,
    fires: Arc<AtomicUsize>,
    vm_id: Arc<Mutex<Option<VmId>>>,
}

impl ScriptedLauncher {
    pub fn new(script: LaunchScript, timeline: Timeline) -> Self {
        Self {
            script,
            timeline,
            starts: Arc::new(AtomicUsize::new(0)),
            fires: Arc::new(AtomicUsize::new(0)),
            vm_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of times the network was started.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of times readiness actually fired.
    pub fn fires(&self) -> usize {
        self.fires.load(Ordering::SeqCst)
    }

    /// VM id handed to the launcher, if any.
    pub fn vm_id(&self) -> Option<VmId> {
        *self.vm_id.lock()
    }

    fn node_failure() -> Error {
        LaunchError::NodeExited {
            index: 2,
            status: "exit status: 1".into(),
        }
        .into()
    }

    async fn teardown(&self, scope: &CancelScope) -> Error {
        let reason = scope.cancelled().await;
        self.timeline.record("launcher:teardown");
        Error::Cancelled(reason)
    }

    async fn sleep_or_cancel(&self, scope: &CancelScope, delay: Duration) -> Result<()> {
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            err = self.teardown(scope) => Err(err),
        }
    }
}

#[async_trait]
impl NetworkLauncher for ScriptedLauncher {
    async fn start_network(&self, request: LaunchRequest) -> Result<()> {
        let LaunchRequest { scope, vm_id, ready } = request;
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.vm_id.lock() = vm_id;
        self.timeline.record("launcher:start");

        match self.script {
            LaunchScript::Bootstrap { delay } => {
                self.sleep_or_cancel(&scope, delay).await?;
                if ready.fire() {
                    self.fires.fetch_add(1, Ordering::SeqCst);
                    self.timeline.record("launcher:ready");
                }
                // A second fire must be a no-op.
                if ready.fire() {
                    self.fires.fetch_add(1, Ordering::SeqCst);
                }
                scope.cancelled().await;
                self.timeline.record("launcher:teardown");
                Ok(())
            }
            LaunchScript::FailBeforeReady { delay } => {
                self.sleep_or_cancel(&scope, delay).await?;
                self.timeline.record("launcher:failed");
                Err(Self::node_failure())
            }
            LaunchScript::FailAfterReady { delay } => {
                if ready.fire() {
                    self.fires.fetch_add(1, Ordering::SeqCst);
                    self.timeline.record("launcher:ready");
                }
                match self.sleep_or_cancel(&scope, delay).await {
                    Ok(()) => {
                        self.timeline.record("launcher:failed");
                        Err(Self::node_failure())
                    }
                    Err(_) => Ok(()),
                }
            }
            LaunchScript::ExitUnready { delay } => {
                self.sleep_or_cancel(&scope, delay).await?;
                drop(ready);
                Ok(())
            }
            LaunchScript::Hang => Err(self.teardown(&scope).await),
        }
    }
}
