//! Scripted [`SubnetProvisioner`] for orchestration tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Timeline;
use crate::domain::id::{BlockchainId, SubnetId, VmId};
use crate::error::{Error, ProvisionError, Result};
use crate::port::observer::SubnetSummary;
use crate::port::provisioner::SubnetProvisioner;
use crate::runtime::cancel::CancelScope;

/// What the provisioner does once called.
#[derive(Debug, Clone, Copy)]
pub enum ProvisionScript {
    /// Succeed after `delay`.
    Succeed { delay: Duration },
    /// Fail the create-subnet step after `delay`.
    Fail { delay: Duration },
    /// Never finish; wait for cancellation.
    Hang,
}

/// Provisioner that follows a [`ProvisionScript`] and records its calls.
#[derive(Debug, Clone)]
pub struct ScriptedProvisioner {
    script: ProvisionScript,
    timeline: Timeline,
    calls: Arc<AtomicUsize>,
    last_call: Arc<Mutex<Option<(VmId, PathBuf)>>>,
}

impl ScriptedProvisioner {
    pub fn new(script: ProvisionScript, timeline: Timeline) -> Self {
        Self {
            script,
            timeline,
            calls: Arc::new(AtomicUsize::new(0)),
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent call.
    pub fn last_call(&self) -> Option<(VmId, PathBuf)> {
        self.last_call.lock().clone()
    }

    /// Summary returned by a successful script.
    pub fn summary() -> SubnetSummary {
        let blockchain_id = BlockchainId::from_bytes([2; 32]);
        SubnetSummary {
            subnet_id: SubnetId::from_bytes([1; 32]),
            blockchain_id,
            rpc_url: format!("http://127.0.0.1:9650/ext/bc/{blockchain_id}/rpc"),
        }
    }
}

#[async_trait]
impl SubnetProvisioner for ScriptedProvisioner {
    async fn setup_subnet(
        &self,
        scope: &CancelScope,
        vm_id: VmId,
        genesis_path: &Path,
    ) -> Result<SubnetSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock() = Some((vm_id, genesis_path.to_path_buf()));
        self.timeline.record("provisioner:start");

        let delay = match self.script {
            ProvisionScript::Succeed { delay } | ProvisionScript::Fail { delay } => delay,
            ProvisionScript::Hang => Duration::MAX,
        };

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            reason = scope.cancelled() => {
                self.timeline.record("provisioner:cancelled");
                return Err(Error::Cancelled(reason));
            }
        }

        match self.script {
            ProvisionScript::Succeed { .. } => {
                self.timeline.record("provisioner:done");
                Ok(Self::summary())
            }
            ProvisionScript::Fail { .. } | ProvisionScript::Hang => {
                self.timeline.record("provisioner:failed");
                Err(ProvisionError::TxRejected {
                    step: "create subnet",
                    tx_id: "2aB".into(),
                    status: "Dropped".into(),
                }
                .into())
            }
        }
    }
}
