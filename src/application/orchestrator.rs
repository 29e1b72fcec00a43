//! Launch-and-readiness orchestration.
//!
//! # Lifecycle
//!
//! ```text
//! Init ──► Running ──► Gate ──┬──► Provisioning ──► Draining ──► Terminal
//!                             └───────────────────► Draining
//! ```
//!
//! - **Init**: validate positional arguments before anything is spawned.
//! - **Running**: the signal watcher and the launcher share one cancel scope.
//! - **Gate**: wait for readiness or cancellation, whichever comes first.
//! - **Provisioning**: only when readiness won, the scope is still live and a
//!   custom VM was supplied.
//! - **Draining**: join every task and keep the first error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::cluster::ClusterConfig;
use crate::domain::vm::VmDescriptor;
use crate::error::{ConfigError, Error, LaunchError, Result};
use crate::port::launcher::{LaunchRequest, NetworkLauncher};
use crate::port::observer::{RunEvent, RunObserver};
use crate::port::provisioner::SubnetProvisioner;
use crate::port::signal::{Termination, TerminationSource};
use crate::runtime::cancel::{CancelReason, CancelScope};
use crate::runtime::group::TaskGroup;
use crate::runtime::readiness::readiness;
use crate::runtime::watcher::watch_signals;

/// Exit status for a run stopped by a termination signal.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How the gate resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Ready,
    NeverReady,
    Cancelled,
}

/// Result of one run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Readiness fired during the run.
    pub ready: bool,
    /// A provisioning task was spawned.
    pub provisioned: bool,
    /// Why the scope was cancelled, if it was.
    pub cancelled: Option<CancelReason>,
    /// First error reported by any task.
    pub result: Result<()>,
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The signal that ended the run, if an operator stopped it.
    #[must_use]
    pub fn interrupted_by(&self) -> Option<Termination> {
        match self.cancelled {
            Some(CancelReason::Signal(signal)) => Some(signal),
            _ => None,
        }
    }

    /// Process exit status for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(()) => 0,
            Err(Error::Cancelled(CancelReason::Signal(_))) => EXIT_INTERRUPTED,
            Err(_) => 1,
        }
    }
}

/// Wires the launcher, provisioner and signal watcher into one fail-fast run.
pub struct Orchestrator {
    launcher: Arc<dyn NetworkLauncher>,
    provisioner: Arc<dyn SubnetProvisioner>,
    observer: Arc<dyn RunObserver>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        launcher: Arc<dyn NetworkLauncher>,
        provisioner: Arc<dyn SubnetProvisioner>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            launcher,
            provisioner,
            observer,
        }
    }

    /// Validate positional arguments into an optional VM descriptor.
    pub fn init<S: AsRef<str>>(
        &self,
        args: &[S],
    ) -> std::result::Result<Option<VmDescriptor>, ConfigError> {
        let vm = VmDescriptor::from_args(args)?;
        if let Some(vm) = &vm {
            info!(
                module = %vm.module_path.display(),
                genesis = %vm.genesis_path.display(),
                vm_id = %vm.vm_id,
                "Custom VM selected"
            );
            self.observer.notify(&RunEvent::VmSelected {
                module_path: vm.module_path.clone(),
                genesis_path: vm.genesis_path.clone(),
                vm_id: vm.vm_id,
            });
        }
        Ok(vm)
    }

    /// Run the network until it fails or is stopped.
    pub async fn run<S>(
        &self,
        cluster: &ClusterConfig,
        vm: Option<VmDescriptor>,
        signals: S,
    ) -> RunOutcome
    where
        S: TerminationSource + 'static,
    {
        let scope = CancelScope::new();
        let (trigger, mut ready) = readiness();
        let mut group = TaskGroup::new(scope.clone());

        info!(
            nodes = cluster.node_count,
            network = %cluster.network_name,
            custom_vm = vm.is_some(),
            "Starting local network"
        );

        group.spawn(
            "signals",
            watch_signals(scope.clone(), signals, Arc::clone(&self.observer)),
        );

        let launcher = Arc::clone(&self.launcher);
        let launcher_scope = scope.clone();
        let fired = ready.clone();
        let request = LaunchRequest {
            scope: scope.clone(),
            vm_id: vm.as_ref().map(|vm| vm.vm_id),
            ready: trigger,
        };
        group.spawn("launcher", async move {
            launcher.start_network(request).await?;
            if !fired.is_ready() {
                // A clean return without readiness means the network never came up.
                return Err(match launcher_scope.reason() {
                    Some(reason @ CancelReason::Signal(_)) => Error::Cancelled(reason),
                    _ => LaunchError::NeverReady.into(),
                });
            }
            // Nothing is left to supervise; release the watcher.
            launcher_scope.cancel(CancelReason::NetworkStopped);
            Ok(())
        });

        let gate = tokio::select! {
            waited = ready.wait() => match waited {
                Ok(()) => Gate::Ready,
                Err(_) => Gate::NeverReady,
            },
            _ = scope.cancelled() => Gate::Cancelled,
        };
        debug!(?gate, "Gate resolved");

        if gate == Gate::NeverReady {
            // The launcher is gone; release the watcher.
            scope.cancel(CancelReason::NetworkStopped);
        }

        let mut provisioned = false;
        if gate == Gate::Ready && !scope.is_cancelled() {
            info!(nodes = cluster.node_count, "Network bootstrapped");
            self.observer.notify(&RunEvent::NetworkReady {
                nodes: cluster.node_count,
            });

            if let Some(vm) = vm {
                self.spawn_provisioner(&mut group, vm);
                provisioned = true;
            }
        }

        let result = self.drain(group, &scope).await;

        RunOutcome {
            ready: ready.is_ready(),
            provisioned,
            cancelled: scope.reason(),
            result,
        }
    }

    fn spawn_provisioner(&self, group: &mut TaskGroup, vm: VmDescriptor) {
        let provisioner = Arc::clone(&self.provisioner);
        let observer = Arc::clone(&self.observer);
        let scope = group.scope().clone();

        group.spawn("provisioner", async move {
            info!(vm_id = %vm.vm_id, "Provisioning subnet");
            observer.notify(&RunEvent::ProvisioningStarted { vm_id: vm.vm_id });

            let summary = provisioner
                .setup_subnet(&scope, vm.vm_id, &vm.genesis_path)
                .await?;

            info!(
                subnet_id = %summary.subnet_id,
                blockchain_id = %summary.blockchain_id,
                rpc = %summary.rpc_url,
                "Subnet provisioned"
            );
            observer.notify(&RunEvent::SubnetProvisioned(summary));
            Ok(())
        });
    }

    async fn drain(&self, group: TaskGroup, scope: &CancelScope) -> Result<()> {
        let drain = group.wait();
        tokio::pin!(drain);

        tokio::select! {
            result = &mut drain => result,
            reason = scope.cancelled() => {
                info!(%reason, "Shutting down");
                self.observer.notify(&RunEvent::ShuttingDown(reason));
                drain.await
            }
        }
    }
}
