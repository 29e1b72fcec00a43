//! Observer port for run lifecycle events.
//!
//! The orchestrator reports what happens during a run through this trait so
//! the inbound adapter can render it (colored console, JSON lines) without the
//! runtime knowing about terminals.

use std::path::PathBuf;

use crate::domain::id::{BlockchainId, SubnetId, VmId};
use crate::port::signal::Termination;
use crate::runtime::cancel::CancelReason;

/// Events emitted over the course of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A custom VM was accepted on the command line.
    VmSelected {
        module_path: PathBuf,
        genesis_path: PathBuf,
        vm_id: VmId,
    },
    /// An operator asked the run to stop.
    SignalReceived(Termination),
    /// Every node reported every chain bootstrapped.
    NetworkReady { nodes: usize },
    /// Subnet provisioning began.
    ProvisioningStarted { vm_id: VmId },
    /// The custom VM is running on its own subnet.
    SubnetProvisioned(SubnetSummary),
    /// The run is winding down.
    ShuttingDown(CancelReason),
}

/// Identifiers and endpoint of a provisioned subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSummary {
    pub subnet_id: SubnetId,
    pub blockchain_id: BlockchainId,
    pub rpc_url: String,
}

/// Receives run events. Implementations must not block.
pub trait RunObserver: Send + Sync {
    fn notify(&self, event: &RunEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn notify(&self, _event: &RunEvent) {}
}
