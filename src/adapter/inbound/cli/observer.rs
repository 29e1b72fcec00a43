//! Console rendering of run events.

use crate::domain::cluster::ClusterConfig;
use crate::port::observer::{RunEvent, RunObserver};
use crate::runtime::cancel::CancelReason;

use super::output;

/// Prints run events through the [`output`] helpers.
pub struct ConsoleObserver {
    cluster: ClusterConfig,
}

impl ConsoleObserver {
    #[must_use]
    pub fn new(cluster: ClusterConfig) -> Self {
        Self { cluster }
    }
}

impl RunObserver for ConsoleObserver {
    fn notify(&self, event: &RunEvent) {
        match event {
            RunEvent::VmSelected {
                module_path,
                genesis_path,
                vm_id,
            } => {
                output::notice(&format!("vm set to: {}", module_path.display()));
                output::notice(&format!("vm-genesis set to: {}", genesis_path.display()));
                output::notice(&format!("VM ID set to: {vm_id}"));
            }
            RunEvent::SignalReceived(signal) => {
                output::alert(&format!("signal received: {signal}"));
            }
            RunEvent::NetworkReady { nodes } => {
                output::success(&format!("Network bootstrapped ({nodes} nodes)"));
                if output::verbosity() > 0 {
                    for index in 0..*nodes {
                        output::field(
                            &format!("node{}", index + 1),
                            self.cluster.http_endpoint(index),
                        );
                    }
                } else {
                    output::field("RPC", self.cluster.http_endpoint(0));
                }
            }
            RunEvent::ProvisioningStarted { vm_id } => {
                output::action("Provisioning", &format!("subnet for VM {vm_id}"));
            }
            RunEvent::SubnetProvisioned(summary) => {
                output::action_done("Provisioned", "custom VM subnet");
                output::field("Subnet", summary.subnet_id);
                output::field("Blockchain", summary.blockchain_id);
                output::field("VM RPC", &summary.rpc_url);
            }
            RunEvent::ShuttingDown(CancelReason::Signal(_)) => {
                output::warning("Shutting down network");
            }
            RunEvent::ShuttingDown(reason) => {
                output::warning(&format!("Shutting down network: {reason}"));
            }
        }
    }
}
