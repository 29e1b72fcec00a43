//! Network launcher port.

use async_trait::async_trait;

use crate::domain::id::VmId;
use crate::error::Result;
use crate::runtime::cancel::CancelScope;
use crate::runtime::readiness::ReadyTrigger;

/// Everything a launcher needs for one run.
#[derive(Debug)]
pub struct LaunchRequest {
    /// Scope shared with every other task of the run.
    pub scope: CancelScope,
    /// Custom VM to keep track of, if one was supplied. Nodes are not
    /// configured from it.
    pub vm_id: Option<VmId>,
    /// Fired once every node reports itself bootstrapped.
    pub ready: ReadyTrigger,
}

/// Starts and supervises the node cluster.
///
/// Contract:
/// - fire `ready` exactly when the whole cluster is bootstrapped, never on failure;
/// - on cancellation before readiness, tear nodes down and return
///   [`Error::Cancelled`](crate::error::Error::Cancelled);
/// - after readiness, keep the network up until cancelled, then tear it down
///   and return `Ok(())`, or fail if a node dies.
#[async_trait]
pub trait NetworkLauncher: Send + Sync {
    async fn start_network(&self, request: LaunchRequest) -> Result<()>;
}
