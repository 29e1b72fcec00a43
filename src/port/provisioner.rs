//! Subnet provisioner port.

use std::path::Path;

use async_trait::async_trait;

use super::observer::SubnetSummary;
use crate::domain::id::VmId;
use crate::error::Result;
use crate::runtime::cancel::CancelScope;

/// Installs a custom VM on its own subnet of an already bootstrapped network.
///
/// The sequence (create subnet, add validators, create blockchain) is one
/// unit: any failed step fails the whole call and applied steps stay applied.
/// Cancellation aborts the remaining steps with
/// [`Error::Cancelled`](crate::error::Error::Cancelled).
#[async_trait]
pub trait SubnetProvisioner: Send + Sync {
    async fn setup_subnet(
        &self,
        scope: &CancelScope,
        vm_id: VmId,
        genesis_path: &Path,
    ) -> Result<SubnetSummary>;
}
