//! Staging a VM module where the nodes will load it.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::domain::vm::VmDescriptor;
use crate::error::ConfigError;

/// Create `dir` and its parents with `mode`.
pub async fn create_dir(dir: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(dir).await
}

/// Copy the VM module to `<plugin_dir>/<vm_id>` with `mode`.
///
/// Nodes look VMs up by id, so the file name must be the CB58 id.
pub async fn stage_plugin(
    vm: &VmDescriptor,
    plugin_dir: &Path,
    mode: u32,
) -> Result<PathBuf, ConfigError> {
    let target = plugin_dir.join(vm.vm_id.to_string());
    let staged = |source| ConfigError::StagePlugin {
        path: target.clone(),
        source,
    };

    create_dir(plugin_dir, mode).await.map_err(staged)?;
    fs::copy(&vm.module_path, &target).await.map_err(staged)?;
    set_mode(&target, mode).await.map_err(staged)?;

    info!(
        module = %vm.module_path.display(),
        plugin = %target.display(),
        "VM plugin staged"
    );
    Ok(target)
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
