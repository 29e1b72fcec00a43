//! Optional custom VM supplied on the command line.

use std::path::{Component, Path, PathBuf};

use super::id::VmId;
use crate::error::ConfigError;

/// A validated custom VM: module, genesis payload and identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmDescriptor {
    pub module_path: PathBuf,
    pub genesis_path: PathBuf,
    pub vm_id: VmId,
}

impl VmDescriptor {
    /// Build the descriptor from positional arguments.
    ///
    /// No arguments yields `None`. Exactly three are read as
    /// `<vm-module> <vm-genesis> <vm-id>`; both paths must exist and the id
    /// must be a well-formed content identifier. Any other count is an error.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Option<Self>, ConfigError> {
        match args {
            [] => Ok(None),
            [module, genesis, vm_id] => {
                let module_path = existing_path(module.as_ref())?;
                let genesis_path = existing_path(genesis.as_ref())?;
                let vm_id = vm_id
                    .as_ref()
                    .parse::<VmId>()
                    .map_err(|e| ConfigError::InvalidVmId {
                        value: vm_id.as_ref().to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(Self {
                    module_path,
                    genesis_path,
                    vm_id,
                }))
            }
            _ => Err(ConfigError::ArgumentCount { count: args.len() }),
        }
    }
}

/// Lexically normalize `raw` and require it to exist.
fn existing_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let path = clean(Path::new(raw));
    if path.exists() {
        Ok(path)
    } else {
        Err(ConfigError::MissingPath { path })
    }
}

fn clean(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
