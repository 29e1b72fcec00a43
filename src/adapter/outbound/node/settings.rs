//! Where the node binary and its working files live.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Location of the node binary and the directories the cluster uses.
///
/// Loaded from the `[node]` table of `ledgersim.toml`, then overridden by
/// `LEDGERSIM_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeSettings {
    /// Node executable. Resolved through `PATH` when not absolute.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Root for per-node databases and logs.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Directory holding `staker{n}.crt` / `staker{n}.key`, one pair per node.
    #[serde(default)]
    pub staker_dir: Option<PathBuf>,
    /// Plugin directory the nodes load VMs from. Defaults to `plugins/` next
    /// to the binary.
    #[serde(default)]
    pub plugin_dir: Option<PathBuf>,
    /// Log level passed to each node.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds a node gets to exit after SIGTERM before it is killed.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_binary() -> PathBuf {
    PathBuf::from("avalanchego")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("ledgersim")
}

fn default_log_level() -> String {
    "info".into()
}

const fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            work_dir: default_work_dir(),
            staker_dir: None,
            plugin_dir: None,
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl NodeSettings {
    /// Effective plugin directory.
    #[must_use]
    pub fn plugin_dir(&self) -> PathBuf {
        if let Some(dir) = &self.plugin_dir {
            return dir.clone();
        }
        match self.binary.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join("plugins"),
            _ => self.work_dir.join("plugins"),
        }
    }

    /// Data directory of node `index`.
    #[must_use]
    pub fn node_dir(&self, index: usize) -> PathBuf {
        self.work_dir.join(format!("node{}", index + 1))
    }

    /// Staking certificate and key of node `index`, if a staker dir is set.
    #[must_use]
    pub fn staking_files(&self, index: usize) -> Option<(PathBuf, PathBuf)> {
        self.staker_dir.as_deref().map(|dir| staker_pair(dir, index))
    }

    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn staker_pair(dir: &Path, index: usize) -> (PathBuf, PathBuf) {
    let n = index + 1;
    (
        dir.join(format!("staker{n}.crt")),
        dir.join(format!("staker{n}.key")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_dir_defaults_next_to_binary() {
        let settings = NodeSettings {
            binary: PathBuf::from("/opt/node/build/avalanchego"),
            ..NodeSettings::default()
        };
        assert_eq!(
            settings.plugin_dir(),
            PathBuf::from("/opt/node/build/plugins")
        );
    }

    #[test]
    fn bare_binary_name_puts_plugins_under_work_dir() {
        let settings = NodeSettings {
            work_dir: PathBuf::from("/tmp/sim"),
            ..NodeSettings::default()
        };
        assert_eq!(settings.plugin_dir(), PathBuf::from("/tmp/sim/plugins"));
    }

    #[test]
    fn explicit_plugin_dir_wins() {
        let settings = NodeSettings {
            plugin_dir: Some(PathBuf::from("/plugins")),
            ..NodeSettings::default()
        };
        assert_eq!(settings.plugin_dir(), PathBuf::from("/plugins"));
    }

    #[test]
    fn node_dirs_and_stakers_are_one_based() {
        let settings = NodeSettings {
            work_dir: PathBuf::from("/w"),
            staker_dir: Some(PathBuf::from("/keys")),
            ..NodeSettings::default()
        };
        assert_eq!(settings.node_dir(0), PathBuf::from("/w/node1"));
        assert_eq!(
            settings.staking_files(4),
            Some((
                PathBuf::from("/keys/staker5.crt"),
                PathBuf::from("/keys/staker5.key")
            ))
        );
    }

    #[test]
    fn deserializes_partial_table() {
        let settings: NodeSettings = toml::from_str("binary = \"/bin/node\"").unwrap();
        assert_eq!(settings.binary, PathBuf::from("/bin/node"));
        assert_eq!(settings.shutdown_grace_secs, 10);
        assert!(settings.staker_dir.is_none());
    }
}
