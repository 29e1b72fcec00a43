//! Operator settings.
//!
//! Everything here is optional. Settings are read from `ledgersim.toml` when
//! present, then overridden by environment variables (a `.env` file is loaded
//! first by the binary):
//!
//! | variable | setting |
//! |---|---|
//! | `LEDGERSIM_NODE_BINARY` | `node.binary` |
//! | `LEDGERSIM_WORK_DIR` | `node.work_dir` |
//! | `LEDGERSIM_STAKER_DIR` | `node.staker_dir` |
//! | `LEDGERSIM_PLUGIN_DIR` | `node.plugin_dir` |
//!
//! The cluster shape itself is fixed and not configurable.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::adapter::outbound::node::NodeSettings;
use crate::error::ConfigError;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "ledgersim.toml";

pub const ENV_NODE_BINARY: &str = "LEDGERSIM_NODE_BINARY";
pub const ENV_WORK_DIR: &str = "LEDGERSIM_WORK_DIR";
pub const ENV_STAKER_DIR: &str = "LEDGERSIM_STAKER_DIR";
pub const ENV_PLUGIN_DIR: &str = "LEDGERSIM_PLUGIN_DIR";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub node: NodeSettings,
}

impl Settings {
    /// Parse settings from TOML content, without environment overrides.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path` and the process environment.
    ///
    /// A missing file is not an error when `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let settings = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_toml(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                Self::default()
            }
            Err(err) => return Err(ConfigError::ReadFile(err)),
        };

        let settings = settings.with_env(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |name: &str| lookup(name).filter(|value| !value.is_empty()).map(PathBuf::from);

        if let Some(binary) = path(ENV_NODE_BINARY) {
            self.node.binary = binary;
        }
        if let Some(work_dir) = path(ENV_WORK_DIR) {
            self.node.work_dir = work_dir;
        }
        if let Some(staker_dir) = path(ENV_STAKER_DIR) {
            self.node.staker_dir = Some(staker_dir);
        }
        if let Some(plugin_dir) = path(ENV_PLUGIN_DIR) {
            self.node.plugin_dir = Some(plugin_dir);
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node.binary.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "node.binary",
                reason: "must not be empty".to_string(),
            });
        }
        if self.node.work_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "node.work_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.node.shutdown_grace_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "node.shutdown_grace_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
