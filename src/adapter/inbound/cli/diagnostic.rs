//! Miette diagnostics for errors reported before the network starts.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::ConfigError;

const USAGE: &str = "ledgersim [VM VM_GENESIS VM_ID]";

/// Invalid invocation.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(ledgersim::usage))]
pub struct UsageError {
    pub message: String,

    #[help]
    pub help: Option<String>,
}

impl UsageError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: None,
        }
    }

    /// Add a help suggestion to the error.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Settings file error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(ledgersim::settings))]
pub struct SettingsError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub help: Option<String>,
}

impl SettingsError {
    /// Point at the offending region of the settings file `name`.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        name: impl AsRef<str>,
        src: impl Into<String>,
        span: Option<(usize, usize)>,
    ) -> Self {
        Self {
            message: message.into(),
            src: NamedSource::new(name, src.into()),
            span: span.map(Into::into),
            help: Some("settings accept a [logging] table and a [node] table".into()),
        }
    }
}

/// Build a usage diagnostic for an argument error.
#[must_use]
pub fn usage(err: &ConfigError) -> UsageError {
    let diagnostic = UsageError::new(err.to_string());
    match err {
        ConfigError::ArgumentCount { .. } => {
            diagnostic.with_help(format!("usage: {USAGE}"))
        }
        ConfigError::MissingPath { .. } => {
            diagnostic.with_help("the VM binary and genesis file must both exist")
        }
        ConfigError::InvalidVmId { .. } => {
            diagnostic.with_help("VM IDs are 32-byte CB58 strings with a checksum")
        }
        ConfigError::StagePlugin { .. } => {
            diagnostic.with_help("set LEDGERSIM_PLUGIN_DIR to a writable directory")
        }
        ConfigError::InvalidValue { .. } | ConfigError::ReadFile(_) | ConfigError::Parse(_) => {
            diagnostic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn argument_count_suggests_usage() {
        let diagnostic = usage(&ConfigError::ArgumentCount { count: 2 });
        assert!(diagnostic.message.contains("got 2"));
        assert_eq!(diagnostic.help.as_deref(), Some("usage: ledgersim [VM VM_GENESIS VM_ID]"));
    }

    #[test]
    fn missing_path_names_the_path() {
        let diagnostic = usage(&ConfigError::MissingPath {
            path: PathBuf::from("/nope/genesis.json"),
        });
        assert!(diagnostic.message.contains("/nope/genesis.json"));
        assert!(diagnostic.help.is_some());
    }

    #[test]
    fn settings_error_keeps_span() {
        let err = SettingsError::new("bad value", "ledgersim.toml", "a = 1", Some((4, 1)));
        assert_eq!(err.span, Some((4, 1).into()));
        assert_eq!(err.code().map(|code| code.to_string()).as_deref(), Some("ledgersim::settings"));
    }
}
