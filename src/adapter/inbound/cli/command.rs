//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::infrastructure::config::LogFormat;

/// Launch an ephemeral five-node local ledger network.
///
/// With no arguments the network runs until interrupted. With
/// `<VM> <VM_GENESIS> <VM_ID>` a subnet running that VM is provisioned once
/// every node has bootstrapped.
#[derive(Parser, Debug)]
#[command(name = "ledgersim")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(long, default_value = "auto", hide_possible_values = true)]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format, overriding the settings file
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Settings file [default: ledgersim.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip the startup banner
    #[arg(long)]
    pub no_banner: bool,

    /// Custom VM: <VM> <VM_GENESIS> <VM_ID>
    #[arg(value_name = "VM_ARGS")]
    pub args: Vec<String>,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Forced color state, or `None` to detect.
    #[must_use]
    pub const fn forced(self) -> Option<bool> {
        match self {
            Self::Auto => None,
            Self::Always => Some(true),
            Self::Never => Some(false),
        }
    }
}
