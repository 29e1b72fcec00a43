use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::cancel::CancelReason;

/// Invocation and configuration errors. Always reported before any task starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid arguments: expected no arguments or [vm] [vm-genesis] [vm-id], got {count}")]
    ArgumentCount { count: usize },

    #[error("{} does not exist", path.display())]
    MissingPath { path: PathBuf },

    #[error("invalid VM ID '{value}': {reason}")]
    InvalidVmId { value: String, reason: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to stage VM plugin at {}: {source}", path.display())]
    StagePlugin {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while bringing the node cluster up or keeping it alive.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to prepare {}: {source}", path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn node {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("node {index} exited unexpectedly ({status})")]
    NodeExited { index: usize, status: String },

    #[error("node {index} did not respond: {source}")]
    Unreachable {
        index: usize,
        #[source]
        source: RpcError,
    },

    #[error("launcher stopped before the network became ready")]
    NeverReady,

    #[error("cluster has no nodes")]
    EmptyCluster,

    #[error("network did not bootstrap within {secs}s ({pending} chain(s) pending)")]
    BootstrapTimeout { secs: u64, pending: usize },
}

/// Errors raised by the subnet provisioning sequence.
///
/// Steps already applied are not rolled back.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("transaction {tx_id} was {status} during {step}")]
    TxRejected {
        step: &'static str,
        tx_id: String,
        status: String,
    },

    #[error("created subnet {actual} is not the whitelisted subnet {expected}")]
    SubnetMismatch { expected: String, actual: String },

    #[error("{step} timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },

    #[error("failed to read genesis {}: {source}", path.display())]
    Genesis {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected response during {step}: {reason}")]
    Malformed { step: &'static str, reason: String },
}

/// JSON-RPC transport and protocol errors.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} returned HTTP {status}")]
    Status { method: String, status: u16 },

    #[error("{method} failed with code {code}: {message}")]
    Remote {
        method: String,
        code: i64,
        message: String,
    },

    #[error("{method} returned an empty result")]
    EmptyResult { method: String },

    #[error("{method} returned an undecodable result: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("task {task} panicked")]
    TaskPanicked { task: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error only reports that the run was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
