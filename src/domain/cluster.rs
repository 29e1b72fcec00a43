//! Fixed shape of the local test network.
//!
//! The values here are not operator-tunable. A [`ClusterConfig`] is built once
//! at process start and handed by reference to every component that needs it.

use std::time::Duration;

use super::id::SubnetId;

/// Number of nodes in the local cluster.
pub const NODE_COUNT: usize = 5;
/// HTTP port of node 0. Node `i` listens on `BASE_HTTP_PORT + 2i`.
pub const BASE_HTTP_PORT: u16 = 9650;
/// Timeout applied to every JSON-RPC request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Mode for created directories and staged plugin files.
pub const FILE_MODE: u32 = 0o777;
/// Top-level chains every node must bootstrap.
pub const CHAINS: [&str; 3] = ["P", "C", "X"];
/// Subnet every node is started with permission to validate.
pub const WHITELISTED_SUBNET: &str = "29uVeLPJB1eQJkzRemU8g8wZDw5uJRqpab5U2mX9euieVwiEbL";
/// Name given to the blockchain created for a custom VM.
pub const VM_NAME: &str = "kewl vm";
/// Network-instance tag passed to every node.
pub const NETWORK_NAME: &str = "local";

const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const LOOPBACK: &str = "127.0.0.1";

/// Immutable cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub node_count: usize,
    pub network_name: String,
    pub base_http_port: u16,
    pub http_timeout: Duration,
    pub file_mode: u32,
    pub chains: Vec<String>,
    pub whitelisted_subnet: String,
    pub vm_name: String,
    pub bootstrap_timeout: Duration,
    pub poll_interval: Duration,
}

impl ClusterConfig {
    /// The standard local cluster.
    #[must_use]
    pub fn local() -> Self {
        Self {
            node_count: NODE_COUNT,
            network_name: NETWORK_NAME.to_string(),
            base_http_port: BASE_HTTP_PORT,
            http_timeout: HTTP_TIMEOUT,
            file_mode: FILE_MODE,
            chains: CHAINS.iter().map(ToString::to_string).collect(),
            whitelisted_subnet: WHITELISTED_SUBNET.to_string(),
            vm_name: VM_NAME.to_string(),
            bootstrap_timeout: BOOTSTRAP_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Ports and identity of every node, in start order.
    #[must_use]
    pub fn node_specs(&self) -> Vec<NodeSpec> {
        (0..self.node_count)
            .map(|index| NodeSpec {
                index,
                http_port: self.http_port(index),
                staking_port: self.http_port(index) + 1,
            })
            .collect()
    }

    /// HTTP port of node `index`.
    #[must_use]
    pub fn http_port(&self, index: usize) -> u16 {
        let index = u16::try_from(index).unwrap_or(u16::MAX);
        self.base_http_port.saturating_add(index.saturating_mul(2))
    }

    /// Base URL of node `index`'s HTTP API.
    #[must_use]
    pub fn http_endpoint(&self, index: usize) -> String {
        format!("http://{LOOPBACK}:{}", self.http_port(index))
    }

    /// `host:port` other nodes use to reach node `index` over the staking protocol.
    #[must_use]
    pub fn staking_address(&self, index: usize) -> String {
        format!("{LOOPBACK}:{}", self.http_port(index) + 1)
    }

    /// Pre-computed subnet id, if the constant is well formed.
    #[must_use]
    pub fn whitelisted_subnet_id(&self) -> Option<SubnetId> {
        self.whitelisted_subnet.parse().ok()
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::local()
    }
}

/// Ports assigned to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpec {
    pub index: usize,
    pub http_port: u16,
    pub staking_port: u16,
}

impl NodeSpec {
    /// Node 0 is the beacon every other node bootstraps from.
    #[must_use]
    pub const fn is_beacon(&self) -> bool {
        self.index == 0
    }
}
