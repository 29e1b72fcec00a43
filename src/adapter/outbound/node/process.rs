//! One node child process.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::settings::NodeSettings;
use crate::domain::cluster::{ClusterConfig, NodeSpec};
use crate::domain::id::NodeId;
use crate::error::LaunchError;

/// Where a non-beacon node finds the network.
#[derive(Debug, Clone)]
pub struct Beacon {
    pub address: String,
    pub node_id: NodeId,
}

/// Command-line flags for one node.
#[must_use]
pub fn node_args(
    cluster: &ClusterConfig,
    settings: &NodeSettings,
    spec: &NodeSpec,
    beacon: Option<&Beacon>,
) -> Vec<String> {
    let node_dir = settings.node_dir(spec.index);
    let mut args = vec![
        format!("--network-id={}", cluster.network_name),
        "--public-ip=127.0.0.1".to_string(),
        format!("--http-port={}", spec.http_port),
        format!("--staking-port={}", spec.staking_port),
        format!("--db-dir={}", node_dir.join("db").display()),
        format!("--log-dir={}", node_dir.join("logs").display()),
        format!("--log-level={}", settings.log_level),
        format!("--plugin-dir={}", settings.plugin_dir().display()),
        format!("--whitelisted-subnets={}", cluster.whitelisted_subnet),
    ];

    match beacon {
        Some(beacon) => {
            args.push(format!("--bootstrap-ips={}", beacon.address));
            args.push(format!("--bootstrap-ids={}", beacon.node_id));
        }
        None => {
            args.push("--bootstrap-ips=".to_string());
            args.push("--bootstrap-ids=".to_string());
        }
    }

    if let Some((cert, key)) = settings.staking_files(spec.index) {
        args.push(format!("--staking-tls-cert-file={}", cert.display()));
        args.push(format!("--staking-tls-key-file={}", key.display()));
    }

    args
}

/// A running node. Killed if dropped without [`NodeProcess::terminate`].
#[derive(Debug)]
pub struct NodeProcess {
    index: usize,
    child: Child,
}

impl NodeProcess {
    /// Start the node binary with `args`, sending its output to `log_path`.
    pub fn spawn(
        index: usize,
        binary: &Path,
        args: &[String],
        log_path: &Path,
    ) -> Result<Self, LaunchError> {
        let log = File::create(log_path).map_err(|source| LaunchError::Prepare {
            path: log_path.to_path_buf(),
            source,
        })?;
        let stderr = log.try_clone().map_err(|source| LaunchError::Prepare {
            path: log_path.to_path_buf(),
            source,
        })?;

        let child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn { index, source })?;

        info!(node = index, pid = child.id(), "Node started");
        Ok(Self { index, child })
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Wait for the process to exit and describe how it went.
    pub async fn exited(&mut self) -> String {
        match self.child.wait().await {
            Ok(status) => status.to_string(),
            Err(err) => format!("wait failed: {err}"),
        }
    }

    /// Ask the node to stop, then kill it if it outlives `grace`.
    pub async fn terminate(mut self, grace: Duration) {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(node = self.index, %status, "Node already exited");
            return;
        }

        self.send_sigterm();
        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(node = self.index, %status, "Node stopped");
            }
            Ok(Err(err)) => warn!(node = self.index, error = %err, "Failed to reap node"),
            Err(_) => {
                warn!(
                    node = self.index,
                    grace_secs = grace.as_secs(),
                    "Node ignored SIGTERM, killing"
                );
                if let Err(err) = self.child.kill().await {
                    warn!(node = self.index, error = %err, "Failed to kill node");
                }
            }
        }
    }

    #[cfg(unix)]
    fn send_sigterm(&self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return;
        };
        // SAFETY: signalling a pid we own; failure is reported through errno only.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            warn!(
                node = self.index,
                error = %std::io::Error::last_os_error(),
                "Failed to send SIGTERM"
            );
        }
    }

    #[cfg(not(unix))]
    fn send_sigterm(&mut self) {
        if let Err(err) = self.child.start_kill() {
            warn!(node = self.index, error = %err, "Failed to stop node");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings() -> NodeSettings {
        NodeSettings {
            binary: PathBuf::from("/opt/node/avalanchego"),
            work_dir: PathBuf::from("/w"),
            ..NodeSettings::default()
        }
    }

    #[test]
    fn beacon_starts_without_bootstrap_peers() {
        let cluster = ClusterConfig::local();
        let spec = cluster.node_specs()[0];
        let args = node_args(&cluster, &settings(), &spec, None);

        assert!(args.contains(&"--network-id=local".to_string()));
        assert!(args.contains(&"--http-port=9650".to_string()));
        assert!(args.contains(&"--staking-port=9651".to_string()));
        assert!(args.contains(&"--bootstrap-ips=".to_string()));
        assert!(args.contains(&"--db-dir=/w/node1/db".to_string()));
        assert!(args.contains(&"--plugin-dir=/opt/node/plugins".to_string()));
        assert!(args.contains(&format!(
            "--whitelisted-subnets={}",
            cluster.whitelisted_subnet
        )));
        assert!(!args.iter().any(|arg| arg.starts_with("--staking-tls")));
    }

    #[test]
    fn followers_bootstrap_from_the_beacon() {
        let cluster = ClusterConfig::local();
        let spec = cluster.node_specs()[3];
        let beacon = Beacon {
            address: cluster.staking_address(0),
            node_id: NodeId::from_bytes([0; 20]),
        };
        let mut settings = settings();
        settings.staker_dir = Some(PathBuf::from("/keys"));

        let args = node_args(&cluster, &settings, &spec, Some(&beacon));

        assert!(args.contains(&"--http-port=9656".to_string()));
        assert!(args.contains(&"--bootstrap-ips=127.0.0.1:9651".to_string()));
        assert!(args.contains(&"--bootstrap-ids=NodeID-111111111111111111116DBWJs".to_string()));
        assert!(args.contains(&"--staking-tls-cert-file=/keys/staker4.crt".to_string()));
        assert!(args.contains(&"--staking-tls-key-file=/keys/staker4.key".to_string()));
    }

    #[tokio::test]
    async fn spawn_reports_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("node.log");

        let err = NodeProcess::spawn(2, &dir.path().join("missing"), &[], &log).unwrap_err();

        assert!(matches!(err, LaunchError::Spawn { index: 2, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_stops_a_running_process() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("node.log");
        let process = NodeProcess::spawn(
            0,
            Path::new("sleep"),
            &["30".to_string()],
            &log,
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(5), process.terminate(Duration::from_secs(2)))
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exited_describes_status() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("node.log");
        let mut process =
            NodeProcess::spawn(1, Path::new("false"), &[], &log).unwrap();

        let status = process.exited().await;

        assert!(status.contains('1'), "unexpected status: {status}");
    }
}
