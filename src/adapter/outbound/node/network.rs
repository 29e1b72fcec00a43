//! Local cluster of node processes.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{join_all, select_all};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::plugin::create_dir;
use super::process::{node_args, Beacon, NodeProcess};
use super::settings::NodeSettings;
use crate::adapter::inbound::signal::OsSignals;
use crate::adapter::outbound::rpc::JsonRpcClient;
use crate::domain::cluster::{ClusterConfig, NodeSpec};
use crate::domain::id::NodeId;
use crate::error::{Error, LaunchError, Result};
use crate::port::launcher::{LaunchRequest, NetworkLauncher};
use crate::port::signal::TerminationSource;
use crate::runtime::cancel::CancelScope;

/// Runs the cluster as child processes of this one.
///
/// Node 0 starts first as the beacon. Once it answers `info.getNodeID` the
/// remaining nodes start and bootstrap from it. Readiness fires when every
/// node reports every chain bootstrapped.
pub struct LocalNetwork {
    cluster: ClusterConfig,
    settings: NodeSettings,
}

impl LocalNetwork {
    #[must_use]
    pub fn new(cluster: ClusterConfig, settings: NodeSettings) -> Self {
        Self { cluster, settings }
    }

    async fn prepare(&self) -> Result<()> {
        let mode = self.cluster.file_mode;
        let mut dirs = vec![self.settings.work_dir.clone(), self.settings.plugin_dir()];
        for spec in self.cluster.node_specs() {
            let node_dir = self.settings.node_dir(spec.index);
            dirs.push(node_dir.join("db"));
            dirs.push(node_dir.join("logs"));
        }

        for dir in dirs {
            create_dir(&dir, mode)
                .await
                .map_err(|source| LaunchError::Prepare { path: dir, source })?;
        }
        Ok(())
    }

    fn clients(&self) -> Result<Vec<JsonRpcClient>> {
        (0..self.cluster.node_count)
            .map(|index| {
                JsonRpcClient::new(&self.cluster.http_endpoint(index), self.cluster.http_timeout)
                    .map_err(Error::from)
            })
            .collect()
    }

    fn spawn_node(&self, spec: &NodeSpec, beacon: Option<&Beacon>) -> Result<NodeProcess> {
        let args = node_args(&self.cluster, &self.settings, spec, beacon);
        let log_path = self.settings.node_dir(spec.index).join("node.log");
        debug!(node = spec.index, ?args, "Spawning node");
        Ok(NodeProcess::spawn(
            spec.index,
            &self.settings.binary,
            &args,
            &log_path,
        )?)
    }

    /// Start every node, wait for bootstrap, fire readiness, supervise.
    async fn run(
        &self,
        request: LaunchRequest,
        nodes: &mut Vec<NodeProcess>,
    ) -> Result<()> {
        let LaunchRequest {
            scope,
            vm_id: _,
            ready,
        } = request;
        let clients = self.clients()?;
        let specs = self.cluster.node_specs();
        let (beacon_spec, followers) = specs.split_first().ok_or(LaunchError::EmptyCluster)?;

        nodes.push(self.spawn_node(beacon_spec, None)?);
        let beacon = Beacon {
            address: self.cluster.staking_address(beacon_spec.index),
            node_id: guarded(&scope, nodes, self.beacon_id(&clients[0])).await?,
        };
        info!(node_id = %beacon.node_id, "Beacon node up");

        for spec in followers {
            nodes.push(self.spawn_node(spec, Some(&beacon))?);
        }

        guarded(&scope, nodes, self.await_bootstrap(&clients)).await?;

        if ready.fire() {
            info!(
                nodes = nodes.len(),
                chains = ?self.cluster.chains,
                "All nodes bootstrapped"
            );
        }

        tokio::select! {
            reason = scope.cancelled() => {
                debug!(%reason, "Stopping network");
                Ok(())
            }
            (index, status) = first_exit(nodes) => {
                Err(LaunchError::NodeExited { index, status }.into())
            }
        }
    }

    /// Poll the beacon until it reports its node id.
    async fn beacon_id(&self, client: &JsonRpcClient) -> Result<NodeId> {
        let deadline = Instant::now() + self.cluster.bootstrap_timeout;
        loop {
            match client.node_id().await {
                Ok(node_id) => return Ok(node_id),
                Err(source) if Instant::now() >= deadline => {
                    return Err(LaunchError::Unreachable { index: 0, source }.into());
                }
                Err(err) => debug!(error = %err, "Beacon not answering yet"),
            }
            sleep(self.cluster.poll_interval).await;
        }
    }

    /// Poll `info.isBootstrapped` for every chain on every node.
    async fn await_bootstrap(&self, clients: &[JsonRpcClient]) -> Result<()> {
        let deadline = Instant::now() + self.cluster.bootstrap_timeout;
        loop {
            let pending = self.pending_chains(clients).await;
            if pending == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(LaunchError::BootstrapTimeout {
                    secs: self.cluster.bootstrap_timeout.as_secs(),
                    pending,
                }
                .into());
            }
            debug!(pending, "Waiting for bootstrap");
            sleep(self.cluster.poll_interval).await;
        }
    }

    async fn pending_chains(&self, clients: &[JsonRpcClient]) -> usize {
        let checks = clients.iter().enumerate().flat_map(|(index, client)| {
            self.cluster
                .chains
                .iter()
                .map(move |chain| check_chain(index, client, chain))
        });

        join_all(checks).await.into_iter().filter(|done| !done).count()
    }
}

async fn check_chain(index: usize, client: &JsonRpcClient, chain: &str) -> bool {
    match client.is_bootstrapped(chain).await {
        Ok(done) => done,
        Err(err) => {
            debug!(node = index, chain, error = %err, "Bootstrap poll failed");
            false
        }
    }
}

/// Run `work` until it finishes, the scope is cancelled, or a node exits.
async fn guarded<T>(
    scope: &CancelScope,
    nodes: &mut [NodeProcess],
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        result = work => result,
        reason = scope.cancelled() => Err(Error::Cancelled(reason)),
        (index, status) = first_exit(nodes) => {
            Err(LaunchError::NodeExited { index, status }.into())
        }
    }
}

/// Index and exit status of the first node to exit. Pending while none has.
async fn first_exit(nodes: &mut [NodeProcess]) -> (usize, String) {
    if nodes.is_empty() {
        return std::future::pending().await;
    }
    let exits = nodes.iter_mut().map(|node| {
        Box::pin(async move {
            let status = node.exited().await;
            (node.index(), status)
        })
    });
    let (exited, _, _) = select_all(exits).await;
    exited
}

/// Stop every node, newest first. If `force` resolves before the grace period
/// is over, the remaining nodes are dropped, which kills them.
async fn teardown(nodes: Vec<NodeProcess>, grace: Duration, force: impl Future<Output = ()>) {
    if nodes.is_empty() {
        return;
    }
    info!(nodes = nodes.len(), "Tearing down network");
    let graceful = join_all(nodes.into_iter().rev().map(|node| node.terminate(grace)));

    tokio::select! {
        _ = graceful => {}
        () = force => warn!("Teardown interrupted, killing remaining nodes"),
    }
}

/// Resolve on the next SIGINT or SIGTERM delivered after the first poll.
///
/// The watcher's handlers stay installed for the life of the process, so a
/// repeated Ctrl-C would otherwise be swallowed while nodes shut down.
async fn next_signal() {
    match OsSignals::register() {
        Ok(mut signals) => {
            if let Some(signal) = signals.recv().await {
                warn!(%signal, "Signal received during teardown");
                return;
            }
        }
        Err(err) => warn!(error = %err, "Cannot watch for signals during teardown"),
    }
    std::future::pending().await
}

#[async_trait]
impl NetworkLauncher for LocalNetwork {
    async fn start_network(&self, request: LaunchRequest) -> Result<()> {
        if let Some(vm_id) = request.vm_id {
            info!(%vm_id, "Nodes will load custom VM");
        }
        self.prepare().await?;

        let mut nodes = Vec::with_capacity(self.cluster.node_count);
        let result = self.run(request, &mut nodes).await;

        if let Err(err) = &result {
            if !err.is_cancelled() {
                warn!(error = %err, "Network failed");
            }
        }
        teardown(nodes, self.settings.shutdown_grace(), next_signal()).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cancel::CancelReason;
    use crate::runtime::readiness::readiness;
    use std::path::PathBuf;

    fn network(dir: &std::path::Path, binary: &str) -> LocalNetwork {
        let mut cluster = ClusterConfig::local();
        cluster.base_http_port = 1;
        cluster.poll_interval = Duration::from_millis(10);
        cluster.bootstrap_timeout = Duration::from_millis(200);
        cluster.http_timeout = Duration::from_millis(100);
        let settings = NodeSettings {
            binary: PathBuf::from(binary),
            work_dir: dir.join("work"),
            plugin_dir: Some(dir.join("plugins")),
            shutdown_grace_secs: 1,
            ..NodeSettings::default()
        };
        LocalNetwork::new(cluster, settings)
    }

    #[tokio::test]
    async fn prepare_creates_node_directories() {
        let dir = tempfile::tempdir().unwrap();
        let network = network(dir.path(), "avalanchego");

        network.prepare().await.unwrap();

        for n in 1..=5 {
            let node = dir.path().join("work").join(format!("node{n}"));
            assert!(node.join("db").is_dir());
            assert!(node.join("logs").is_dir());
        }
        assert!(dir.path().join("plugins").is_dir());
    }

    #[tokio::test]
    async fn missing_binary_fails_without_firing_ready() {
        let dir = tempfile::tempdir().unwrap();
        let network = network(dir.path(), "/nonexistent/ledgersim-node");
        let (trigger, signal) = readiness();

        let err = network
            .start_network(LaunchRequest {
                scope: CancelScope::new(),
                vm_id: None,
                ready: trigger,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Launch(LaunchError::Spawn { index: 0, .. })));
        assert!(!signal.is_ready());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn early_exit_of_the_beacon_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // `false` ignores its flags and exits 1 at once.
        let network = network(dir.path(), "false");
        let (trigger, signal) = readiness();

        let err = network
            .start_network(LaunchRequest {
                scope: CancelScope::new(),
                vm_id: None,
                ready: trigger,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                Error::Launch(LaunchError::NodeExited { index: 0, .. })
                    | Error::Launch(LaunchError::Unreachable { index: 0, .. })
            ),
            "unexpected error: {err}"
        );
        assert!(!signal.is_ready());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_before_bootstrap_tears_down() {
        let dir = tempfile::tempdir().unwrap();
        // `sleep` rejects the node flags; use a shell that outlives the test instead.
        let script = dir.path().join("node.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let mut network = network(dir.path(), "unused");
        network.settings.binary = script;
        network.cluster.bootstrap_timeout = Duration::from_secs(30);

        let scope = CancelScope::new();
        let (trigger, signal) = readiness();
        let canceller = scope.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            canceller.cancel(CancelReason::NetworkStopped);
        });

        let err = tokio::time::timeout(
            Duration::from_secs(10),
            network.start_network(LaunchRequest {
                scope,
                vm_id: None,
                ready: trigger,
            }),
        )
        .await
        .unwrap()
        .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!signal.is_ready());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forced_teardown_skips_the_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        // Ignores SIGTERM, so only a kill stops it.
        let script = dir.path().join("stubborn.sh");
        std::fs::write(&script, "#!/bin/sh\ntrap '' TERM\nexec sleep 60\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let node = NodeProcess::spawn(0, &script, &[], &dir.path().join("node.log")).unwrap();

        let (force_tx, force_rx) = tokio::sync::oneshot::channel::<()>();
        let force = async {
            let _ = force_rx.await;
        };
        let second_signal = async {
            sleep(Duration::from_millis(100)).await;
            force_tx.send(()).unwrap();
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(teardown(vec![node], Duration::from_secs(30), force), second_signal)
        })
        .await
        .expect("teardown stopped waiting for the grace period");
    }
}
