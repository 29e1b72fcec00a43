//! Subnet provisioning over the platform JSON-RPC API.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::adapter::outbound::rpc::{
    BlockchainStatus, Credentials, JsonRpcClient, TxStatus, ValidatorWindow,
};
use crate::domain::cluster::ClusterConfig;
use crate::domain::id::{BlockchainId, SubnetId, TxId, VmId};
use crate::error::{Error, LaunchError, ProvisionError, Result, RpcError};
use crate::port::observer::SubnetSummary;
use crate::port::provisioner::SubnetProvisioner;
use crate::runtime::cancel::CancelScope;

/// Pre-funded key of the local network genesis.
pub const FUNDED_KEY: &str = "PrivateKey-ewoqjP7PxY4yr3iLTpLisriqt94hdyDFNgchSxGGztUrTXtNN";

const USERNAME: &str = "ledgersim";
const PASSWORD: &str = "ledgersim-Local-Pa55word";
const TX_TIMEOUT: Duration = Duration::from_secs(60);
const VALIDATOR_START_DELAY: i64 = 30;
const VALIDATOR_PERIOD_DAYS: i64 = 30;
const VALIDATOR_WEIGHT: u64 = 1000;

/// Validator window starting shortly after `now`.
#[must_use]
pub fn validator_window(now: DateTime<Utc>) -> ValidatorWindow {
    let start = now + chrono::Duration::seconds(VALIDATOR_START_DELAY);
    let end = start + chrono::Duration::days(VALIDATOR_PERIOD_DAYS);
    ValidatorWindow {
        start: start.timestamp(),
        end: end.timestamp(),
        weight: VALIDATOR_WEIGHT,
    }
}

/// Installs a VM on a fresh subnet through node 0 of the cluster.
pub struct RpcSubnetProvisioner {
    cluster: ClusterConfig,
    clients: Vec<JsonRpcClient>,
    credentials: Credentials,
    tx_timeout: Duration,
}

impl RpcSubnetProvisioner {
    pub fn new(cluster: ClusterConfig) -> Result<Self> {
        let clients = (0..cluster.node_count)
            .map(|index| JsonRpcClient::new(&cluster.http_endpoint(index), cluster.http_timeout))
            .collect::<std::result::Result<Vec<_>, RpcError>>()?;

        Ok(Self {
            cluster,
            clients,
            credentials: Credentials {
                username: USERNAME.into(),
                password: PASSWORD.into(),
            },
            tx_timeout: TX_TIMEOUT,
        })
    }

    /// Bound on each wait for a transaction or chain status.
    #[must_use]
    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = timeout;
        self
    }

    fn primary(&self) -> Result<&JsonRpcClient> {
        self.clients
            .first()
            .ok_or_else(|| Error::from(LaunchError::EmptyCluster))
    }

    /// Poll until `tx_id` is committed.
    async fn await_committed(
        &self,
        scope: &CancelScope,
        step: &'static str,
        tx_id: TxId,
    ) -> Result<()> {
        let client = self.primary()?;
        let deadline = Instant::now() + self.tx_timeout;

        loop {
            match run_step(scope, step, client.tx_status(tx_id)).await {
                Ok(TxStatus::Committed) => {
                    debug!(step, %tx_id, "Transaction committed");
                    return Ok(());
                }
                Ok(status) if status.is_rejected() => {
                    return Err(ProvisionError::TxRejected {
                        step,
                        tx_id: tx_id.to_string(),
                        status: format!("{status:?}"),
                    }
                    .into());
                }
                Ok(status) => debug!(step, %tx_id, ?status, "Transaction pending"),
                Err(err @ Error::Cancelled(_)) => return Err(err),
                Err(err) => debug!(step, %tx_id, error = %err, "Status poll failed"),
            }
            self.pause(scope, step, deadline).await?;
        }
    }

    /// Poll every node until it validates `blockchain_id`.
    async fn await_validating(&self, scope: &CancelScope, blockchain_id: BlockchainId) -> Result<()> {
        const STEP: &str = "await blockchain";
        let deadline = Instant::now() + self.tx_timeout;

        for (index, client) in self.clients.iter().enumerate() {
            loop {
                match run_step(scope, STEP, client.blockchain_status(blockchain_id)).await {
                    Ok(BlockchainStatus::Validating) => break,
                    Ok(status) => debug!(node = index, ?status, "Blockchain not validating yet"),
                    Err(err @ Error::Cancelled(_)) => return Err(err),
                    Err(err) => debug!(node = index, error = %err, "Status poll failed"),
                }
                self.pause(scope, STEP, deadline).await?;
            }
        }
        Ok(())
    }

    async fn pause(&self, scope: &CancelScope, step: &'static str, deadline: Instant) -> Result<()> {
        if Instant::now() >= deadline {
            return Err(ProvisionError::Timeout {
                step,
                secs: self.tx_timeout.as_secs(),
            }
            .into());
        }
        tokio::select! {
            () = sleep(self.cluster.poll_interval) => Ok(()),
            reason = scope.cancelled() => Err(Error::Cancelled(reason)),
        }
    }
}

/// Run one RPC step, aborting on cancellation.
async fn run_step<T>(
    scope: &CancelScope,
    step: &'static str,
    call: impl Future<Output = std::result::Result<T, RpcError>>,
) -> Result<T> {
    if let Some(reason) = scope.reason() {
        return Err(Error::Cancelled(reason));
    }
    tokio::select! {
        result = call => result.map_err(|source| Error::from(ProvisionError::Step { step, source })),
        reason = scope.cancelled() => Err(Error::Cancelled(reason)),
    }
}

#[async_trait]
impl SubnetProvisioner for RpcSubnetProvisioner {
    async fn setup_subnet(
        &self,
        scope: &CancelScope,
        vm_id: VmId,
        genesis_path: &Path,
    ) -> Result<SubnetSummary> {
        let genesis = tokio::fs::read(genesis_path)
            .await
            .map_err(|source| ProvisionError::Genesis {
                path: genesis_path.to_path_buf(),
                source,
            })?;
        let genesis_hex = format!("0x{}", hex::encode(&genesis));
        let client = self.primary()?;
        let creds = &self.credentials;

        run_step(scope, "create user", client.create_user(creds)).await?;
        let address = run_step(scope, "import key", client.import_key(creds, FUNDED_KEY)).await?;
        debug!(%address, "Funded key imported");

        let tx_id = run_step(
            scope,
            "create subnet",
            client.create_subnet(creds, std::slice::from_ref(&address)),
        )
        .await?;
        self.await_committed(scope, "create subnet", tx_id).await?;
        let subnet_id = SubnetId::from(tx_id);
        // Nodes only validate the subnet they were started with.
        if self.cluster.whitelisted_subnet_id() != Some(subnet_id) {
            return Err(ProvisionError::SubnetMismatch {
                expected: self.cluster.whitelisted_subnet.clone(),
                actual: subnet_id.to_string(),
            }
            .into());
        }
        info!(%subnet_id, "Subnet created");

        for (index, node) in self.clients.iter().enumerate() {
            let node_id = run_step(scope, "get node id", node.node_id()).await?;
            let window = validator_window(Utc::now());
            let tx_id = run_step(
                scope,
                "add subnet validator",
                client.add_subnet_validator(creds, node_id, subnet_id, window),
            )
            .await?;
            self.await_committed(scope, "add subnet validator", tx_id).await?;
            info!(node = index, %node_id, "Validator added");
        }

        let tx_id = run_step(
            scope,
            "create blockchain",
            client.create_blockchain(creds, subnet_id, vm_id, &self.cluster.vm_name, &genesis_hex),
        )
        .await?;
        self.await_committed(scope, "create blockchain", tx_id).await?;
        let blockchain_id = BlockchainId::from(tx_id);
        info!(%blockchain_id, %vm_id, "Blockchain created");

        self.await_validating(scope, blockchain_id).await?;

        Ok(SubnetSummary {
            subnet_id,
            blockchain_id,
            rpc_url: format!(
                "{}/ext/bc/{blockchain_id}/rpc",
                self.cluster.http_endpoint(0)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::signal::Termination;
    use crate::runtime::cancel::CancelReason;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TX: &str = "29uVeLPJB1eQJkzRemU8g8wZDw5uJRqpab5U2mX9euieVwiEbL";

    type Calls = Arc<Mutex<Vec<(String, Value)>>>;

    /// Minimal HTTP JSON-RPC node answering with `reply(method, params)`.
    async fn fake_node(reply: fn(&str, &Value) -> Value) -> (u16, Calls) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let calls: Calls = Arc::default();
        let seen = Arc::clone(&calls);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    let body = loop {
                        let n = socket.read(&mut chunk).await.unwrap();
                        if n == 0 {
                            return;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        let text = String::from_utf8_lossy(&buf).to_string();
                        let Some(split) = text.find("\r\n\r\n") else {
                            continue;
                        };
                        let length = text[..split]
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())?
                            })
                            .unwrap_or(0);
                        if buf.len() >= split + 4 + length {
                            break buf[split + 4..split + 4 + length].to_vec();
                        }
                    };

                    let request: Value = serde_json::from_slice(&body).unwrap();
                    let method = request["method"].as_str().unwrap().to_string();
                    let params = request["params"].clone();
                    let result = reply(&method, &params);
                    seen.lock().push((method, params));

                    let payload = json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
                        .to_string();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        payload.len(),
                        payload
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                });
            }
        });

        (port, calls)
    }

    fn healthy(method: &str, _params: &Value) -> Value {
        match method {
            "keystore.createUser" => json!({"success": true}),
            "platform.importKey" => json!({"address": "P-local18jma8ppw3nhx5r4ap8clazz0dps7rv5u00z96u"}),
            "info.getNodeID" => json!({"nodeID": "NodeID-111111111111111111116DBWJs"}),
            "platform.getTxStatus" => json!({"status": "Committed"}),
            "platform.getBlockchainStatus" => json!({"status": "Validating"}),
            _ => json!({"txID": TX}),
        }
    }

    fn dropped(method: &str, params: &Value) -> Value {
        match method {
            "platform.getTxStatus" => json!({"status": "Dropped"}),
            _ => healthy(method, params),
        }
    }

    fn foreign_subnet(method: &str, params: &Value) -> Value {
        match method {
            "platform.createSubnet" => {
                json!({"txID": "tGas3T58KzdjLHhBDMnH2TvrddhqTji5iZAMZ3RXs2NLpSnhH"})
            }
            _ => healthy(method, params),
        }
    }

    fn processing(method: &str, params: &Value) -> Value {
        match method {
            "platform.getTxStatus" => json!({"status": "Processing"}),
            _ => healthy(method, params),
        }
    }

    fn called(calls: &Calls, method: &str) -> bool {
        calls.lock().iter().any(|(seen, _)| seen == method)
    }

    fn single_node(port: u16) -> ClusterConfig {
        let mut cluster = ClusterConfig::local();
        cluster.node_count = 1;
        cluster.base_http_port = port;
        cluster.poll_interval = Duration::from_millis(10);
        cluster.http_timeout = Duration::from_secs(2);
        cluster
    }

    fn genesis() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"{}").unwrap();
        file
    }

    #[test]
    fn validator_window_starts_in_the_future() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let window = validator_window(now);

        assert_eq!(window.start, now.timestamp() + 30);
        assert_eq!(window.end - window.start, 30 * 24 * 3600);
        assert_eq!(window.weight, 1000);
    }

    #[tokio::test]
    async fn provisions_subnet_in_order() {
        let (port, calls) = fake_node(healthy).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();
        let genesis = genesis();
        let vm_id = VmId::from_bytes([7; 32]);

        let summary = provisioner
            .setup_subnet(&CancelScope::new(), vm_id, genesis.path())
            .await
            .unwrap();

        let methods: Vec<String> = calls
            .lock()
            .iter()
            .map(|(method, _)| method.clone())
            .filter(|method| !method.ends_with("Status"))
            .collect();
        assert_eq!(
            methods,
            vec![
                "keystore.createUser",
                "platform.importKey",
                "platform.createSubnet",
                "info.getNodeID",
                "platform.addSubnetValidator",
                "platform.createBlockchain",
            ]
        );

        let create = calls
            .lock()
            .iter()
            .find(|(method, _)| method == "platform.createBlockchain")
            .map(|(_, params)| params.clone())
            .unwrap();
        assert_eq!(create["name"], "kewl vm");
        assert_eq!(create["genesisData"], "0x7b7d");
        assert_eq!(create["vmID"], vm_id.to_string());
        assert_eq!(create["subnetID"], TX);

        assert_eq!(summary.subnet_id.to_string(), TX);
        assert_eq!(
            summary.rpc_url,
            format!("http://127.0.0.1:{port}/ext/bc/{TX}/rpc")
        );
    }

    #[tokio::test]
    async fn dropped_transaction_fails_the_sequence() {
        let (port, calls) = fake_node(dropped).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();
        let genesis = genesis();

        let err = provisioner
            .setup_subnet(&CancelScope::new(), VmId::from_bytes([7; 32]), genesis.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Provision(ProvisionError::TxRejected {
                step: "create subnet",
                ..
            })
        ));
        assert!(!calls
            .lock()
            .iter()
            .any(|(method, _)| method == "platform.createBlockchain"));
    }

    #[tokio::test]
    async fn missing_genesis_fails_before_any_call() {
        let (port, calls) = fake_node(healthy).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();

        let err = provisioner
            .setup_subnet(
                &CancelScope::new(),
                VmId::from_bytes([7; 32]),
                Path::new("/nonexistent/genesis.json"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provision(ProvisionError::Genesis { .. })));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn cancelled_scope_aborts_before_first_step() {
        let (port, calls) = fake_node(healthy).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();
        let genesis = genesis();
        let scope = CancelScope::new();
        scope.cancel(CancelReason::NetworkStopped);

        let err = provisioner
            .setup_subnet(&scope, VmId::from_bytes([7; 32]), genesis.path())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn unreachable_node_is_a_step_error() {
        let provisioner = RpcSubnetProvisioner::new(single_node(1)).unwrap();
        let genesis = genesis();

        let err = provisioner
            .setup_subnet(&CancelScope::new(), VmId::from_bytes([7; 32]), genesis.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Provision(ProvisionError::Step {
                step: "create user",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn subnet_outside_the_whitelist_stops_the_sequence() {
        let (port, calls) = fake_node(foreign_subnet).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();
        let genesis = genesis();

        let err = provisioner
            .setup_subnet(&CancelScope::new(), VmId::from_bytes([7; 32]), genesis.path())
            .await
            .unwrap_err();

        match err {
            Error::Provision(ProvisionError::SubnetMismatch { expected, actual }) => {
                assert_eq!(expected, TX);
                assert_eq!(actual, "tGas3T58KzdjLHhBDMnH2TvrddhqTji5iZAMZ3RXs2NLpSnhH");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!called(&calls, "platform.addSubnetValidator"));
        assert!(!called(&calls, "platform.createBlockchain"));
    }

    #[tokio::test]
    async fn cancel_while_awaiting_commit_aborts_remaining_steps() {
        let (port, calls) = fake_node(processing).await;
        let provisioner = RpcSubnetProvisioner::new(single_node(port)).unwrap();
        let genesis = genesis();
        let scope = CancelScope::new();

        let run = provisioner.setup_subnet(&scope, VmId::from_bytes([7; 32]), genesis.path());
        let interrupt = async {
            while !called(&calls, "platform.getTxStatus") {
                sleep(Duration::from_millis(5)).await;
            }
            scope.cancel(CancelReason::Signal(Termination::Interrupt));
        };
        let (result, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(run, interrupt)
        })
        .await
        .expect("provisioner stopped polling");

        assert!(matches!(
            result,
            Err(Error::Cancelled(CancelReason::Signal(Termination::Interrupt)))
        ));
        assert!(called(&calls, "platform.createSubnet"));
        assert!(!called(&calls, "platform.addSubnetValidator"));
        assert!(!called(&calls, "platform.createBlockchain"));
    }
}
