//! Typed wrappers over the node's `info`, `keystore` and `platform` APIs.

use serde::{Deserialize, Serialize};

use super::client::JsonRpcClient;
use crate::domain::id::{BlockchainId, NodeId, SubnetId, TxId, VmId};
use crate::error::RpcError;

const INFO: &str = "/ext/info";
const KEYSTORE: &str = "/ext/keystore";
const PLATFORM: &str = "/ext/bc/P";

/// Keystore user that owns the funded key.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Acceptance state of a platform transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum TxStatus {
    Committed,
    Processing,
    Dropped,
    Aborted,
    Unknown,
    #[serde(other)]
    Other,
}

impl TxStatus {
    /// The transaction can no longer be accepted.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Dropped | Self::Aborted)
    }
}

/// Validation state of a blockchain on this node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum BlockchainStatus {
    Validating,
    Created,
    Preferred,
    Syncing,
    Unknown,
    #[serde(other)]
    Other,
}

/// Validator window for `platform.addSubnetValidator`, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorWindow {
    pub start: i64,
    pub end: i64,
    pub weight: u64,
}

#[derive(Debug, Serialize)]
struct ChainParams<'a> {
    chain: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IsBootstrapped {
    is_bootstrapped: bool,
}

#[derive(Debug, Deserialize)]
struct NodeIdReply {
    #[serde(rename = "nodeID")]
    node_id: NodeId,
}

#[derive(Debug, Deserialize)]
struct SuccessReply {
    success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportKeyParams<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    private_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddressReply {
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubnetParams<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    control_keys: &'a [String],
    threshold: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddSubnetValidatorParams<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    #[serde(rename = "nodeID")]
    node_id: NodeId,
    #[serde(rename = "subnetID")]
    subnet_id: SubnetId,
    start_time: i64,
    end_time: i64,
    weight: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBlockchainParams<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    #[serde(rename = "subnetID")]
    subnet_id: SubnetId,
    #[serde(rename = "vmID")]
    vm_id: VmId,
    name: &'a str,
    genesis_data: &'a str,
    encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct TxReply {
    #[serde(rename = "txID")]
    tx_id: TxId,
}

#[derive(Debug, Serialize)]
struct TxStatusParams {
    #[serde(rename = "txID")]
    tx_id: TxId,
}

/// Older nodes answer `getTxStatus` with a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TxStatusReply {
    Object { status: TxStatus },
    Bare(TxStatus),
}

#[derive(Debug, Serialize)]
struct BlockchainStatusParams {
    #[serde(rename = "blockchainID")]
    blockchain_id: BlockchainId,
}

#[derive(Debug, Deserialize)]
struct BlockchainStatusReply {
    status: BlockchainStatus,
}

impl JsonRpcClient {
    /// `info.isBootstrapped` for one chain alias.
    pub async fn is_bootstrapped(&self, chain: &str) -> Result<bool, RpcError> {
        let reply: IsBootstrapped = self
            .call(INFO, "info.isBootstrapped", ChainParams { chain })
            .await?;
        Ok(reply.is_bootstrapped)
    }

    /// `info.getNodeID`.
    pub async fn node_id(&self) -> Result<NodeId, RpcError> {
        let reply: NodeIdReply = self
            .call(INFO, "info.getNodeID", serde_json::json!({}))
            .await?;
        Ok(reply.node_id)
    }

    /// `keystore.createUser`.
    pub async fn create_user(&self, credentials: &Credentials) -> Result<bool, RpcError> {
        let reply: SuccessReply = self
            .call(KEYSTORE, "keystore.createUser", credentials)
            .await?;
        Ok(reply.success)
    }

    /// `platform.importKey`. Returns the P-chain address of the key.
    pub async fn import_key(
        &self,
        credentials: &Credentials,
        private_key: &str,
    ) -> Result<String, RpcError> {
        let reply: AddressReply = self
            .call(
                PLATFORM,
                "platform.importKey",
                ImportKeyParams {
                    credentials,
                    private_key,
                },
            )
            .await?;
        Ok(reply.address)
    }

    /// `platform.createSubnet` with a 1-of-n control key set.
    pub async fn create_subnet(
        &self,
        credentials: &Credentials,
        control_keys: &[String],
    ) -> Result<TxId, RpcError> {
        let reply: TxReply = self
            .call(
                PLATFORM,
                "platform.createSubnet",
                CreateSubnetParams {
                    credentials,
                    control_keys,
                    threshold: 1,
                },
            )
            .await?;
        Ok(reply.tx_id)
    }

    /// `platform.addSubnetValidator`.
    pub async fn add_subnet_validator(
        &self,
        credentials: &Credentials,
        node_id: NodeId,
        subnet_id: SubnetId,
        window: ValidatorWindow,
    ) -> Result<TxId, RpcError> {
        let reply: TxReply = self
            .call(
                PLATFORM,
                "platform.addSubnetValidator",
                AddSubnetValidatorParams {
                    credentials,
                    node_id,
                    subnet_id,
                    start_time: window.start,
                    end_time: window.end,
                    weight: window.weight,
                },
            )
            .await?;
        Ok(reply.tx_id)
    }

    /// `platform.createBlockchain` with hex-encoded genesis bytes.
    pub async fn create_blockchain(
        &self,
        credentials: &Credentials,
        subnet_id: SubnetId,
        vm_id: VmId,
        name: &str,
        genesis_hex: &str,
    ) -> Result<TxId, RpcError> {
        let reply: TxReply = self
            .call(
                PLATFORM,
                "platform.createBlockchain",
                CreateBlockchainParams {
                    credentials,
                    subnet_id,
                    vm_id,
                    name,
                    genesis_data: genesis_hex,
                    encoding: "hex",
                },
            )
            .await?;
        Ok(reply.tx_id)
    }

    /// `platform.getTxStatus`.
    pub async fn tx_status(&self, tx_id: TxId) -> Result<TxStatus, RpcError> {
        let reply: TxStatusReply = self
            .call(PLATFORM, "platform.getTxStatus", TxStatusParams { tx_id })
            .await?;
        Ok(match reply {
            TxStatusReply::Object { status } | TxStatusReply::Bare(status) => status,
        })
    }

    /// `platform.getBlockchainStatus`.
    pub async fn blockchain_status(
        &self,
        blockchain_id: BlockchainId,
    ) -> Result<BlockchainStatus, RpcError> {
        let reply: BlockchainStatusReply = self
            .call(
                PLATFORM,
                "platform.getBlockchainStatus",
                BlockchainStatusParams { blockchain_id },
            )
            .await?;
        Ok(reply.status)
    }
}
