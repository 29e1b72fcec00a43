//! JSON-RPC access to a running node.

pub mod api;
pub mod client;

pub use api::{BlockchainStatus, Credentials, TxStatus, ValidatorWindow};
pub use client::JsonRpcClient;
