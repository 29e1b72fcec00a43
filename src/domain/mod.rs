//! Network-agnostic domain types: cluster shape, identifiers, VM descriptors.

pub mod cluster;
pub mod id;
pub mod vm;

pub use cluster::{ClusterConfig, NodeSpec};
pub use id::{BlockchainId, IdError, NodeId, SubnetId, TxId, VmId};
pub use vm::VmDescriptor;
