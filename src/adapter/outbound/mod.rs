//! Outbound adapters (driven side).

pub mod node;
pub mod rpc;
pub mod subnet;
