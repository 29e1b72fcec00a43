//! Custom VM subnets.

pub mod provisioner;

pub use provisioner::RpcSubnetProvisioner;
