//! ledgersim - an ephemeral five-node local ledger network for integration tests.
//!
//! The binary starts a fixed cluster of node processes on the loopback
//! interface, announces once every node has bootstrapped every primary chain,
//! and, when a custom VM is supplied, provisions a subnet running it. Any task
//! failure or a SIGINT/SIGTERM tears the whole run down.
//!
//! # Modules
//!
//! - [`domain`] - cluster shape, CB58 identifiers, VM descriptors
//! - [`runtime`] - cancel scope, readiness channel, task group, signal watcher
//! - [`port`] - launcher, provisioner, signal and observer traits
//! - [`application`] - the orchestrator tying a run together
//! - [`adapter`] - CLI, OS signals, node processes, JSON-RPC
//! - [`infrastructure`] - settings and logging
//! - [`error`] - error types for the crate

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
pub mod runtime;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
