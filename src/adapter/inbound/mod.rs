//! Inbound adapters: the command line and OS signals.

pub mod cli;
pub mod signal;
