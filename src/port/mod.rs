//! Trait definitions (hexagonal ports). Depend only on domain and runtime primitives.
//!
//! ```text
//!               ┌───────────────────────────────┐
//!               │          Orchestrator         │
//!               └───────────────────────────────┘
//!                   │           │           │
//!                   ▼           ▼           ▼
//!             ┌──────────┐ ┌──────────┐ ┌──────────┐
//!             │ Launcher │ │Provision │ │ Signals  │
//!             │ (nodes)  │ │  (RPC)   │ │   (OS)   │
//!             └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! - [`NetworkLauncher`] - starts and supervises the node cluster
//! - [`SubnetProvisioner`] - installs a custom VM subnet
//! - [`TerminationSource`] - delivers SIGINT/SIGTERM
//! - [`RunObserver`] - receives run lifecycle events

pub mod launcher;
pub mod observer;
pub mod provisioner;
pub mod signal;

pub use launcher::{LaunchRequest, NetworkLauncher};
pub use observer::{NullObserver, RunEvent, RunObserver, SubnetSummary};
pub use provisioner::SubnetProvisioner;
pub use signal::{Termination, TerminationSource};
