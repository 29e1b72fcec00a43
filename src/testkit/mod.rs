//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`launcher`] - [`ScriptedLauncher`](launcher::ScriptedLauncher), a
//!   [`NetworkLauncher`](crate::port::NetworkLauncher) that follows a script
//!   instead of spawning nodes.
//! - [`provisioner`] - [`ScriptedProvisioner`](provisioner::ScriptedProvisioner).
//! - [`signal`] - Channel-backed termination source.
//! - [`observer`] - Observer that records every run event.

pub mod launcher;
pub mod observer;
pub mod provisioner;
pub mod signal;

use std::sync::Arc;

use parking_lot::Mutex;

/// Ordered log of notable steps shared by scripted collaborators.
///
/// Lets a test assert cross-task ordering such as "provisioning started
/// after the launcher fired readiness".
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Arc<Mutex<Vec<&'static str>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: &'static str) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().iter().any(|e| *e == entry)
    }

    /// Position of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| *e == entry)
    }
}
