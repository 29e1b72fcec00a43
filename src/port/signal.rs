//! Source of external termination requests.

use std::fmt;

use async_trait::async_trait;

/// An operating-system request to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGINT (ctrl-c).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Something that delivers termination requests.
///
/// Dropping the source unregisters interest in further requests.
#[async_trait]
pub trait TerminationSource: Send {
    /// Wait for the next request. `None` means no more requests can arrive.
    async fn recv(&mut self) -> Option<Termination>;
}
