//! Operating-system termination signals.

use async_trait::async_trait;

use crate::port::signal::{Termination, TerminationSource};

/// SIGINT and SIGTERM from the OS.
///
/// Dropping this stops delivery to it, but tokio keeps its handlers installed
/// for the rest of the process: the default action of a later signal does not
/// come back. Teardown registers a fresh listener to catch a repeated Ctrl-C.
#[cfg(unix)]
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Register for SIGINT and SIGTERM.
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
#[async_trait]
impl TerminationSource for OsSignals {
    async fn recv(&mut self) -> Option<Termination> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|()| Termination::Interrupt),
            received = self.terminate.recv() => received.map(|()| Termination::Terminate),
        }
    }
}

/// Ctrl-C on platforms without unix signals.
#[cfg(not(unix))]
pub struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
#[async_trait]
impl TerminationSource for OsSignals {
    async fn recv(&mut self) -> Option<Termination> {
        tokio::signal::ctrl_c().await.ok().map(|()| Termination::Interrupt)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_sigterm() {
        let mut signals = OsSignals::register().unwrap();

        // SAFETY: signalling our own process, with a handler registered above.
        unsafe {
            libc::kill(libc::getpid(), libc::SIGTERM);
        }

        let received = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .unwrap();
        assert_eq!(received, Some(Termination::Terminate));
    }
}
