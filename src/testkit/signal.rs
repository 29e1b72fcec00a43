//! Channel-backed [`TerminationSource`] with an external control handle.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::port::signal::{Termination, TerminationSource};

/// Delivers whatever the paired sender pushes.
///
/// Dropping the source closes the channel, so a test can check
/// `sender.is_closed()` to confirm the watcher unregistered.
#[derive(Debug)]
pub struct ChannelSignals {
    rx: mpsc::Receiver<Termination>,
}

impl ChannelSignals {
    pub fn new() -> (mpsc::Sender<Termination>, Self) {
        let (tx, rx) = mpsc::channel(4);
        (tx, Self { rx })
    }
}

#[async_trait]
impl TerminationSource for ChannelSignals {
    async fn recv(&mut self) -> Option<Termination> {
        self.rx.recv().await
    }
}

/// A source that never delivers anything and never closes.
#[derive(Debug, Default)]
pub struct SilentSignals;

#[async_trait]
impl TerminationSource for SilentSignals {
    async fn recv(&mut self) -> Option<Termination> {
        std::future::pending().await
    }
}
