//! One-shot broadcast announcing that the network is ready.
//!
//! The trigger half is owned by the launcher. Firing flips the shared flag
//! from not-ready to ready exactly once and never blocks. Dropping the trigger
//! without firing closes the channel, which observers see as
//! [`NeverReady`]: the network failed to come up, as opposed to still
//! starting.

use thiserror::Error;
use tokio::sync::watch;

/// The trigger was dropped before it fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("network never became ready")]
pub struct NeverReady;

/// Write end of the readiness channel.
#[derive(Debug)]
pub struct ReadyTrigger {
    tx: watch::Sender<bool>,
}

/// Read end of the readiness channel. Clone freely.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked trigger/signal pair.
#[must_use]
pub fn readiness() -> (ReadyTrigger, ReadySignal) {
    let (tx, rx) = watch::channel(false);
    (ReadyTrigger { tx }, ReadySignal { rx })
}

impl ReadyTrigger {
    /// Announce readiness. Returns `true` only the first time.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                return false;
            }
            *ready = true;
            true
        })
    }

}

impl ReadySignal {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until ready, or until the trigger is dropped unfired.
    pub async fn wait(&mut self) -> Result<(), NeverReady> {
        self.rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| NeverReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_at_most_once() {
        let (trigger, signal) = readiness();
        assert!(!signal.is_ready());

        assert!(trigger.fire());
        assert!(!trigger.fire());
        assert!(!trigger.fire());

        assert!(signal.is_ready());
    }

    #[tokio::test]
    async fn every_observer_sees_the_event() {
        let (trigger, signal) = readiness();
        let observers: Vec<_> = (0..3)
            .map(|_| {
                let mut signal = signal.clone();
                tokio::spawn(async move { signal.wait().await })
            })
            .collect();

        trigger.fire();
        for observer in observers {
            let result = tokio::time::timeout(Duration::from_secs(1), observer)
                .await
                .expect("observer unblocked")
                .expect("join");
            assert_eq!(result, Ok(()));
        }
    }

    #[tokio::test]
    async fn fired_then_dropped_is_still_ready() {
        let (trigger, mut signal) = readiness();
        trigger.fire();
        drop(trigger);
        assert_eq!(signal.wait().await, Ok(()));
    }

    #[tokio::test]
    async fn dropped_unfired_reports_never_ready() {
        let (trigger, mut signal) = readiness();
        drop(trigger);
        assert_eq!(signal.wait().await, Err(NeverReady));
        assert!(!signal.is_ready());
    }

    #[test]
    fn wait_is_pending_until_fired() {
        let (trigger, mut signal) = readiness();
        let mut wait = tokio_test::task::spawn(signal.wait());

        tokio_test::assert_pending!(wait.poll());
        trigger.fire();
        assert!(wait.is_woken());
        tokio_test::assert_ready_eq!(wait.poll(), Ok(()));
    }

    #[tokio::test]
    async fn late_clone_sees_prior_fire() {
        let (trigger, signal) = readiness();
        trigger.fire();
        let mut late = signal.clone();
        assert_eq!(late.wait().await, Ok(()));
    }
}
