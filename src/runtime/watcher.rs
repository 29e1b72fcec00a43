//! Signal watcher task.

use std::sync::Arc;

use tracing::{debug, warn};

use super::cancel::{CancelReason, CancelScope};
use crate::error::Result;
use crate::port::observer::{RunEvent, RunObserver};
use crate::port::signal::TerminationSource;

/// Wait for a termination request or for the scope to be cancelled elsewhere.
///
/// A request cancels the scope exactly once. Either way the source is dropped
/// before returning, so no request is handled after the run has ended. This
/// task never fails.
pub async fn watch_signals<S>(
    scope: CancelScope,
    mut source: S,
    observer: Arc<dyn RunObserver>,
) -> Result<()>
where
    S: TerminationSource,
{
    let mut source_open = true;
    loop {
        tokio::select! {
            signal = source.recv(), if source_open => match signal {
                Some(signal) => {
                    warn!(%signal, "Signal received");
                    observer.notify(&RunEvent::SignalReceived(signal));
                    scope.cancel(CancelReason::Signal(signal));
                    break;
                }
                None => {
                    debug!("Signal source closed");
                    source_open = false;
                }
            },
            reason = scope.cancelled() => {
                debug!(%reason, "Scope cancelled, signal watcher exiting");
                break;
            }
        }
    }

    drop(source);
    Ok(())
}
