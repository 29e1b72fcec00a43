//! Concurrency primitives shared by every task of a run.

pub mod cancel;
pub mod group;
pub mod readiness;
pub mod watcher;

pub use cancel::{CancelReason, CancelScope};
pub use group::TaskGroup;
pub use readiness::{readiness, NeverReady, ReadySignal, ReadyTrigger};
pub use watcher::watch_signals;
