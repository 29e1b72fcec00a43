//! Application services (use cases).

pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunOutcome, EXIT_INTERRUPTED};
