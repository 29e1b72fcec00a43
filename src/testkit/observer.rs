//! Observer that keeps every event for later assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::port::observer::{RunEvent, RunObserver};

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| matches(e)).count()
    }
}

impl RunObserver for RecordingObserver {
    fn notify(&self, event: &RunEvent) {
        self.events.lock().push(event.clone());
    }
}
