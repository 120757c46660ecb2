//! Scoped timing for the registry's metrics.

use std::time::{Duration, Instant};

/// Adds the time between construction and drop to `slot`.
///
/// Early returns through `?` still record the elapsed time.
pub struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}
