use log::{log_enabled, Level};
use std::time::Instant;

/// Scoped timer for profiling the per-frame phases.
///
/// Logs the elapsed time at `trace` level when dropped; disabled log levels
/// cost one branch and a clock read.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("{} took {} µs", self.label, elapsed.as_micros());
        }
    }
}
