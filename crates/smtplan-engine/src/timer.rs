//! Stage timing for diagnostics.
//!
//! Readings feed log lines and the search report only; nothing in the
//! search branches on them.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
    started: Instant,
    last: Instant,
}

impl Timer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
        }
    }

    /// Seconds since the previous call (or since `start`), then resets the
    /// reference point.
    pub fn elapsed_since_last(&mut self) -> f64 {
        let now = Instant::now();
        let secs = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        secs
    }

    /// Seconds since `start`.
    pub fn total_elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
