//! Backpressure governor (C4): latches an advisory flag at a fill-ratio
//! threshold and gates new writes (spec §4.4).
//!
//! Grounded on the `backpressure`/`backpressure_threshold` fields and the
//! `ring_buffer_write` gate in the original source: compute utilization,
//! latch/clear the flag, and reject before any reservation is attempted.

use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct Backpressure {
    threshold: f64,
    latched: AtomicBool,
}

impl Backpressure {
    pub(crate) fn new(threshold: f64) -> Self {
        Self {
            threshold,
            latched: AtomicBool::new(false),
        }
    }

    /// Evaluates `used / capacity` against the threshold, latching or
    /// clearing the advisory flag, and returns whether the caller should be
    /// rejected with `Backpressure` (spec §4.4: "the real gating is the
    /// unconditional `Full` check" — this only decides the advisory signal
    /// and the early-reject fast path).
    pub(crate) fn check(&self, used: usize, capacity: usize) -> bool {
        let utilization = used as f64 / capacity as f64;
        let over = utilization >= self.threshold;
        self.latched.store(over, Ordering::Relaxed);
        over
    }

    pub(crate) fn is_active(&self) -> bool {
        self.latched.load(Ordering::Relaxed)
    }
}
