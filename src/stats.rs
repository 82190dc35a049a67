//! Stats (C6): the seven atomic counters and their read-only snapshot API.
//!
//! Grounded on `ring_buffer_stats_t` / `ring_buffer_get_stats` in the
//! original source, with the teacher's `Metrics`/`MetricsSnapshot` split
//! (an internal atomics-holding type plus a plain `Copy` snapshot struct)
//! adopted for the same reason the teacher adopted it: a snapshot you can
//! hand to a caller without exposing the atomics themselves.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal atomic counters, updated with relaxed ordering (spec §4.6:
/// "counters need no ordering with data").
#[derive(Debug, Default)]
pub(crate) struct Stats {
    messages_written: AtomicU64,
    messages_read: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    write_errors: AtomicU64,
    read_errors: AtomicU64,
    backpressure_events: AtomicU64,
}

impl Stats {
    pub(crate) fn record_write(&self, bytes: u64) {
        self.messages_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.messages_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backpressure_event(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Produces a snapshot by independent loads. Not an atomic instant (spec
    /// §4.6), but `messages_written`/`bytes_written` are loaded before their
    /// `_read` counterparts, per `SPEC_FULL.md`'s ordering discipline, so a
    /// quiescent snapshot never shows `read > written`.
    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let messages_written = self.messages_written.load(Ordering::Relaxed);
        let bytes_written = self.bytes_written.load(Ordering::Relaxed);
        let messages_read = self.messages_read.load(Ordering::Relaxed);
        let bytes_read = self.bytes_read.load(Ordering::Relaxed);
        StatsSnapshot {
            messages_written,
            messages_read,
            bytes_written,
            bytes_read,
            write_errors: self.write_errors.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.messages_written.store(0, Ordering::Relaxed);
        self.messages_read.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.bytes_read.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.read_errors.store(0, Ordering::Relaxed);
        self.backpressure_events.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time, read-only copy of a ring buffer's counters (spec §6
/// `get_stats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub messages_written: u64,
    pub messages_read: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub write_errors: u64,
    pub read_errors: u64,
    pub backpressure_events: u64,
}
