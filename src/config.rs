//! Tunables and compile-time constants for the ring arena.

/// Maximum payload size accepted by [`crate::RingBuffer::write`] (16 MiB).
pub const MAX_PAYLOAD: u32 = 16 * 1024 * 1024;

/// Fill ratio at which the backpressure governor latches (§4.4).
pub const BACKPRESSURE_THRESHOLD: f64 = 0.80;

/// Arena size used by [`RingConfig::default`] when the caller passes 0.
pub const DEFAULT_CAPACITY: usize = 64 * 1024 * 1024;

/// Sentinel stored in the arena descriptor; detects corruption/use-after-free.
pub(crate) const ARENA_MAGIC: u32 = 0x5247_4e41; // "ANGR" (Arena 'N' Guard)

/// Configuration for a [`crate::RingBuffer`].
///
/// Mirrors the teacher crate's `Config`: a `const fn` constructor with
/// assert-based bounds plus a couple of named presets.
#[derive(Debug, Clone, Copy)]
pub struct RingConfig {
    /// Requested arena size in bytes. Rounded up to the next power of two;
    /// 0 means [`DEFAULT_CAPACITY`].
    pub capacity: usize,
    /// Fill ratio (0.0..1.0) at which writes start returning `Backpressure`.
    pub backpressure_threshold: f64,
}

impl RingConfig {
    /// Creates a new configuration with custom settings.
    ///
    /// # Panics
    ///
    /// Panics if `backpressure_threshold` is not in `(0.0, 1.0]`.
    pub const fn new(capacity: usize, backpressure_threshold: f64) -> Self {
        assert!(
            backpressure_threshold > 0.0 && backpressure_threshold <= 1.0,
            "backpressure_threshold must be in (0.0, 1.0]"
        );
        Self {
            capacity,
            backpressure_threshold,
        }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backpressure_threshold: BACKPRESSURE_THRESHOLD,
        }
    }
}

/// 4 KiB arena, tight backpressure — favors low latency over throughput.
pub const LOW_LATENCY_CONFIG: RingConfig = RingConfig::new(4 * 1024, 0.70);

/// 256 MiB arena — favors sustained throughput over memory footprint.
pub const HIGH_THROUGHPUT_CONFIG: RingConfig = RingConfig::new(256 * 1024 * 1024, 0.80);

/// Rounds `n` up to the next power of two. `0` rounds to `1`.
#[must_use]
pub const fn next_power_of_two(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    let mut v = n - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    v + 1
}

/// Rounds `len` up to the next multiple of 8 (frame alignment, §3).
#[must_use]
#[inline]
pub const fn align8(len: usize) -> usize {
    (len + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_rounding() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(1023), 1024);
        assert_eq!(next_power_of_two(1024), 1024);
        assert_eq!(next_power_of_two(1025), 2048);
    }

    #[test]
    fn align8_rounds_up_to_multiple_of_eight() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(24), 24);
        assert_eq!(align8(25), 32);
    }
}
