//! Debug assertion macros for the cursor-protocol invariants documented in
//! spec §8. Active only under `debug_assertions`, so release builds pay
//! nothing for them — ported from the teacher crate's `invariants.rs`,
//! re-targeted from sequence-number invariants (`tail`/`head`) to the
//! modular byte-cursor invariants this arena actually has.

/// INV-1: every cursor stays in `[0, N)`.
///
/// Used in: [`crate::ring::RingBuffer::validate`] and after every cursor update.
macro_rules! debug_assert_cursor_in_bounds {
    ($name:literal, $cursor:expr, $capacity:expr) => {
        debug_assert!(
            $cursor < $capacity,
            "INV-1 violated: cursor {} = {} is not < capacity {}",
            $name,
            $cursor,
            $capacity
        )
    };
}

/// INV-3: `read_pos` never passes `commit_pos` (circular compare via the
/// available-bytes computation, which is what callers actually check).
///
/// Used in: [`crate::ring::RingBuffer::read`] after advancing `read_pos`.
macro_rules! debug_assert_read_not_past_commit {
    ($available:expr) => {
        debug_assert!(
            $available <= isize::MAX as usize,
            "INV-3 violated: available bytes computation underflowed"
        )
    };
}

/// INV-5: a frame that survives validation matches its claimed checksum.
///
/// Used in: [`crate::ring::RingBuffer::read`] right after the CRC compare.
macro_rules! debug_assert_checksum_verified {
    ($computed:expr, $claimed:expr) => {
        debug_assert_eq!(
            $computed, $claimed,
            "INV-5 violated: a frame was accepted with a mismatched checksum"
        )
    };
}

pub(crate) use debug_assert_checksum_verified;
pub(crate) use debug_assert_cursor_in_bounds;
pub(crate) use debug_assert_read_not_past_commit;
