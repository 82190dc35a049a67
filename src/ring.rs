//! Cursor protocol (C3): the reserve/commit/read machinery that is the
//! design pivot of this crate (spec §4.2–§4.3).
//!
//! Grounded on the teacher crate's `ring.rs` fast-path structure (cached
//! sequence numbers are dropped — this arena's cursors are bounded mod `N`,
//! not unbounded `u64` sequence numbers, per spec §3), the CAS-loop
//! reservation and wrap handling in `ring_buffer_write`/`ring_buffer_read`
//! from the original source, and the commit-ordering fix spec §9 asks for:
//! each producer spins on `commit_pos == its own reservation's origin`
//! before publishing, so visibility is serialized in reservation order
//! without serializing reservation itself.

use std::sync::atomic::{fence, AtomicU32, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::arena::Arena;
use crate::backoff::Backoff;
use crate::backpressure::Backpressure;
use crate::clock::timestamp_ns;
use crate::config::{align8, next_power_of_two, RingConfig, ARENA_MAGIC, DEFAULT_CAPACITY, MAX_PAYLOAD};
use crate::crc32::crc32;
use crate::error::RingError;
use crate::frame::{Frame, FrameHeader, FRAME_MAGIC, HEADER_SIZE, SKIP_MAGIC};
use crate::invariants::{
    debug_assert_checksum_verified, debug_assert_cursor_in_bounds, debug_assert_read_not_past_commit,
};
use crate::stats::{Stats, StatsSnapshot};

/// The bounded ring buffer arena: a single-process, lock-free, framed
/// message queue (spec §1).
///
/// Producers call [`write`](Self::write); one or more consumers call
/// [`read`](Self::read). Both take `&self` — there is no lock, and the
/// struct is `Send + Sync` so it is ordinarily shared behind an `Arc`.
pub struct RingBuffer {
    arena: Arena,
    capacity: usize,
    mask: usize,
    // Each cursor is hammered by a different set of threads (producers CAS
    // `write_pos`, every thread polls `commit_pos`, the consumer owns
    // `read_pos`); cache-padding keeps them off the same line so one
    // cursor's traffic doesn't bounce the others between cores.
    write_pos: CachePadded<AtomicUsize>,
    commit_pos: CachePadded<AtomicUsize>,
    read_pos: CachePadded<AtomicUsize>,
    backpressure: Backpressure,
    stats: Stats,
    magic: AtomicU32,
}

/// Describes a successfully CAS'd reservation: where it starts, how large a
/// leading skip region (if any) it swallowed, and where the next producer
/// should expect `commit_pos` to be before it may publish.
struct WriteReservation {
    origin: usize,
    skip_len: usize,
    frame_start: usize,
    new_write: usize,
}

impl RingBuffer {
    /// Creates a ring buffer sized to the next power of two `>= requested_size`
    /// (0 means [`DEFAULT_CAPACITY`]), using the default backpressure
    /// threshold (spec §4.1 `create`).
    pub fn create(requested_size: usize) -> Result<Self, RingError> {
        Self::create_with_config(RingConfig {
            capacity: requested_size,
            ..RingConfig::default()
        })
    }

    /// Creates a ring buffer from an explicit [`RingConfig`].
    pub fn create_with_config(config: RingConfig) -> Result<Self, RingError> {
        let requested = if config.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            config.capacity
        };
        let capacity = next_power_of_two(requested as u64) as usize;

        let arena = Arena::allocate(capacity)?;
        log::info!(
            "ring buffer created: capacity={capacity} bytes, backing={}",
            arena.backing_name()
        );

        Ok(Self {
            capacity,
            mask: capacity - 1,
            write_pos: CachePadded::new(AtomicUsize::new(0)),
            commit_pos: CachePadded::new(AtomicUsize::new(0)),
            read_pos: CachePadded::new(AtomicUsize::new(0)),
            backpressure: Backpressure::new(config.backpressure_threshold),
            stats: Stats::default(),
            magic: AtomicU32::new(ARENA_MAGIC),
            arena,
        })
    }

    /// Explicit, symmetric counterpart to `create` (spec §4.1 `destroy`).
    ///
    /// In Rust, ordinary ownership already releases the arena when a
    /// `RingBuffer` is simply dropped — this exists for API parity with the
    /// spec and to log a destruction event at the point the caller considers
    /// the arena's lifetime over, not because anything would otherwise leak.
    pub fn destroy(self) {
        self.magic.store(0, Ordering::Release);
        log::info!("ring buffer destroyed: capacity={} bytes", self.capacity);
    }

    /// Returns the arena's capacity in bytes (always a power of two).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validates descriptor magic, backing capacity, and cursor bounds
    /// (spec §4.1 `validate`).
    #[must_use]
    pub fn validate(&self) -> bool {
        if self.magic.load(Ordering::Acquire) != ARENA_MAGIC {
            return false;
        }
        if self.capacity == 0 || !self.capacity.is_power_of_two() {
            return false;
        }
        let write_pos = self.write_pos.load(Ordering::Relaxed);
        let commit_pos = self.commit_pos.load(Ordering::Relaxed);
        let read_pos = self.read_pos.load(Ordering::Relaxed);
        write_pos < self.capacity && commit_pos < self.capacity && read_pos < self.capacity
    }

    fn ensure_valid(&self) -> Result<(), RingError> {
        if self.validate() {
            Ok(())
        } else {
            Err(RingError::Corrupted {
                reason: "arena descriptor or cursor invariant violated",
            })
        }
    }

    #[inline]
    fn free_bytes(&self, read_pos: usize, write_pos: usize) -> usize {
        read_pos.wrapping_sub(write_pos).wrapping_sub(1) & self.mask
    }

    #[inline]
    fn used_bytes(&self, write_pos: usize, read_pos: usize) -> usize {
        write_pos.wrapping_sub(read_pos) & self.mask
    }

    #[inline]
    fn available_read_bytes(&self, commit_pos: usize, read_pos: usize) -> usize {
        commit_pos.wrapping_sub(read_pos) & self.mask
    }

    /// Current fill ratio in `[0.0, 1.0]` (spec §6 `utilization`).
    #[must_use]
    pub fn utilization(&self) -> f64 {
        let write_pos = self.write_pos.load(Ordering::Relaxed);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        self.used_bytes(write_pos, read_pos) as f64 / self.capacity as f64
    }

    /// Bytes free for a new reservation (spec §6 `available_write`).
    #[must_use]
    pub fn available_write(&self) -> usize {
        let write_pos = self.write_pos.load(Ordering::Relaxed);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        self.free_bytes(read_pos, write_pos)
    }

    /// Bytes committed but not yet read (spec §6 `available_read`).
    #[must_use]
    pub fn available_read(&self) -> usize {
        let commit_pos = self.commit_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Relaxed);
        self.available_read_bytes(commit_pos, read_pos)
    }

    /// Whether the backpressure governor is currently latched (spec §6
    /// `is_backpressure`).
    #[must_use]
    pub fn is_backpressure(&self) -> bool {
        self.backpressure.is_active()
    }

    /// Snapshot of the seven counters (spec §6 `get_stats`).
    #[must_use]
    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zeroes every counter (spec §6 `reset_stats`).
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Reserves `frame_size` bytes, CAS'ing `write_pos` forward. Emits a
    /// leading skip region when the frame would otherwise wrap the arena end
    /// (spec §9 recommendation (b), implemented in `SPEC_FULL.md` §3).
    fn reserve(&self, frame_size: usize) -> Result<WriteReservation, RingError> {
        let mut write_pos = self.write_pos.load(Ordering::Relaxed);
        loop {
            let until_end = self.capacity - write_pos;
            let (skip_len, frame_start) = if frame_size > until_end {
                (until_end, 0usize)
            } else {
                (0usize, write_pos)
            };
            let total = skip_len + frame_size;

            let read_pos = self.read_pos.load(Ordering::Acquire);
            let free = self.free_bytes(read_pos, write_pos);
            if total > free {
                self.stats.record_write_error();
                return Err(RingError::Full);
            }

            let new_write = (frame_start + frame_size) % self.capacity;
            match self.write_pos.compare_exchange_weak(
                write_pos,
                new_write,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    debug_assert_cursor_in_bounds!("new_write", new_write, self.capacity);
                    return Ok(WriteReservation {
                        origin: write_pos,
                        skip_len,
                        frame_start,
                        new_write,
                    });
                }
                Err(actual) => write_pos = actual,
            }
        }
    }

    /// Writes the sentinel skip-frame header over `skip_len` bytes starting
    /// at `origin`, if the gap is large enough to hold one. A gap smaller
    /// than [`HEADER_SIZE`] is left as zeroed padding; the reader recognizes
    /// it implicitly by the same bound check (see `read`).
    fn write_skip_region(&self, origin: usize, skip_len: usize) {
        if skip_len >= HEADER_SIZE {
            let header = FrameHeader::skip((skip_len - HEADER_SIZE) as u32);
            // SAFETY: `origin + skip_len <= capacity` by construction in `reserve`.
            unsafe {
                self.arena.write_bytes(origin, &header.encode());
            }
        }
    }

    /// Publishes a frame (spec §4.2): validate, reserve, write, fence,
    /// commit-order wait, commit.
    pub fn write(&self, payload: &[u8]) -> Result<(), RingError> {
        if payload.is_empty() {
            return Err(RingError::InvalidParam);
        }

        self.ensure_valid().map_err(|e| {
            self.stats.record_write_error();
            e
        })?;

        if payload.len() > MAX_PAYLOAD as usize {
            self.stats.record_write_error();
            return Err(RingError::TooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let write_pos = self.write_pos.load(Ordering::Relaxed);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let used = self.used_bytes(write_pos, read_pos);
        if self.backpressure.check(used, self.capacity) {
            self.stats.record_backpressure_event();
            return Err(RingError::Backpressure);
        }

        let frame_size = align8(HEADER_SIZE + payload.len());
        let reservation = self.reserve(frame_size)?;

        if reservation.skip_len > 0 {
            self.write_skip_region(reservation.origin, reservation.skip_len);
        }

        let header = FrameHeader {
            magic: FRAME_MAGIC,
            length: payload.len() as u32,
            timestamp: timestamp_ns(),
            checksum: crc32(payload),
            reserved: 0,
        };

        // SAFETY: `reservation` grants exclusive ownership of
        // `[frame_start, frame_start + frame_size)`; the skip-frame design
        // guarantees this range never wraps the arena end.
        unsafe {
            self.arena.write_bytes(reservation.frame_start, &header.encode());
            self.arena
                .write_bytes(reservation.frame_start + HEADER_SIZE, payload);
        }

        // Publish header + payload bytes before any reader can observe them.
        fence(Ordering::Release);

        // Commit-ordering wait (spec §4.2 step 7 / §9): serialize visibility
        // in reservation order without serializing reservation itself.
        let mut backoff = Backoff::new();
        while self.commit_pos.load(Ordering::Acquire) != reservation.origin {
            backoff.snooze();
        }

        self.commit_pos.store(reservation.new_write, Ordering::Release);
        self.stats.record_write(payload.len() as u64);

        Ok(())
    }

    /// Like [`write`](Self::write), but retries `Full` with adaptive backoff
    /// instead of returning immediately. Does not retry `Backpressure` —
    /// that rejection is a deliberate load-shedding signal, not transient.
    pub fn write_with_backoff(&self, payload: &[u8]) -> Result<(), RingError> {
        let mut backoff = Backoff::new();
        loop {
            match self.write(payload) {
                Err(RingError::Full) if !backoff.is_completed() => backoff.snooze(),
                result => return result,
            }
        }
    }

    /// Reads the next frame in FIFO order (spec §4.3).
    pub fn read(&self) -> Result<Frame<'_>, RingError> {
        self.ensure_valid().map_err(|e| {
            self.stats.record_read_error();
            e
        })?;

        let commit_pos = self.commit_pos.load(Ordering::Acquire);
        let mut read_pos = self.read_pos.load(Ordering::Relaxed);

        loop {
            let available = self.available_read_bytes(commit_pos, read_pos);
            debug_assert_read_not_past_commit!(available);
            if available == 0 {
                return Err(RingError::Empty);
            }

            if self.capacity - read_pos < HEADER_SIZE {
                // Dead zone at the arena's tail: a committed byte range that
                // starts here can only be the skip region a producer wrote
                // (possibly without a header, if it was too small to hold
                // one) — commit_pos only ever advances past here in the same
                // atomic step that also commits the frame after it (§4.2),
                // so jumping straight to 0 is always safe.
                read_pos = 0;
                continue;
            }

            if available < HEADER_SIZE {
                return Err(RingError::Empty);
            }

            // SAFETY: `read_pos + HEADER_SIZE <= capacity` by the check above.
            let header_bytes = unsafe { self.arena.read_bytes(read_pos, HEADER_SIZE) };
            let header = FrameHeader::decode(header_bytes);

            if header.magic == SKIP_MAGIC {
                let skip_size = align8(HEADER_SIZE + header.length as usize);
                if available < skip_size {
                    return Err(RingError::Empty);
                }
                read_pos = (read_pos + skip_size) % self.capacity;
                self.read_pos.store(read_pos, Ordering::Release);
                continue;
            }

            if header.magic != FRAME_MAGIC {
                self.stats.record_read_error();
                return Err(RingError::Corrupted {
                    reason: "frame magic mismatch",
                });
            }
            if header.length > MAX_PAYLOAD {
                self.stats.record_read_error();
                return Err(RingError::Corrupted {
                    reason: "frame length exceeds MAX_PAYLOAD",
                });
            }

            let frame_size = align8(HEADER_SIZE + header.length as usize);
            if available < frame_size {
                // Writer has reserved but not yet committed this frame.
                return Err(RingError::Empty);
            }

            let payload_start = read_pos + HEADER_SIZE;
            if payload_start + header.length as usize > self.capacity {
                // Unreachable under the skip-frame design; kept as a
                // defensive check per spec §4.3 step 6.
                self.stats.record_read_error();
                return Err(RingError::Corrupted {
                    reason: "payload wraps the arena end",
                });
            }

            // SAFETY: bounds checked above; the range was published by the
            // writer's release store of `commit_pos`, observed via our
            // initial acquire load of `commit_pos`.
            let payload = unsafe { self.arena.read_bytes(payload_start, header.length as usize) };

            let checksum = crc32(payload);
            if checksum != header.checksum {
                self.stats.record_read_error();
                return Err(RingError::Corrupted {
                    reason: "checksum mismatch",
                });
            }
            debug_assert_checksum_verified!(checksum, header.checksum);

            let new_read = (read_pos + frame_size) % self.capacity;
            self.read_pos.store(new_read, Ordering::Release);
            self.stats.record_read(header.length as u64);

            return Ok(Frame { header, payload });
        }
    }

    /// Administrative recovery from a corrupted frame (spec §7): advances
    /// past the offending frame if its claimed length is plausible,
    /// otherwise drains the queue up to `commit_pos`. Returns `false` if
    /// there was nothing to discard.
    pub fn discard_one(&self) -> bool {
        let commit_pos = self.commit_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Relaxed);
        if self.available_read_bytes(commit_pos, read_pos) == 0 {
            return false;
        }

        self.stats.record_read_error();

        if self.capacity - read_pos < HEADER_SIZE {
            self.read_pos.store(0, Ordering::Release);
            return true;
        }

        // SAFETY: bounds checked above.
        let header_bytes = unsafe { self.arena.read_bytes(read_pos, HEADER_SIZE) };
        let length = u32::from_le_bytes(header_bytes[4..8].try_into().unwrap());

        let new_read = if (length as usize) <= MAX_PAYLOAD as usize {
            let frame_size = align8(HEADER_SIZE + length as usize);
            (read_pos + frame_size) % self.capacity
        } else {
            commit_pos
        };
        self.read_pos.store(new_read, Ordering::Release);
        true
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        log::debug!(
            "ring buffer dropped: capacity={} bytes, stats={:?}",
            self.capacity,
            self.stats.snapshot()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_round_trip() {
        let rb = RingBuffer::create(1024 * 1024).unwrap();
        rb.write(b"Hello, World!").unwrap();

        let frame = rb.read().unwrap();
        assert_eq!(frame.header.length, 13);
        assert_eq!(frame.payload, b"Hello, World!");
        assert_eq!(frame.header.checksum, crc32(b"Hello, World!"));

        assert!(matches!(rb.read(), Err(RingError::Empty)));
    }

    #[test]
    fn rejects_empty_payload() {
        let rb = RingBuffer::create(4096).unwrap();
        assert!(matches!(rb.write(b""), Err(RingError::InvalidParam)));
        assert_eq!(rb.get_stats().write_errors, 0);
    }

    #[test]
    fn rejects_oversize_payload() {
        let rb = RingBuffer::create(4096).unwrap();
        let huge = vec![0u8; MAX_PAYLOAD as usize + 1];
        let err = rb.write(&huge).unwrap_err();
        assert!(matches!(err, RingError::TooLarge { .. }));
        assert_eq!(rb.get_stats().write_errors, 1);
        assert_eq!(rb.get_stats().messages_written, 0);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(RingBuffer::create(1023).unwrap().capacity(), 1024);
        assert_eq!(RingBuffer::create(1025).unwrap().capacity(), 2048);
        assert_eq!(RingBuffer::create(0).unwrap().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn fill_to_full_then_drain_then_reuse() {
        let rb = RingBuffer::create(4096).unwrap();
        let payload = vec![0x42u8; 1024 - HEADER_SIZE]; // exactly 1024-byte frames
        let mut written = 0;
        loop {
            match rb.write(&payload) {
                Ok(()) => written += 1,
                Err(RingError::Full | RingError::Backpressure) => break,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert!(written >= 1);

        for _ in 0..written {
            let frame = rb.read().unwrap();
            assert_eq!(frame.payload, payload.as_slice());
        }
        assert!(matches!(rb.read(), Err(RingError::Empty)));

        // Buffer usable again after draining.
        rb.write(&payload).unwrap();
    }

    #[test]
    fn wraparound_preserves_fifo_and_checksums() {
        let rb = RingBuffer::create(8192).unwrap();
        let payload = vec![0x7au8; 512];
        for _ in 0..50 {
            rb.write(&payload).unwrap();
            let frame = rb.read().unwrap();
            assert_eq!(frame.payload, payload.as_slice());
            assert_eq!(frame.header.checksum, crc32(&payload));
        }
        let stats = rb.get_stats();
        assert_eq!(stats.messages_written, 50);
        assert_eq!(stats.messages_read, 50);
    }

    #[test]
    fn discard_one_recovers_from_corruption() {
        let rb = RingBuffer::create(4096).unwrap();
        rb.write(b"first").unwrap();
        rb.write(b"second").unwrap();

        // Corrupt the first frame's magic in place.
        let read_pos = rb.read_pos.load(Ordering::Relaxed);
        unsafe {
            rb.arena.write_bytes(read_pos, &0u32.to_le_bytes());
        }

        assert!(matches!(rb.read(), Err(RingError::Corrupted { .. })));
        assert_eq!(rb.get_stats().read_errors, 1);

        assert!(rb.discard_one());
        let frame = rb.read().unwrap();
        assert_eq!(frame.payload, b"second");
    }

    #[test]
    fn validate_detects_zeroed_magic() {
        let rb = RingBuffer::create(4096).unwrap();
        assert!(rb.validate());
        rb.magic.store(0, Ordering::Release);
        assert!(!rb.validate());
        assert!(matches!(rb.write(b"x"), Err(RingError::Corrupted { .. })));
    }
}
