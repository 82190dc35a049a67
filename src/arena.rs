//! Arena (C1) & lifecycle (C7): the contiguous byte region backing a
//! [`crate::RingBuffer`], and the mechanism used to allocate/release it.
//!
//! Grounded on `ring_buffer_create`/`ring_buffer_destroy` in the original
//! source, which try `mmap(MAP_ANON)` first and fall back to `malloc` —
//! ported here as `memmap2::MmapOptions::map_anon()` falling back to a
//! zeroed `Box<[u8]>`, following the `al8n-arena` crate's own
//! `Arena::map_anon` naming for the anonymous-mapping path.

use std::slice;

use memmap2::{MmapMut, MmapOptions};

use crate::error::RingError;

/// Which mechanism backs an [`Arena`]'s bytes.
///
/// In C, `malloc` and `mmap` regions must be released with matching calls;
/// in Rust both variants free themselves correctly on `Drop` regardless, so
/// this only needs to exist for introspection (`Arena::backing_name`, used
/// in the `create`/`destroy` log lines) rather than for correct teardown.
enum Backing {
    Mmap(MmapMut),
    Heap(Box<[u8]>),
}

/// A contiguous byte region of power-of-two capacity (spec §3 "Arena").
///
/// Producers and consumers access this region through raw pointer reads and
/// writes gated by the cursor protocol in [`crate::ring`], not through `&mut`
/// borrows — many threads hold a shared `&Arena` at once, each touching a
/// disjoint byte range. The `unsafe impl Send + Sync` below documents that
/// contract; the ring buffer on top of this type is what actually upholds it.
pub(crate) struct Arena {
    backing: Backing,
    ptr: *mut u8,
    capacity: usize,
}

// SAFETY: the cursor protocol in `crate::ring` guarantees that concurrent
// producers only ever write to disjoint byte ranges reserved via a
// successful CAS on `write_pos`, and that a consumer only reads ranges
// already published through a release store of `commit_pos`. The raw
// pointer itself is never reassigned after construction.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl Arena {
    /// Allocates `capacity` bytes, preferring an anonymous virtual-memory
    /// mapping (so large arenas don't commit physical pages eagerly) and
    /// falling back to a zeroed heap allocation. Both paths are fallible:
    /// an mmap failure falls through to the heap path, and a heap failure
    /// (reservation refused by the allocator) surfaces as
    /// [`RingError::MemoryError`] instead of aborting the process, per spec
    /// §4.1 `create(size) -> Arena | MemoryError`.
    pub(crate) fn allocate(capacity: usize) -> Result<Self, RingError> {
        match MmapOptions::new().len(capacity).map_anon() {
            Ok(mut mmap) => {
                let ptr = mmap.as_mut_ptr();
                Ok(Self {
                    backing: Backing::Mmap(mmap),
                    ptr,
                    capacity,
                })
            }
            Err(_) => {
                let mut heap: Vec<u8> = Vec::new();
                heap.try_reserve_exact(capacity)
                    .map_err(|_| RingError::MemoryError)?;
                heap.resize(capacity, 0);
                let mut heap = heap.into_boxed_slice();
                let ptr = heap.as_mut_ptr();
                Ok(Self {
                    backing: Backing::Heap(heap),
                    ptr,
                    capacity,
                })
            }
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Name of the allocation mechanism in use, for log lines only.
    pub(crate) fn backing_name(&self) -> &'static str {
        match self.backing {
            Backing::Mmap(_) => "anonymous mmap",
            Backing::Heap(_) => "heap",
        }
    }

    /// Copies `bytes` into the arena starting at `offset`.
    ///
    /// # Safety
    ///
    /// Caller must guarantee `offset + bytes.len() <= capacity()` and that no
    /// other thread is concurrently reading or writing the same byte range.
    #[inline]
    pub(crate) unsafe fn write_bytes(&self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.capacity);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.add(offset), bytes.len());
    }

    /// Borrows `len` bytes starting at `offset`, tied to the lifetime of `&self`.
    ///
    /// # Safety
    ///
    /// Caller must guarantee `offset + len <= capacity()` and that the range
    /// has already been published by a release store of `commit_pos` (i.e.
    /// it is not concurrently being written to).
    #[inline]
    pub(crate) unsafe fn read_bytes(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.capacity);
        slice::from_raw_parts(self.ptr.add(offset), len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zeroes_the_region() {
        let arena = Arena::allocate(4096).unwrap();
        let view = unsafe { arena.read_bytes(0, 4096) };
        assert!(view.iter().all(|&b| b == 0));
    }

    #[test]
    fn write_then_read_round_trips() {
        let arena = Arena::allocate(4096).unwrap();
        unsafe {
            arena.write_bytes(100, b"hello arena");
            assert_eq!(arena.read_bytes(100, 11), b"hello arena");
        }
    }

    #[test]
    fn allocate_surfaces_memory_error_instead_of_aborting() {
        // Larger than any allocator can satisfy (and larger than
        // `isize::MAX`, which `try_reserve_exact` rejects outright) — the
        // mmap path fails first, and the heap fallback must return
        // `MemoryError` rather than aborting the process via an infallible
        // allocation.
        let err = Arena::allocate(usize::MAX).unwrap_err();
        assert_eq!(err, RingError::MemoryError);
    }
}
