//! CRC-32/IEEE checksum over frame payloads (§3 `checksum`, C2).
//!
//! The original source (`ring_buffer.c`) computes this with a process-wide
//! table guarded by a non-atomic `bool` flag — a benign race in practice but
//! UB under a strict memory model (spec §9). Rather than hand-roll a
//! `const fn` table to route around that, we lean on `crc32fast`, which ships
//! the same reflected IEEE 802.3 polynomial with a SIMD-accelerated
//! implementation and no racy lazy-init of its own.

use crc32fast::Hasher;

/// Computes the CRC-32/IEEE checksum of `data`.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
