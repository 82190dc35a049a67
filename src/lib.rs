//! A single-process, shared-memory, lock-free framed message queue.
//!
//! A bounded ring buffer that carries length-prefixed binary payloads (e.g.
//! columnar-IPC record batches) between producers and consumers within one
//! address space. Producers publish immutable frames; a consumer drains
//! them in FIFO order. Neither side blocks on a mutex: the fast paths are
//! wait-free, gated by a three-cursor (reserve/commit/read) protocol over a
//! contiguous byte arena.
//!
//! # Key properties
//!
//! - Wait-free writes and reads under concurrency (producers serialize
//!   through a single CAS on the write cursor; there is no lock).
//! - Zero-copy reads: [`RingBuffer::read`] hands back a [`Frame`] borrowing
//!   directly from the arena, valid until the next call to `read`.
//! - Frames never wrap the arena end: a sentinel skip frame pads out the
//!   tail instead, so the zero-copy read path never has to reject a
//!   wrap-spanning payload.
//! - Advisory backpressure: once fill ratio crosses
//!   [`config::BACKPRESSURE_THRESHOLD`], new writes are rejected with
//!   [`RingError::Backpressure`] before any reservation is attempted.
//!
//! # Example
//!
//! ```
//! use ringarena_rs::RingBuffer;
//!
//! let rb = RingBuffer::create(1024 * 1024).unwrap();
//! rb.write(b"Hello, World!").unwrap();
//!
//! let frame = rb.read().unwrap();
//! assert_eq!(frame.payload, b"Hello, World!");
//! assert!(rb.read().is_err()); // Empty
//! ```
//!
//! # Non-goals
//!
//! Persistence across process restarts, blocking/parking APIs, priorities
//! or non-FIFO ordering, and multi-process sharing are all out of scope —
//! see `DESIGN.md` in the repository root for the full rationale.

mod arena;
mod backoff;
mod backpressure;
mod clock;
pub mod config;
mod crc32;
mod error;
mod frame;
mod invariants;
mod ring;
mod stats;

pub use backoff::Backoff;
pub use config::{RingConfig, DEFAULT_CAPACITY, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_PAYLOAD};
pub use crc32::crc32;
pub use error::RingError;
pub use frame::{Frame, FrameHeader};
pub use ring::RingBuffer;
pub use stats::StatsSnapshot;

pub use clock::timestamp_ns as timestamp;
pub use config::next_power_of_two;
