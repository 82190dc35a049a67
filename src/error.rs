use thiserror::Error;

/// Error kinds returned by [`crate::RingBuffer`] operations (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// A null/empty argument was passed (e.g. zero-length write).
    #[error("invalid parameter")]
    InvalidParam,

    /// Payload length exceeds [`crate::config::MAX_PAYLOAD`].
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Size of the rejected payload, in bytes.
        size: usize,
        /// Configured maximum payload size, in bytes.
        max: u32,
    },

    /// Insufficient free space to reserve the frame; retry after a read.
    #[error("ring buffer full")]
    Full,

    /// Fill ratio is at or above the backpressure threshold.
    #[error("backpressure: utilization at or above threshold")]
    Backpressure,

    /// Fewer than a header's worth of bytes are committed, or the writer is
    /// still mid-commit for the next frame.
    #[error("ring buffer empty")]
    Empty,

    /// Frame failed magic, length-bound, or checksum validation, or a
    /// structural invariant (cursor bounds, descriptor magic) was violated.
    #[error("corrupted frame or arena: {reason}")]
    Corrupted {
        /// Human-readable description of what failed validation.
        reason: &'static str,
    },

    /// Backing-memory allocation failed during [`crate::RingBuffer::create`].
    #[error("memory allocation failed")]
    MemoryError,
}

impl RingError {
    /// Returns the spec's `error_string(code)` mapping as a static string.
    #[must_use]
    pub const fn error_string(&self) -> &'static str {
        match self {
            RingError::InvalidParam => "Invalid parameter",
            RingError::TooLarge { .. } => "Message too large",
            RingError::Full => "Buffer full",
            RingError::Backpressure => "Backpressure active",
            RingError::Empty => "Buffer empty",
            RingError::Corrupted { .. } => "Buffer corrupted",
            RingError::MemoryError => "Memory allocation error",
        }
    }
}
