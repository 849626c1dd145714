//! Error types for `PooledVec`.

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `PooledVec`, its segment table and the bundled pools.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An index was outside `[0, len)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The length at the time of the call.
        len: usize,
    },

    /// Arbitrary-position insertion and removal are not supported.
    #[error("operation not supported: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The container was structurally modified while a cursor was walking it.
    #[error("collection was modified during iteration (expected version {expected}, found {found})")]
    ConcurrentModification {
        /// Version captured when the cursor was created.
        expected: u64,
        /// Version observed at the failing step.
        found: u64,
    },

    /// A copy-out destination cannot hold every element.
    #[error("destination too small: need {required} slots, have {available}")]
    DestinationTooSmall {
        /// `start + len`.
        required: usize,
        /// Length of the destination slice.
        available: usize,
    },

    /// The pool could not supply a buffer.
    #[error("buffer pool exhausted (requested {requested} elements)")]
    PoolExhausted {
        /// Minimum capacity that was asked for.
        requested: usize,
    },

    /// The container already returned its buffers to the pool.
    #[error("container has been disposed")]
    Disposed,

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
