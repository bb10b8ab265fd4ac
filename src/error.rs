//! Error taxonomy for FIFO construction and checked operations.

use thiserror::Error;

/// Failures reported by [`Fifo`](crate::Fifo) and its handles.
///
/// Every checked operation that returns one of these leaves the buffer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Capacity is zero, not a power of two, or above [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    #[error("invalid capacity {capacity}: must be a power of two in 1..=128")]
    InvalidCapacity { capacity: usize },

    /// Backing storage holds fewer elements than the requested capacity.
    #[error("storage of {len} elements cannot back a capacity of {capacity}")]
    StorageTooSmall { capacity: usize, len: usize },

    /// Push into a full buffer.
    #[error("fifo overflow: buffer is full")]
    Overflow,

    /// Pop from an empty buffer.
    #[error("fifo underflow: buffer is empty")]
    Underflow,
}

pub type Result<T> = core::result::Result<T, Error>;
