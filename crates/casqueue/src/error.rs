//! Error types for queue construction and non-blocking operations.

use thiserror::Error;

/// Errors raised while building a queue or registering handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A capacity of zero was requested.
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    /// The requested capacity has no power of two representable in `usize`.
    #[error("queue capacity {requested} cannot be rounded up to a power of two")]
    CapacityOverflow {
        /// The capacity that was requested.
        requested: usize,
    },

    /// Too many producers registered on a single-producer queue.
    #[error("too many producers registered (max: {max})")]
    TooManyProducers {
        /// The maximum number of producer handles.
        max: usize,
    },

    /// Too many consumers registered on a single-consumer queue.
    #[error("too many consumers registered (max: {max})")]
    TooManyConsumers {
        /// The maximum number of consumer handles.
        max: usize,
    },
}

/// A non-blocking produce found its slot still occupied.
///
/// The rejected value is handed back so the caller can retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    /// Returns the value that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Always `true`: the queue drains as consumers make progress.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// A non-blocking consume found its slot not yet filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is empty")]
pub struct QueueEmpty;

impl QueueEmpty {
    /// Always `true`: the queue fills as producers make progress.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
