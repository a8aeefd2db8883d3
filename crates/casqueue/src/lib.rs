//! casqueue-rs - Bounded CAS Ring Queues
//!
//! A family of fixed-capacity queues for handing values between producer and
//! consumer threads. One engine covers all eight variants, selected by three
//! type parameters:
//!
//! - producer cardinality: [`Single`] or [`Multi`]
//! - consumer cardinality: [`Single`] or [`Multi`]
//! - delivery mode: [`Blocking`] (wait for space/data) or [`NonBlocking`]
//!   (fail fast with [`QueueFull`] / [`QueueEmpty`])
//!
//! # Design
//!
//! - Power-of-two ring; a monotonically increasing cursor per side picks the
//!   slot with `cursor & (N - 1)`
//! - Every slot runs its own CAS state machine:
//!   `Empty → Filling → Full → Draining → Empty`
//! - Multi-actor sides pass a per-slot admission door first, so actors that
//!   lapped the ring never drive the same slot at once
//! - Blocking variants park on a per-slot wait/ignore handshake that cannot
//!   miss a wakeup; there is no queue-wide lock
//!
//! # Example
//!
//! ```
//! use casqueue_rs::{BlockingMpmc, NonBlockingSpsc, QueueFull};
//! use std::thread;
//!
//! // Blocking: operations wait for their counterpart.
//! let queue = BlockingMpmc::<u64>::with_capacity(1000).unwrap();
//! assert_eq!(queue.capacity(), 1024);
//!
//! let producer = queue.producer().unwrap();
//! let consumer = queue.consumer().unwrap();
//! let worker = thread::spawn(move || consumer.consume());
//! producer.produce(42);
//! assert_eq!(worker.join().unwrap(), 42);
//!
//! // Non-blocking: a full or empty queue is reported immediately.
//! let queue = NonBlockingSpsc::<u64>::with_capacity(2).unwrap();
//! let producer = queue.producer().unwrap();
//! let consumer = queue.consumer().unwrap();
//!
//! producer.try_produce(1).unwrap();
//! producer.try_produce(2).unwrap();
//! assert_eq!(producer.try_produce(3), Err(QueueFull(3)));
//! assert_eq!(consumer.try_consume(), Ok(1));
//! ```

mod backoff;
mod cardinality;
mod config;
mod error;
mod handshake;
mod invariants;
mod metrics;
mod queue;
mod ring;
mod slot;
mod state;

pub use cardinality::{Cardinality, Multi, Single};
pub use config::{Config, DEFAULT_CAPACITY, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{QueueEmpty, QueueError, QueueFull};
pub use handshake::{Blocking, Mode, NonBlocking};
pub use metrics::MetricsSnapshot;
pub use queue::{
    BlockingMpmc, BlockingMpsc, BlockingSpmc, BlockingSpsc, Consumer, NonBlockingMpmc,
    NonBlockingMpsc, NonBlockingSpmc, NonBlockingSpsc, Producer, Queue, TryIter,
};

pub(crate) use metrics::Metrics;
