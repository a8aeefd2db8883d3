use crate::cardinality::{Cardinality, Multi, Single};
use crate::config::DEFAULT_CAPACITY;
use crate::handshake::{Blocking, Mode, NonBlocking};
use crate::ring::Ring;
use crate::{Config, MetricsSnapshot, QueueEmpty, QueueError, QueueFull};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Multi-producer multi-consumer queue; operations wait for space/data.
pub type BlockingMpmc<T> = Queue<T, Multi, Multi, Blocking>;
/// Multi-producer single-consumer queue; operations wait for space/data.
pub type BlockingMpsc<T> = Queue<T, Multi, Single, Blocking>;
/// Single-producer multi-consumer queue; operations wait for space/data.
pub type BlockingSpmc<T> = Queue<T, Single, Multi, Blocking>;
/// Single-producer single-consumer queue; operations wait for space/data.
pub type BlockingSpsc<T> = Queue<T, Single, Single, Blocking>;
/// Multi-producer multi-consumer queue; operations fail fast.
pub type NonBlockingMpmc<T> = Queue<T, Multi, Multi, NonBlocking>;
/// Multi-producer single-consumer queue; operations fail fast.
pub type NonBlockingMpsc<T> = Queue<T, Multi, Single, NonBlocking>;
/// Single-producer multi-consumer queue; operations fail fast.
pub type NonBlockingSpmc<T> = Queue<T, Single, Multi, NonBlocking>;
/// Single-producer single-consumer queue; operations fail fast.
pub type NonBlockingSpsc<T> = Queue<T, Single, Single, NonBlocking>;

/// Bounded ring queue, configured by producer cardinality `P`, consumer
/// cardinality `C` and delivery mode `M`.
///
/// The queue itself only owns the ring; values move through [`Producer`] and
/// [`Consumer`] handles obtained with [`producer`](Queue::producer) and
/// [`consumer`](Queue::consumer). A `Single` side hands out exactly one
/// handle, which can be moved to another thread but neither cloned nor
/// shared:
///
/// ```compile_fail
/// use casqueue_rs::BlockingSpsc;
///
/// let queue = BlockingSpsc::<u64>::new();
/// let producer = queue.producer().unwrap();
/// let second = producer.clone();
/// ```
///
/// ```compile_fail
/// use casqueue_rs::NonBlockingSpsc;
///
/// fn assert_sync<T: Sync>(_: &T) {}
///
/// let queue = NonBlockingSpsc::<u64>::new();
/// let producer = queue.producer().unwrap();
/// assert_sync(&producer);
/// ```
pub struct Queue<T, P: Cardinality, C: Cardinality, M: Mode> {
    inner: Arc<Shared<T, P, C, M>>,
}

struct Shared<T, P: Cardinality, C: Cardinality, M: Mode> {
    ring: Ring<T, P, C, M>,
    producers: AtomicUsize,
    consumers: AtomicUsize,
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Queue<T, P, C, M> {
    /// Creates a queue with the default capacity (16384 slots).
    pub fn new() -> Self {
        Self::from_ring(Ring::allocate(Config::default(), DEFAULT_CAPACITY))
    }

    /// Creates a queue with `capacity` rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        Self::with_config(Config::default().with_capacity(capacity))
    }

    /// Creates a queue from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, QueueError> {
        Ring::new(config).map(Self::from_ring)
    }

    fn from_ring(ring: Ring<T, P, C, M>) -> Self {
        Self {
            inner: Arc::new(Shared {
                ring,
                producers: AtomicUsize::new(0),
                consumers: AtomicUsize::new(0),
            }),
        }
    }

    /// Registers a producer handle.
    ///
    /// Fails with [`QueueError::TooManyProducers`] if this is a
    /// single-producer queue whose producer was already handed out.
    pub fn producer(&self) -> Result<Producer<T, P, C, M>, QueueError> {
        register(&self.inner.producers, P::MAX_HANDLES).map_err(|max| {
            tracing::debug!(max, "rejected producer registration");
            QueueError::TooManyProducers { max }
        })?;

        Ok(Producer {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        })
    }

    /// Registers a consumer handle.
    ///
    /// Fails with [`QueueError::TooManyConsumers`] if this is a
    /// single-consumer queue whose consumer was already handed out.
    pub fn consumer(&self) -> Result<Consumer<T, P, C, M>, QueueError> {
        register(&self.inner.consumers, C::MAX_HANDLES).map_err(|max| {
            tracing::debug!(max, "rejected consumer registration");
            QueueError::TooManyConsumers { max }
        })?;

        Ok(Consumer {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        })
    }

    /// Returns the number of slots (a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }

    /// Returns the configuration the queue was built with.
    #[inline]
    pub fn config(&self) -> Config {
        *self.inner.ring.config()
    }

    /// Returns a metrics snapshot, or zeros if metrics are disabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.ring.metrics()
    }
}

/// Counts a handle registration against `max`; returns `Err(max)` when full.
fn register(count: &AtomicUsize, max: usize) -> Result<usize, usize> {
    count
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            (n < max).then_some(n + 1)
        })
        .map_err(|_| max)
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Default for Queue<T, P, C, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Clone for Queue<T, P, C, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> fmt::Debug for Queue<T, P, C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity())
            .field("producers", &P::NAME)
            .field("consumers", &C::NAME)
            .field("mode", &M::NAME)
            .finish()
    }
}

// ---------------------------------------------------------------------
// PRODUCER
// ---------------------------------------------------------------------

/// Sending half of a [`Queue`].
///
/// `Clone` and `Sync` only when the queue is multi-producer.
pub struct Producer<T, P: Cardinality, C: Cardinality, M: Mode> {
    inner: Arc<Shared<T, P, C, M>>,
    _marker: PhantomData<P::HandleMarker>,
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Producer<T, P, C, M> {
    /// Returns the number of slots in the underlying queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }
}

impl<T, P: Cardinality, C: Cardinality> Producer<T, P, C, Blocking> {
    /// Enqueues `value`, parking the thread until its slot has drained.
    ///
    /// Never fails; it trades an error for unbounded latency.
    #[inline]
    pub fn produce(&self, value: T) {
        self.inner.ring.produce(value);
    }
}

impl<T, P: Cardinality, C: Cardinality> Producer<T, P, C, NonBlocking> {
    /// Enqueues `value` if the next slot is free.
    ///
    /// On [`QueueFull`] nothing was written and the value is handed back.
    #[inline]
    pub fn try_produce(&self, value: T) -> Result<(), QueueFull<T>> {
        self.inner.ring.try_produce(value).map(|_| ())
    }
}

impl<T, C: Cardinality, M: Mode> Clone for Producer<T, Multi, C, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> fmt::Debug for Producer<T, P, C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("cardinality", &P::NAME)
            .finish()
    }
}

// ---------------------------------------------------------------------
// CONSUMER
// ---------------------------------------------------------------------

/// Receiving half of a [`Queue`].
///
/// `Clone` and `Sync` only when the queue is multi-consumer.
pub struct Consumer<T, P: Cardinality, C: Cardinality, M: Mode> {
    inner: Arc<Shared<T, P, C, M>>,
    _marker: PhantomData<C::HandleMarker>,
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Consumer<T, P, C, M> {
    /// Returns the number of slots in the underlying queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }
}

impl<T, P: Cardinality, C: Cardinality> Consumer<T, P, C, Blocking> {
    /// Dequeues the next value, parking the thread until it is produced.
    #[inline]
    pub fn consume(&self) -> T {
        self.inner.ring.consume().1
    }
}

impl<T, P: Cardinality, C: Cardinality> Consumer<T, P, C, NonBlocking> {
    /// Dequeues the next value if it has already been published.
    #[inline]
    pub fn try_consume(&self) -> Result<T, QueueEmpty> {
        self.inner.ring.try_consume().map(|(_, value)| value)
    }

    /// Iterates over values until the queue is observed empty.
    pub fn try_iter(&self) -> TryIter<'_, T, P, C> {
        TryIter { consumer: self }
    }
}

impl<T, P: Cardinality, M: Mode> Clone for Consumer<T, P, Multi, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> fmt::Debug for Consumer<T, P, C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("cardinality", &C::NAME)
            .finish()
    }
}

/// Draining iterator returned by [`Consumer::try_iter`].
#[derive(Debug)]
pub struct TryIter<'a, T, P: Cardinality, C: Cardinality> {
    consumer: &'a Consumer<T, P, C, NonBlocking>,
}

impl<T, P: Cardinality, C: Cardinality> Iterator for TryIter<'_, T, P, C> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.try_consume().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_single_side_registers_once() {
        let queue = BlockingSpsc::<u64>::with_capacity(4).unwrap();
        let _p = queue.producer().unwrap();
        let _c = queue.consumer().unwrap();

        assert_eq!(
            queue.producer().unwrap_err(),
            QueueError::TooManyProducers { max: 1 }
        );
        assert_eq!(
            queue.consumer().unwrap_err(),
            QueueError::TooManyConsumers { max: 1 }
        );
    }

    #[test]
    fn test_multi_side_registers_freely() {
        let queue = NonBlockingMpmc::<u64>::with_capacity(4).unwrap();
        let handles: Vec<_> = (0..8).map(|_| queue.producer().unwrap()).collect();
        let cloned = handles[0].clone();
        cloned.try_produce(1).unwrap();

        let consumer = queue.consumer().unwrap();
        let other = consumer.clone();
        assert_eq!(other.try_consume(), Ok(1));
        assert_eq!(consumer.try_consume(), Err(QueueEmpty));
    }

    #[test]
    fn test_capacity_and_defaults() {
        assert_eq!(BlockingMpmc::<u64>::new().capacity(), 16384);
        assert_eq!(NonBlockingSpsc::<u64>::default().capacity(), 16384);
        assert_eq!(BlockingMpsc::<u64>::with_capacity(1000).unwrap().capacity(), 1024);
        assert_eq!(
            BlockingSpmc::<u64>::with_capacity(0).unwrap_err(),
            QueueError::ZeroCapacity
        );
    }

    #[test]
    fn test_try_iter_drains_available() {
        let queue = NonBlockingSpsc::<u32>::with_capacity(8).unwrap();
        let producer = queue.producer().unwrap();
        let consumer = queue.consumer().unwrap();

        for i in 0..5 {
            producer.try_produce(i).unwrap();
        }
        assert_eq!(consumer.try_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(consumer.try_iter().count(), 0);
    }

    #[test]
    fn test_handles_outlive_queue() {
        let queue = BlockingSpsc::<String>::with_capacity(2).unwrap();
        let producer = queue.producer().unwrap();
        let consumer = queue.consumer().unwrap();
        drop(queue);

        let t = thread::spawn(move || producer.produce("hello".to_string()));
        assert_eq!(consumer.consume(), "hello");
        t.join().unwrap();
    }

    #[test]
    fn test_metrics_through_queue() {
        let queue = NonBlockingMpsc::<u8>::with_config(Config::new(2, true)).unwrap();
        let producer = queue.producer().unwrap();
        let consumer = queue.consumer().unwrap();

        producer.try_produce(1).unwrap();
        producer.try_produce(2).unwrap();
        assert!(producer.try_produce(3).is_err());
        assert_eq!(consumer.try_consume(), Ok(1));

        let m = queue.metrics();
        assert_eq!(m.produced, 2);
        assert_eq!(m.consumed, 1);
        assert_eq!(m.full_rejections, 1);
        assert!(queue.config().enable_metrics);
    }

    #[test]
    fn test_debug_output() {
        let queue = BlockingMpsc::<u8>::with_capacity(4).unwrap();
        let rendered = format!("{:?}", queue);
        assert!(rendered.contains("capacity: 4"));
        assert!(rendered.contains("blocking"));
    }
}
