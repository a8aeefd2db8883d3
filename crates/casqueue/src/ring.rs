use crate::backoff::Backoff;
use crate::cardinality::{Cardinality, Door};
use crate::handshake::{Blocking, Mode, NonBlocking};
use crate::invariants::{debug_assert_cursor_step, debug_assert_power_of_two};
use crate::slot::Slot;
use crate::state::SlotState;
use crate::{Config, Metrics, MetricsSnapshot, QueueEmpty, QueueError, QueueFull};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// SLOT PROTOCOL
// =============================================================================
//
// ## Generations
//
// Cursors are unbounded u64 sequence numbers; `pos & mask` selects the slot
// and `pos >> shift` is the lap. The k-th producer draw and the k-th
// consumer draw land on the same slot in the same lap, which pairs the k-th
// produced value with the k-th consume regardless of which threads run them.
//
// ## Per-slot steps
//
// Producer (generation `pos`):
// 1. Pass the front door for `lap(pos)` (multi-producer only)
// 2. CAS state Empty -> Filling
// 3. Write the value
// 4. Reset own wait flag, publish Full through the consumer's parker
// 5. Reopen the front door for `lap(pos) + 1`
//
// Consumer (generation `pos`) mirrors this on Full -> Draining -> Empty
// through the back door and the producer's parker.
//
// ## When step 2 fails
//
// - Blocking: register on our own parker. If we win, park until the
//   counterpart publishes and signals; if the counterpart already marked us
//   `Ignore`, its publish is imminent. Either way finish by spinning on the
//   state CAS, which then succeeds almost immediately.
// - Non-blocking: reopen the door for the same lap and report
//   full/empty. The cursor is only committed after step 2 succeeds, so a
//   rejected attempt never consumes a generation.
//
// ## Memory ordering
//
// - The state CAS is AcqRel and the publish is a Release store, so the
//   payload write happens-before the consumer's read and the consumer's read
//   happens-before the next producer's overwrite.
// - Door enter is Acquire, door leave is Release; they order successive
//   same-role actors on one slot.
// - Cursor draws are Relaxed: a cursor only hands out positions, it never
//   publishes data.
//
// =============================================================================

/// Fixed ring of slots shared by all producers and consumers.
pub(crate) struct Ring<T, P: Cardinality, C: Cardinality, M: Mode> {
    producer_cursor: CachePadded<AtomicU64>,
    consumer_cursor: CachePadded<AtomicU64>,
    slots: Box<[Slot<T, P, C, M>]>,
    mask: usize,
    shift: u32,
    config: Config,
    metrics: Metrics,
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Ring<T, P, C, M> {
    /// Allocates `config.slot_count()` empty slots.
    pub(crate) fn new(config: Config) -> Result<Self, QueueError> {
        Ok(Self::allocate(config, config.slot_count()?))
    }

    /// Allocates exactly `capacity` slots; `capacity` must be a power of two.
    pub(crate) fn allocate(config: Config, capacity: usize) -> Self {
        debug_assert_power_of_two!(capacity);

        let slots: Box<[Slot<T, P, C, M>]> = (0..capacity).map(|_| Slot::new()).collect();

        tracing::debug!(
            requested = config.capacity,
            capacity,
            producers = P::NAME,
            consumers = C::NAME,
            mode = M::NAME,
            "allocated queue ring"
        );

        Self {
            producer_cursor: CachePadded::new(AtomicU64::new(0)),
            consumer_cursor: CachePadded::new(AtomicU64::new(0)),
            slots,
            mask: capacity - 1,
            shift: capacity.trailing_zeros(),
            config,
            metrics: Metrics::new(),
        }
    }

    /// Number of slots (a power of two).
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    fn slot_for(&self, pos: u64) -> &Slot<T, P, C, M> {
        &self.slots[(pos as usize) & self.mask]
    }

    #[inline]
    fn lap(&self, pos: u64) -> u64 {
        pos >> self.shift
    }

    pub(crate) fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    #[inline]
    fn record(&self, f: impl FnOnce(&Metrics)) {
        if self.config.enable_metrics {
            f(&self.metrics);
        }
    }
}

/// Moves a cursor past `pos`. The caller holds generation `pos` exclusively
/// (single actor, or inside the door for `lap(pos)`).
#[inline]
fn commit_cursor(cursor: &AtomicU64, pos: u64) {
    let next = pos.wrapping_add(1);
    debug_assert_cursor_step!("committed", cursor.load(Ordering::Relaxed), next);
    cursor.store(next, Ordering::Release);
}

// ---------------------------------------------------------------------
// BLOCKING
// ---------------------------------------------------------------------

impl<T, P: Cardinality, C: Cardinality> Ring<T, P, C, Blocking> {
    /// Publishes `value`, parking while the drawn slot is still occupied.
    ///
    /// Returns the generation the value was stored under.
    pub(crate) fn produce(&self, value: T) -> u64 {
        let pos = P::draw(&self.producer_cursor);
        let lap = self.lap(pos);
        let slot = self.slot_for(pos);

        let spins = slot.front.enter(lap);

        if !slot.try_begin(SlotState::Empty) {
            let parker = &slot.handshake.producer;
            if parker.register() {
                self.record(Metrics::add_producer_park);
                tracing::trace!(pos, slot = (pos as usize) & self.mask, "producer parked");
                parker.park();
            }
            slot.begin_spinning(SlotState::Empty);
        }

        // SAFETY: we moved the slot into Filling; no other actor touches the
        // payload until we publish Full.
        unsafe { slot.write(value) };
        slot.handshake.producer.reset();

        let woke = slot
            .handshake
            .consumer
            .release(|| slot.publish(SlotState::Full));
        if woke {
            tracing::trace!(pos, "producer woke parked consumer");
        }

        slot.front.leave(lap + 1);

        self.record(|m| {
            m.add_produced();
            m.add_latch_spins(spins);
        });
        pos
    }

    /// Takes the next value, parking while the drawn slot is still empty.
    ///
    /// Returns the generation alongside the value.
    pub(crate) fn consume(&self) -> (u64, T) {
        let pos = C::draw(&self.consumer_cursor);
        let lap = self.lap(pos);
        let slot = self.slot_for(pos);

        let spins = slot.back.enter(lap);

        if !slot.try_begin(SlotState::Full) {
            let parker = &slot.handshake.consumer;
            if parker.register() {
                self.record(Metrics::add_consumer_park);
                tracing::trace!(pos, slot = (pos as usize) & self.mask, "consumer parked");
                parker.park();
            }
            slot.begin_spinning(SlotState::Full);
        }

        // SAFETY: we moved the slot into Draining; the producer of this
        // generation published Full after writing the payload.
        let value = unsafe { slot.take() };
        slot.handshake.consumer.reset();

        let woke = slot
            .handshake
            .producer
            .release(|| slot.publish(SlotState::Empty));
        if woke {
            tracing::trace!(pos, "consumer woke parked producer");
        }

        slot.back.leave(lap + 1);

        self.record(|m| {
            m.add_consumed();
            m.add_latch_spins(spins);
        });
        (pos, value)
    }
}

// ---------------------------------------------------------------------
// NON-BLOCKING
// ---------------------------------------------------------------------

impl<T, P: Cardinality, C: Cardinality> Ring<T, P, C, NonBlocking> {
    /// Publishes `value` if the slot at the producer cursor is empty.
    pub(crate) fn try_produce(&self, value: T) -> Result<u64, QueueFull<T>> {
        let mut backoff = Backoff::new();
        let mut spins = 0;

        loop {
            let pos = self.producer_cursor.load(Ordering::Acquire);
            let lap = self.lap(pos);
            let slot = self.slot_for(pos);

            if !slot.front.try_enter(lap) {
                // Either another producer is inside, or the cursor moved on.
                spins += 1;
                if self.producer_cursor.load(Ordering::Acquire) == pos {
                    backoff.snooze();
                }
                continue;
            }

            if !slot.try_begin(SlotState::Empty) {
                slot.front.leave(lap);
                self.record(|m| {
                    m.add_full_rejection();
                    m.add_latch_spins(spins);
                });
                return Err(QueueFull(value));
            }

            commit_cursor(&self.producer_cursor, pos);

            // SAFETY: we moved the slot into Filling.
            unsafe { slot.write(value) };
            slot.publish(SlotState::Full);
            slot.front.leave(lap + 1);

            self.record(|m| {
                m.add_produced();
                m.add_latch_spins(spins);
            });
            return Ok(pos);
        }
    }

    /// Takes the value at the consumer cursor if it has been published.
    pub(crate) fn try_consume(&self) -> Result<(u64, T), QueueEmpty> {
        let mut backoff = Backoff::new();
        let mut spins = 0;

        loop {
            let pos = self.consumer_cursor.load(Ordering::Acquire);
            let lap = self.lap(pos);
            let slot = self.slot_for(pos);

            if !slot.back.try_enter(lap) {
                spins += 1;
                if self.consumer_cursor.load(Ordering::Acquire) == pos {
                    backoff.snooze();
                }
                continue;
            }

            if !slot.try_begin(SlotState::Full) {
                slot.back.leave(lap);
                self.record(|m| {
                    m.add_empty_rejection();
                    m.add_latch_spins(spins);
                });
                return Err(QueueEmpty);
            }

            commit_cursor(&self.consumer_cursor, pos);

            // SAFETY: we moved the slot into Draining.
            let value = unsafe { slot.take() };
            slot.publish(SlotState::Empty);
            slot.back.leave(lap + 1);

            self.record(|m| {
                m.add_consumed();
                m.add_latch_spins(spins);
            });
            return Ok((pos, value));
        }
    }
}
