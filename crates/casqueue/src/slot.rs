use crate::backoff::Backoff;
use crate::cardinality::Cardinality;
use crate::handshake::Mode;
use crate::invariants::debug_assert_next_state;
use crate::state::{AtomicTag, SlotState};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::Ordering;

/// One ring cell: payload, state machine, doors and parkers.
///
/// `value` is only touched by the actor that moved `state` into `Filling`
/// (write) or `Draining` (read). The state CAS that grants that right is
/// `AcqRel`, and the state store that ends it is `Release`, so the payload
/// handoff is ordered entirely through `state`.
pub(crate) struct Slot<T, P: Cardinality, C: Cardinality, M: Mode> {
    value: UnsafeCell<MaybeUninit<T>>,
    state: AtomicTag<SlotState>,
    /// Admission for producers (no-op unless multi-producer).
    pub(crate) front: P::Door,
    /// Admission for consumers (no-op unless multi-consumer).
    pub(crate) back: C::Door,
    /// Parkers (zero-sized unless blocking).
    pub(crate) handshake: M::Handshake,
}

// SAFETY: the payload cell is only accessed by the single actor holding the
// slot in `Filling` or `Draining`, and ownership of `T` moves between threads,
// so `T: Send` is sufficient.
unsafe impl<T: Send, P: Cardinality, C: Cardinality, M: Mode> Sync for Slot<T, P, C, M> {}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Slot<T, P, C, M> {
    pub(crate) fn new() -> Self {
        Self {
            value: UnsafeCell::new(MaybeUninit::uninit()),
            state: AtomicTag::new(SlotState::Empty),
            front: P::Door::default(),
            back: C::Door::default(),
            handshake: M::Handshake::default(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        self.state.load(Ordering::Acquire)
    }

    /// Attempts the step out of `from` into its intermediate state
    /// (`Empty → Filling` or `Full → Draining`).
    #[inline]
    pub(crate) fn try_begin(&self, from: SlotState) -> bool {
        self.state.transition(from, from.next())
    }

    /// Retries [`try_begin`](Slot::try_begin) until it succeeds.
    ///
    /// Only used when the counterpart is known to be publishing `from`
    /// imminently (it marked our wait flag `Ignore`, or it woke us).
    pub(crate) fn begin_spinning(&self, from: SlotState) {
        let mut backoff = Backoff::new();
        while !self.try_begin(from) {
            backoff.snooze();
        }
    }

    /// Ends the current intermediate state (`Filling → Full` or
    /// `Draining → Empty`).
    #[inline]
    pub(crate) fn publish(&self, next: SlotState) {
        debug_assert_next_state!(self.state.load(Ordering::Relaxed), next);
        self.state.store(next, Ordering::Release);
    }

    /// Writes the payload.
    ///
    /// # Safety
    ///
    /// The caller must have moved this slot into `Filling`.
    #[inline]
    pub(crate) unsafe fn write(&self, value: T) {
        (*self.value.get()).write(value);
    }

    /// Moves the payload out.
    ///
    /// # Safety
    ///
    /// The caller must have moved this slot into `Draining`; the value was
    /// written by the producer that published `Full`.
    #[inline]
    pub(crate) unsafe fn take(&self) -> T {
        (*self.value.get()).assume_init_read()
    }
}

impl<T, P: Cardinality, C: Cardinality, M: Mode> Drop for Slot<T, P, C, M> {
    fn drop(&mut self) {
        // No operation is in flight at destruction, so only `Full` slots
        // own an initialized value.
        if self.state() == SlotState::Full {
            // SAFETY: `Full` means a producer wrote the value and no consumer
            // moved it out; `&mut self` rules out concurrent access.
            unsafe { ptr::drop_in_place(self.value.get_mut().as_mut_ptr()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blocking, Multi, NonBlocking, Single};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_full_cycle() {
        let slot = Slot::<u64, Single, Single, NonBlocking>::new();
        assert_eq!(slot.state(), SlotState::Empty);

        assert!(!slot.try_begin(SlotState::Full));
        assert!(slot.try_begin(SlotState::Empty));
        unsafe { slot.write(7) };
        slot.publish(SlotState::Full);

        assert!(!slot.try_begin(SlotState::Empty));
        assert!(slot.try_begin(SlotState::Full));
        assert_eq!(unsafe { slot.take() }, 7);
        slot.publish(SlotState::Empty);
        assert_eq!(slot.state(), SlotState::Empty);
    }

    #[test]
    fn test_zero_sized_configuration_parts() {
        use std::mem::size_of;
        // Single-actor doors and non-blocking handshakes cost nothing.
        assert!(
            size_of::<Slot<u64, Single, Single, NonBlocking>>()
                < size_of::<Slot<u64, Multi, Multi, NonBlocking>>()
        );
        assert!(
            size_of::<Slot<u64, Multi, Multi, NonBlocking>>()
                < size_of::<Slot<u64, Multi, Multi, Blocking>>()
        );
        assert_eq!(size_of::<<Single as Cardinality>::Door>(), 0);
        assert_eq!(size_of::<<NonBlocking as Mode>::Handshake>(), 0);
    }

    #[test]
    fn test_drop_releases_full_value_only() {
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropTracker;

        impl Drop for DropTracker {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);

        {
            let _empty = Slot::<DropTracker, Single, Single, Blocking>::new();
        }
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 0);

        {
            let slot = Slot::<DropTracker, Single, Single, Blocking>::new();
            assert!(slot.try_begin(SlotState::Empty));
            unsafe { slot.write(DropTracker) };
            slot.publish(SlotState::Full);
        }
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
    }
}
