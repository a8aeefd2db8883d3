//! Delivery modes and the per-slot wait/ignore handshake.
//!
//! A blocking producer that finds its slot occupied parks until the consumer
//! draining that slot lets it through (and symmetrically for consumers). The
//! classic hazard is a missed wakeup: the counterpart finishes and signals
//! before the waiter has registered. Both sides therefore race on a three
//! valued flag first:
//!
//! - the waiter CASes `Init → Waiting` and, on success, parks;
//! - the counterpart CASes `Init → Ignore` and, on success, only publishes the
//!   new slot state, because nobody is parked yet;
//! - whoever loses learns what the winner did: a counterpart that sees
//!   `Waiting` publishes and then signals, a waiter that sees `Ignore` spins
//!   on the slot state, which is about to be (or already is) published.
//!
//! The flag is reset to `Init` by its owning role each time that role
//! completes a step on the slot, so the counterpart never has to drain it.

use crate::cardinality::sealed;
use crate::invariants::debug_assert_single_signal;
use crate::state::{AtomicTag, WaitFlag};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::Ordering;

/// How an operation reacts when its slot is not ready.
///
/// Implemented by [`Blocking`] and [`NonBlocking`] only.
pub trait Mode: sealed::Sealed + Send + Sync + 'static {
    /// Per-slot suspension state; zero-sized when the mode never parks.
    #[doc(hidden)]
    type Handshake: Default + Send + Sync;

    /// Short name used in logs.
    const NAME: &'static str;
}

/// Operations wait for space or data, parking the thread if needed.
#[derive(Debug, Clone, Copy)]
pub enum Blocking {}

/// Operations fail fast with `QueueFull` / `QueueEmpty`.
#[derive(Debug, Clone, Copy)]
pub enum NonBlocking {}

impl sealed::Sealed for Blocking {}
impl sealed::Sealed for NonBlocking {}

impl Mode for Blocking {
    type Handshake = SlotHandshake;

    const NAME: &'static str = "blocking";
}

impl Mode for NonBlocking {
    type Handshake = ();

    const NAME: &'static str = "non-blocking";
}

/// The two parkers of a blocking slot.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct SlotHandshake {
    /// A producer waiting for the slot to drain.
    pub(crate) producer: Parker,
    /// A consumer waiting for the slot to fill.
    pub(crate) consumer: Parker,
}

/// Single-waiter rendezvous: one parked party, one signaller.
#[derive(Debug)]
pub(crate) struct Parker {
    flag: AtomicTag<WaitFlag>,
    proceed: Mutex<bool>,
    signal: Condvar,
}

impl Default for Parker {
    fn default() -> Self {
        Self {
            flag: AtomicTag::new(WaitFlag::Init),
            proceed: Mutex::new(false),
            signal: Condvar::new(),
        }
    }
}

impl Parker {
    /// Called by the owning role once its step on the slot is done.
    #[inline]
    pub(crate) fn reset(&self) {
        self.flag.store(WaitFlag::Init, Ordering::Release);
    }

    /// Announces the intent to park.
    ///
    /// `false` means the counterpart already published and marked the flag
    /// `Ignore`; the caller must spin on the slot state instead of parking.
    #[inline]
    pub(crate) fn register(&self) -> bool {
        self.flag.transition(WaitFlag::Init, WaitFlag::Waiting)
    }

    /// Blocks until [`release`](Parker::release) lets the caller through.
    /// Only valid after a successful [`register`](Parker::register).
    pub(crate) fn park(&self) {
        let mut proceed = self.proceed.lock();
        // Loop guards against spurious wakeups.
        while !*proceed {
            self.signal.wait(&mut proceed);
        }
        *proceed = false;
    }

    /// Counterpart side: publish the new slot state, waking the parked role
    /// if it registered first.
    ///
    /// Returns `true` if a waiter was signalled.
    pub(crate) fn release(&self, publish: impl FnOnce()) -> bool {
        if self.flag.transition(WaitFlag::Init, WaitFlag::Ignore) {
            publish();
            return false;
        }

        debug_assert_eq!(self.flag.load(Ordering::Relaxed), WaitFlag::Waiting);
        publish();

        let mut proceed = self.proceed.lock();
        debug_assert_single_signal!(*proceed);
        *proceed = true;
        self.signal.notify_one();
        true
    }
}
