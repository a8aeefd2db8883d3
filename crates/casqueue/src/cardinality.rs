//! Producer/consumer cardinality and the admission doors that go with it.
//!
//! A side with several actors can "lap" the ring: a fast actor draws cursor
//! `k + N` while a slow one still holds `k`, and both resolve to the same
//! slot. Each slot therefore carries a door per multi-actor side. The door is
//! open for exactly one lap (`cursor / N`) at a time; entering is a CAS from
//! that open value to `CLOSED`, leaving is a plain store of the next open
//! value. A single-actor side needs none of this and gets a zero-sized door.

use crate::backoff::Backoff;
use crate::invariants::debug_assert_door_held;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Number of actors allowed on one side of a queue.
///
/// Implemented by [`Single`] and [`Multi`] only.
pub trait Cardinality: sealed::Sealed + Send + Sync + 'static {
    /// Per-slot admission door.
    #[doc(hidden)]
    type Door: Door;

    /// Carried by handles; makes `Single` handles `!Sync`.
    #[doc(hidden)]
    type HandleMarker: Send + 'static;

    /// Maximum number of handles that may be registered for this side.
    const MAX_HANDLES: usize;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Claims the next generation on this side's cursor.
    #[doc(hidden)]
    fn draw(cursor: &AtomicU64) -> u64;
}

/// Exactly one thread uses this side of the queue.
///
/// The cursor is advanced with a plain load/store and slots carry no door;
/// the handle is neither `Clone` nor `Sync`, so the single-actor contract is
/// enforced by the type system.
#[derive(Debug, Clone, Copy)]
pub enum Single {}

/// Any number of threads use this side of the queue.
#[derive(Debug, Clone, Copy)]
pub enum Multi {}

impl sealed::Sealed for Single {}
impl sealed::Sealed for Multi {}

impl Cardinality for Single {
    type Door = NoDoor;
    type HandleMarker = PhantomData<Cell<()>>;

    const MAX_HANDLES: usize = 1;
    const NAME: &'static str = "single";

    #[inline]
    fn draw(cursor: &AtomicU64) -> u64 {
        // Only one thread ever touches this cursor.
        let pos = cursor.load(Ordering::Relaxed);
        cursor.store(pos.wrapping_add(1), Ordering::Relaxed);
        pos
    }
}

impl Cardinality for Multi {
    type Door = LapDoor;
    type HandleMarker = ();

    const MAX_HANDLES: usize = usize::MAX;
    const NAME: &'static str = "multi";

    #[inline]
    fn draw(cursor: &AtomicU64) -> u64 {
        cursor.fetch_add(1, Ordering::Relaxed)
    }
}

/// Admission latch guarding one side of a slot.
#[doc(hidden)]
pub trait Door: Default + Send + Sync {
    /// Spins until the door admits `lap`, then closes it behind the caller.
    ///
    /// Returns the number of failed attempts.
    fn enter(&self, lap: u64) -> u64;

    /// A single attempt at [`enter`](Door::enter).
    fn try_enter(&self, lap: u64) -> bool;

    /// Reopens the door for `next_lap`. Only the holder may call this.
    fn leave(&self, next_lap: u64);
}

/// Door of a single-actor side: always open.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct NoDoor;

impl Door for NoDoor {
    #[inline]
    fn enter(&self, _lap: u64) -> u64 {
        0
    }

    #[inline]
    fn try_enter(&self, _lap: u64) -> bool {
        true
    }

    #[inline]
    fn leave(&self, _next_lap: u64) {}
}

/// Door of a multi-actor side, stamped with the lap it admits next.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct LapDoor {
    /// Open lap number, or `CLOSED` while an actor is inside.
    state: AtomicU64,
}

impl LapDoor {
    const CLOSED: u64 = u64::MAX;
}

impl Door for LapDoor {
    fn enter(&self, lap: u64) -> u64 {
        let mut backoff = Backoff::new();
        let mut spins = 0;
        while !self.try_enter(lap) {
            spins += 1;
            backoff.snooze();
        }
        spins
    }

    #[inline]
    fn try_enter(&self, lap: u64) -> bool {
        self.state
            .compare_exchange(lap, Self::CLOSED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn leave(&self, next_lap: u64) {
        debug_assert_door_held!(self.state.load(Ordering::Relaxed), Self::CLOSED);
        self.state.store(next_lap, Ordering::Release);
    }
}
