//! Closed tag sets stored in genuine atomic integers.
//!
//! Every per-slot state field is an `AtomicU8` carrying one of a handful of
//! tags. The enums never touch memory directly; they are converted to and
//! from their raw value at the atomic boundary.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};

/// A small closed set of values that fits an `AtomicU8`.
pub(crate) trait Tag: Copy + Eq + fmt::Debug {
    fn into_raw(self) -> u8;
    fn from_raw(raw: u8) -> Self;
}

/// Slot lifecycle: `Empty → Filling → Full → Draining → Empty`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    /// No data; a producer may claim the slot.
    Empty = 0,
    /// A producer is writing the value.
    Filling = 1,
    /// Data is published; a consumer may claim the slot.
    Full = 2,
    /// A consumer is reading the value out.
    Draining = 3,
}

impl SlotState {
    /// The state that legally follows `self`.
    #[inline]
    pub(crate) const fn next(self) -> Self {
        match self {
            Self::Empty => Self::Filling,
            Self::Filling => Self::Full,
            Self::Full => Self::Draining,
            Self::Draining => Self::Empty,
        }
    }
}

impl Tag for SlotState {
    #[inline]
    fn into_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Self::Empty,
            1 => Self::Filling,
            2 => Self::Full,
            _ => Self::Draining,
        }
    }
}

/// Whether one role has parked on a slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitFlag {
    /// Nobody has registered yet; whichever side CASes first decides.
    Init = 0,
    /// The role is parked (or about to park) and needs a signal.
    Waiting = 1,
    /// The counterpart already published; the role must spin, not park.
    Ignore = 2,
}

impl Tag for WaitFlag {
    #[inline]
    fn into_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Init,
            1 => Self::Waiting,
            _ => Self::Ignore,
        }
    }
}

/// An atomic cell holding a [`Tag`].
pub(crate) struct AtomicTag<S> {
    raw: AtomicU8,
    _tag: PhantomData<S>,
}

impl<S: Tag> AtomicTag<S> {
    pub(crate) fn new(tag: S) -> Self {
        Self {
            raw: AtomicU8::new(tag.into_raw()),
            _tag: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> S {
        S::from_raw(self.raw.load(order))
    }

    #[inline]
    pub(crate) fn store(&self, tag: S, order: Ordering) {
        self.raw.store(tag.into_raw(), order);
    }

    /// Single CAS from `from` to `to`. Success acquires whatever the previous
    /// writer released and releases our own prior writes.
    #[inline]
    pub(crate) fn transition(&self, from: S, to: S) -> bool {
        self.raw
            .compare_exchange(
                from.into_raw(),
                to.into_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl<S: Tag> fmt::Debug for AtomicTag<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicTag")
            .field(&self.load(Ordering::Relaxed))
            .finish()
    }
}
