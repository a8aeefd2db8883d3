//! Debug assertion macros for slot protocol invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`); they compile to
//! nothing in release builds.

// =============================================================================
// Ring storage
// =============================================================================

/// Assert that the slot count allows mask-based indexing.
///
/// **Invariant**: `slots` is a power of two, so `cursor & (slots - 1)` is a
/// valid slot selector.
///
/// Used in: `Ring::allocate()`
macro_rules! debug_assert_power_of_two {
    ($slots:expr) => {
        debug_assert!(
            $slots.is_power_of_two(),
            "slot count {} is not a power of two",
            $slots
        )
    };
}

/// Assert that a cursor only moves forward by one.
///
/// At 10B ops/sec a `u64` cursor takes ~58 years to wrap, so any other delta
/// is a bug.
///
/// Used in: cursor commits on the non-blocking path
macro_rules! debug_assert_cursor_step {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new == $old.wrapping_add(1),
            "{} cursor jumped from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Slot state machine
// =============================================================================

/// Assert that a published state follows the one it replaces.
///
/// **Invariant**: a slot never skips a state in its cycle.
///
/// Used in: `Slot::publish()`
macro_rules! debug_assert_next_state {
    ($current:expr, $published:expr) => {
        debug_assert!(
            $current.next() == $published,
            "slot state skipped: {:?} -> {:?}",
            $current,
            $published
        )
    };
}

// =============================================================================
// Admission doors
// =============================================================================

/// Assert that only the current holder reopens a door.
///
/// **Invariant**: at most one actor per role drives a slot at a time.
///
/// Used in: `Door::leave()`
macro_rules! debug_assert_door_held {
    ($raw:expr, $closed:expr) => {
        debug_assert!(
            $raw == $closed,
            "door reopened while not held (raw value {})",
            $raw
        )
    };
}

// =============================================================================
// Wait/ignore handshake
// =============================================================================

/// Assert that a parker is signalled at most once per wait.
///
/// **Invariant**: one waiter, one signaller per role per slot.
///
/// Used in: `Parker::release()`
macro_rules! debug_assert_single_signal {
    ($proceed:expr) => {
        debug_assert!(
            !$proceed,
            "parker signalled twice before the waiter consumed the first signal"
        )
    };
}

pub(crate) use debug_assert_cursor_step;
pub(crate) use debug_assert_door_held;
pub(crate) use debug_assert_next_state;
pub(crate) use debug_assert_power_of_two;
pub(crate) use debug_assert_single_signal;
