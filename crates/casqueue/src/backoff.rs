use std::hint;
use std::thread;

/// Spin-retry pacing for the queue's busy-wait loops.
///
/// Door contention and state-publish lag are expected to clear within a few
/// iterations, so a retry first spins with PAUSE hints and only starts handing
/// the CPU back to the OS once the counterpart has clearly been descheduled.
/// It never parks: the only thread suspension in this crate is the slot
/// handshake.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding

    #[inline]
    pub(crate) fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints; never yields.
    #[inline]
    fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(Self::SPIN_LIMIT) {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Spin while the wait is short, then yield on every further retry.
    #[inline]
    pub(crate) fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            thread::yield_now();
        }
    }
}
