use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a queue's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub produced: u64,
    pub consumed: u64,
    /// Producers that suspended on a slot waiting for a consumer.
    pub producer_parks: u64,
    /// Consumers that suspended on a slot waiting for a producer.
    pub consumer_parks: u64,
    pub full_rejections: u64,
    pub empty_rejections: u64,
    /// Retries spent waiting at a closed admission door.
    pub latch_spins: u64,
}

/// Optional counters for monitoring queue behaviour.
///
/// All updates are `Relaxed`: the counters are diagnostics and never order
/// any slot access.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    produced: AtomicU64,
    consumed: AtomicU64,
    producer_parks: AtomicU64,
    consumer_parks: AtomicU64,
    full_rejections: AtomicU64,
    empty_rejections: AtomicU64,
    latch_spins: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_producer_park(&self) {
        self.producer_parks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_consumer_park(&self) {
        self.consumer_parks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_full_rejection(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_empty_rejection(&self) {
        self.empty_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_latch_spins(&self, spins: u64) {
        if spins > 0 {
            self.latch_spins.fetch_add(spins, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            producer_parks: self.producer_parks.load(Ordering::Relaxed),
            consumer_parks: self.consumer_parks.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_rejections: self.empty_rejections.load(Ordering::Relaxed),
            latch_spins: self.latch_spins.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let m = Metrics::new();
        m.add_produced();
        m.add_produced();
        m.add_consumed();
        m.add_full_rejection();
        m.add_latch_spins(0);
        m.add_latch_spins(3);

        let s = m.snapshot();
        assert_eq!(s.produced, 2);
        assert_eq!(s.consumed, 1);
        assert_eq!(s.full_rejections, 1);
        assert_eq!(s.empty_rejections, 0);
        assert_eq!(s.latch_spins, 3);
    }
}
