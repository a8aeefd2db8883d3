use crate::QueueError;

/// Slot count used when no capacity is requested.
pub const DEFAULT_CAPACITY: usize = 16384;

/// Configuration for a [`Queue`](crate::Queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested capacity; rounded up to the next power of two (default: 16384)
    pub capacity: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// Sets the requested capacity.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enables or disables metrics collection.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Returns the number of ring slots this configuration allocates.
    ///
    /// The requested capacity is rounded up to the next power of two so that
    /// `cursor & (slots - 1)` selects a slot. Zero is rejected rather than
    /// silently turned into a one-slot ring.
    pub fn slot_count(&self) -> Result<usize, QueueError> {
        if self.capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        self.capacity
            .checked_next_power_of_two()
            .ok_or(QueueError::CapacityOverflow {
                requested: self.capacity,
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (1K slots, fits in L1/L2 for small payloads)
pub const LOW_LATENCY_CONFIG: Config = Config::new(1024, false);

/// High throughput configuration (64K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(65536, false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_up_to_power_of_two() {
        assert_eq!(Config::new(1000, false).slot_count(), Ok(1024));
        assert_eq!(Config::new(16, false).slot_count(), Ok(16));
        assert_eq!(Config::new(17, false).slot_count(), Ok(32));
        assert_eq!(Config::new(1, false).slot_count(), Ok(1));
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(Config::default().slot_count(), Ok(DEFAULT_CAPACITY));
        assert!(!Config::default().enable_metrics);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            Config::new(0, false).slot_count(),
            Err(QueueError::ZeroCapacity)
        );
    }

    #[test]
    fn test_overflow_rejected() {
        let requested = usize::MAX;
        assert_eq!(
            Config::new(requested, false).slot_count(),
            Err(QueueError::CapacityOverflow { requested })
        );
    }

    #[test]
    fn test_builders() {
        let config = LOW_LATENCY_CONFIG.with_capacity(100).with_metrics(true);
        assert_eq!(config.capacity, 100);
        assert!(config.enable_metrics);
        assert_eq!(HIGH_THROUGHPUT_CONFIG.slot_count(), Ok(65536));
    }
}
