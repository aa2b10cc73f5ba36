//! Fixed-capacity sample log with a trimmed-mean estimate
//!
//! Each analog channel owns one [`SampleLog`]: a circular buffer of the 50
//! most recent raw readings. The estimate discards the 10 lowest and 10
//! highest entries once the log has filled, which rejects switch bounce and
//! ADC glitches without tracking a running distribution; the installation
//! cares about the steady-state knob position, not extremes.

/// Number of raw readings retained per channel
pub const SAMPLE_LOG_CAPACITY: usize = 50;

/// Entries discarded from each end of the sorted log (20% per tail)
pub const TRIM_PER_TAIL: usize = SAMPLE_LOG_CAPACITY / 5;

/// Circular log of the most recent raw readings of one channel
///
/// `record` is O(1) and cannot fail; it is safe to call from the
/// acquisition tick. `wrapped` flips exactly when the cursor returns to
/// slot zero after a write and stays set until an explicit [`reset`].
///
/// [`reset`]: SampleLog::reset
#[derive(Debug, Clone)]
pub struct SampleLog {
    buf: [u16; SAMPLE_LOG_CAPACITY],
    cursor: usize,
    wrapped: bool,
}

impl Default for SampleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            buf: [0; SAMPLE_LOG_CAPACITY],
            cursor: 0,
            wrapped: false,
        }
    }

    /// Append a reading, overwriting the oldest entry when full
    pub fn record(&mut self, raw: u16) {
        self.buf[self.cursor] = raw;
        self.cursor = (self.cursor + 1) % SAMPLE_LOG_CAPACITY;
        if self.cursor == 0 {
            self.wrapped = true;
        }
    }

    /// Number of readings available for the estimate
    pub fn len(&self) -> usize {
        if self.wrapped {
            SAMPLE_LOG_CAPACITY
        } else {
            self.cursor
        }
    }

    /// True while no reading has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the log has been filled at least once
    pub fn has_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Forget all recorded readings
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.wrapped = false;
    }

    /// Robust scalar estimate of the channel value
    ///
    /// Before the log wraps this is the rounded (half-up) mean of the
    /// readings recorded so far. Once full, the readings are copied,
    /// sorted, trimmed by [`TRIM_PER_TAIL`] on each side, and the rounded
    /// mean of the middle band is returned.
    ///
    /// # Panics
    ///
    /// Panics if no reading has been recorded yet; callers must record at
    /// least one sample first.
    pub fn estimate(&self) -> u16 {
        assert!(!self.is_empty(), "estimate on an empty sample log");

        if !self.wrapped {
            let count = self.cursor as u32;
            let sum: u32 = self.buf[..self.cursor].iter().map(|&v| u32::from(v)).sum();
            return ((sum + count / 2) / count) as u16;
        }

        let mut sorted = self.buf;
        sorted.sort();
        let band = &sorted[TRIM_PER_TAIL..SAMPLE_LOG_CAPACITY - TRIM_PER_TAIL];
        let count = band.len() as u32;
        let sum: u32 = band.iter().map(|&v| u32::from(v)).sum();
        ((sum + count / 2) / count) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partial_log_uses_plain_mean() {
        let mut log = SampleLog::new();
        log.record(10);
        log.record(20);
        log.record(21);
        // (10 + 20 + 21 + 1) / 3 rounds half-up to 17
        assert_eq!(log.estimate(), 17);
        assert_eq!(log.len(), 3);
        assert!(!log.has_wrapped());
    }

    #[test]
    fn test_single_sample() {
        let mut log = SampleLog::new();
        log.record(777);
        assert_eq!(log.estimate(), 777);
    }

    #[test]
    #[should_panic(expected = "empty sample log")]
    fn test_estimate_on_empty_log_panics() {
        SampleLog::new().estimate();
    }

    #[test]
    fn test_wrap_happens_exactly_on_capacity() {
        let mut log = SampleLog::new();
        for _ in 0..SAMPLE_LOG_CAPACITY - 1 {
            log.record(100);
        }
        assert!(!log.has_wrapped());
        log.record(100);
        assert!(log.has_wrapped());
        assert_eq!(log.len(), SAMPLE_LOG_CAPACITY);
    }

    #[test]
    fn test_trimmed_mean_ignores_outliers() {
        let mut log = SampleLog::new();
        // 10 spikes low, 10 spikes high, 30 readings sitting at 500
        for _ in 0..10 {
            log.record(0);
        }
        for _ in 0..10 {
            log.record(1023);
        }
        for _ in 0..30 {
            log.record(500);
        }
        assert!(log.has_wrapped());
        assert_eq!(log.estimate(), 500);
    }

    #[test]
    fn test_trimmed_mean_of_mixed_band() {
        let mut log = SampleLog::new();
        // Middle band after sorting: 15 readings of 400 and 15 of 401
        for _ in 0..10 {
            log.record(0);
        }
        for _ in 0..15 {
            log.record(400);
        }
        for _ in 0..15 {
            log.record(401);
        }
        for _ in 0..10 {
            log.record(1023);
        }
        // mean 400.5 rounds half-up to 401
        assert_eq!(log.estimate(), 401);
    }

    #[test]
    fn test_overwrite_drops_oldest() {
        let mut log = SampleLog::new();
        for _ in 0..SAMPLE_LOG_CAPACITY {
            log.record(0);
        }
        // A full capacity of fresh readings leaves no trace of the zeros
        for _ in 0..SAMPLE_LOG_CAPACITY {
            log.record(800);
        }
        assert_eq!(log.estimate(), 800);
    }

    #[test]
    fn test_reset_clears_wrapped_flag() {
        let mut log = SampleLog::new();
        for _ in 0..SAMPLE_LOG_CAPACITY + 5 {
            log.record(42);
        }
        assert!(log.has_wrapped());
        log.reset();
        assert!(log.is_empty());
        assert!(!log.has_wrapped());
        log.record(7);
        assert_eq!(log.estimate(), 7);
    }

    proptest! {
        /// The estimate never leaves the range of the recorded samples.
        #[test]
        fn prop_estimate_bounded(samples in proptest::collection::vec(0u16..1024, 1..200)) {
            let mut log = SampleLog::new();
            for &s in &samples {
                log.record(s);
            }
            let est = log.estimate();
            let min = *samples.iter().min().unwrap();
            let max = *samples.iter().max().unwrap();
            prop_assert!(est >= min && est <= max);
        }

        /// A constant signal estimates to itself regardless of length.
        #[test]
        fn prop_constant_signal_is_identity(value in 0u16..1024, count in 1usize..150) {
            let mut log = SampleLog::new();
            for _ in 0..count {
                log.record(value);
            }
            prop_assert_eq!(log.estimate(), value);
        }
    }
}
