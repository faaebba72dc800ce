//! # Timed latch
//!
//! A "has at least X ms elapsed since it was started" predicate, the building block of every
//! wait in the autonomous routine. Times are milliseconds since the start of the run, supplied by
//! the caller on every query so the latch never reads a clock itself.

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedLatch {
    /// Time at which the latch was last started, `None` if it never has been.
    start_ms: Option<f64>,

    /// Time which must elapse after the start before the latch expires.
    threshold_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TimedLatch {
    /// Create a new, unstarted latch. Negative thresholds are treated as zero.
    pub fn new(threshold_ms: f64) -> Self {
        Self {
            start_ms: None,
            threshold_ms: threshold_ms.max(0.0),
        }
    }

    /// Start (or restart) the latch at the given time.
    pub fn start(&mut self, now_ms: f64) {
        self.start_ms = Some(now_ms);
    }

    /// Returns true once the threshold has elapsed since the latch was started. An unstarted latch
    /// never expires.
    pub fn is_expired(&self, now_ms: f64) -> bool {
        match self.elapsed_ms(now_ms) {
            Some(e) => e >= self.threshold_ms,
            None => false,
        }
    }

    /// Time elapsed since the latch was started.
    pub fn elapsed_ms(&self, now_ms: f64) -> Option<f64> {
        self.start_ms.map(|s| now_ms - s)
    }

    /// Time left before the latch expires, saturating at zero.
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        match self.elapsed_ms(now_ms) {
            Some(e) => (self.threshold_ms - e).max(0.0),
            None => self.threshold_ms,
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_ms.is_some()
    }

    pub fn threshold_ms(&self) -> f64 {
        self.threshold_ms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_latch_expiry() {
        let mut latch = TimedLatch::new(200.0);
        assert!(!latch.is_expired(1000.0));
        assert!(!latch.is_started());

        latch.start(100.0);
        assert!(!latch.is_expired(100.0));
        assert!(!latch.is_expired(299.0));
        assert!(latch.is_expired(300.0));
        assert!(latch.is_expired(5000.0));

        assert_eq!(latch.elapsed_ms(150.0), Some(50.0));
        assert_eq!(latch.remaining_ms(150.0), 150.0);
        assert_eq!(latch.remaining_ms(400.0), 0.0);
    }

    #[test]
    fn test_latch_restart() {
        let mut latch = TimedLatch::new(200.0);
        latch.start(0.0);
        assert!(latch.is_expired(250.0));

        latch.start(250.0);
        assert!(!latch.is_expired(300.0));
        assert!(latch.is_expired(450.0));
    }

    #[test]
    fn test_zero_threshold() {
        let mut latch = TimedLatch::new(-10.0);
        assert_eq!(latch.threshold_ms(), 0.0);

        latch.start(42.0);
        assert!(latch.is_expired(42.0));
    }
}
