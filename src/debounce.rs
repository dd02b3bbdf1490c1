//! Press aggregation for multi-press remote commands
//!
//! A remote control only sends one key at a time, so numbers with more than
//! one digit and "press N times to confirm" actions are built from a run of
//! presses that arrive close together. Each purpose owns its own
//! [`PressSequence`]; sequences never share state.

use std::time::{Duration, Instant};

/// One run of related key presses
///
/// A press extends the current run when it arrives at most `window` after the
/// previous press of the same run; otherwise the run restarts from zero.
#[derive(Debug, Clone)]
pub struct PressSequence {
    window: Duration,
    last_press: Option<Instant>,
    accumulated: u64,
}

impl PressSequence {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_press: None,
            accumulated: 0,
        }
    }

    /// Change the inter-press window (config reload); the running sequence is kept
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Current accumulated value
    pub fn value(&self) -> u64 {
        self.accumulated
    }

    /// Fold a press into the sequence and return the new accumulated value
    pub fn record_with<F>(&mut self, now: Instant, fold: F) -> u64
    where
        F: FnOnce(u64) -> u64,
    {
        let continues = self
            .last_press
            .map(|last| now.saturating_duration_since(last) <= self.window)
            .unwrap_or(false);

        let base = if continues { self.accumulated } else { 0 };
        self.accumulated = fold(base);
        self.last_press = Some(now);
        self.accumulated
    }

    /// Numeric entry: append a decimal digit
    pub fn record_digit(&mut self, now: Instant, digit: u8) -> u64 {
        self.record_with(now, |prev| {
            prev.saturating_mul(10).saturating_add(u64::from(digit))
        })
    }

    /// Press counter: count one more press
    pub fn record_count(&mut self, now: Instant) -> u64 {
        self.record_with(now, |prev| prev.saturating_add(1))
    }

    /// Count a press against `threshold`
    ///
    /// Returns true on the press that reaches the threshold and resets the
    /// count to zero, so the following press starts a fresh run.
    pub fn confirm(&mut self, now: Instant, threshold: u32) -> bool {
        let count = self.record_count(now);
        if count >= u64::from(threshold.max(1)) {
            self.accumulated = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_numeric_entry_within_window() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));

        assert_eq!(seq.record_digit(t0, 1), 1);
        assert_eq!(seq.record_digit(t0 + secs(1.0), 2), 12);
        // Window elapsed: new sequence
        assert_eq!(seq.record_digit(t0 + secs(5.0), 3), 3);
    }

    #[test]
    fn test_gap_equal_to_window_continues() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));

        seq.record_digit(t0, 4);
        assert_eq!(seq.record_digit(t0 + secs(2.0), 2), 42);
    }

    #[test]
    fn test_counter_resets_after_threshold() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));

        assert!(!seq.confirm(t0, 2));
        assert!(seq.confirm(t0 + secs(1.0), 2));
        assert_eq!(seq.value(), 0);

        // Third press starts a fresh count even though it is inside the window
        assert!(!seq.confirm(t0 + secs(1.5), 2));
        assert_eq!(seq.value(), 1);
    }

    #[test]
    fn test_counter_window_expiry_restarts_count() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));

        assert!(!seq.confirm(t0, 3));
        assert!(!seq.confirm(t0 + secs(1.0), 3));
        assert!(!seq.confirm(t0 + secs(4.0), 3));
        assert_eq!(seq.value(), 1);
    }

    #[test]
    fn test_threshold_of_one_triggers_every_press() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));

        assert!(seq.confirm(t0, 1));
        assert!(seq.confirm(t0 + secs(0.5), 1));
        // Zero is treated as one
        assert!(seq.confirm(t0 + secs(0.6), 0));
    }

    #[test]
    fn test_independent_sequences() {
        let t0 = Instant::now();
        let mut digits = PressSequence::new(secs(2.0));
        let mut power = PressSequence::new(secs(2.0));

        digits.record_digit(t0, 5);
        power.record_count(t0 + secs(0.1));
        assert_eq!(digits.record_digit(t0 + secs(0.2), 1), 51);
        assert_eq!(power.value(), 1);
    }

    #[test]
    fn test_digit_overflow_saturates() {
        let t0 = Instant::now();
        let mut seq = PressSequence::new(secs(2.0));
        for _ in 0..30 {
            seq.record_digit(t0, 9);
        }
        assert_eq!(seq.value(), u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_second_press_folds_on_first(
            first in 0u8..10,
            second in 0u8..10,
            window_ms in 1u64..5_000,
            gap_ms in 0u64..10_000,
        ) {
            let t0 = Instant::now();
            let mut seq = PressSequence::new(Duration::from_millis(window_ms));

            let first_value = seq.record_digit(t0, first);
            let second_value = seq.record_digit(t0 + Duration::from_millis(gap_ms), second);

            if gap_ms <= window_ms {
                prop_assert_eq!(second_value, first_value * 10 + u64::from(second));
            } else {
                prop_assert_eq!(second_value, u64::from(second));
            }
        }
    }
}
