use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

const SKIP_THRESHOLD: u32 = 5;
const ADAPTIVE_GROWTH: f64 = 1.25;
const ADAPTIVE_DECAY: f64 = 0.9;
const ADAPTIVE_FLOOR: f64 = 1.0;
const ADAPTIVE_CEILING: f64 = 5.0;

/// Process-wide attempt counters. Advisory only: `should_skip_current_task`
/// is a recommendation for the task runner, never an enforced abort.
///
/// Construct one per engine instance and share it by `Arc`; counters are
/// atomic so concurrent sessions in the same process stay safe. Counters are
/// cumulative for the tracker's lifetime; embedders wanting per-target
/// isolation create one tracker per target.
#[derive(Debug)]
pub struct ResilienceTracker {
    consecutive_errors: AtomicU32,
    total_success: AtomicU64,
    total_errors: AtomicU64,
    session_recoveries: AtomicU32,
    adaptive_multiplier_bits: AtomicU64,
}

impl Default for ResilienceTracker {
    fn default() -> Self {
        Self {
            consecutive_errors: AtomicU32::new(0),
            total_success: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            session_recoveries: AtomicU32::new(0),
            adaptive_multiplier_bits: AtomicU64::new(ADAPTIVE_FLOOR.to_bits()),
        }
    }
}

impl ResilienceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.total_success.fetch_add(1, Ordering::Relaxed);
        self.consecutive_errors.store(0, Ordering::Relaxed);
        self.update_multiplier(|m| (m * ADAPTIVE_DECAY).max(ADAPTIVE_FLOOR));
    }

    pub fn record_failure(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
        self.consecutive_errors.fetch_add(1, Ordering::Relaxed);
        self.update_multiplier(|m| (m * ADAPTIVE_GROWTH).min(ADAPTIVE_CEILING));
    }

    pub fn record_session_recovery(&self) {
        self.session_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn should_skip_current_task(&self) -> bool {
        self.consecutive_errors.load(Ordering::Relaxed) >= SKIP_THRESHOLD
    }

    pub fn success_rate(&self) -> f64 {
        let success = self.total_success.load(Ordering::Relaxed) as f64;
        let errors = self.total_errors.load(Ordering::Relaxed) as f64;
        if success + errors == 0.0 {
            0.0
        } else {
            success / (success + errors)
        }
    }

    pub fn adaptive_delay_multiplier(&self) -> f64 {
        f64::from_bits(self.adaptive_multiplier_bits.load(Ordering::Relaxed))
    }

    /// Stretch a base delay by the current adaptive multiplier.
    pub fn scaled(&self, base: Duration) -> Duration {
        base.mul_f64(self.adaptive_delay_multiplier())
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::Relaxed)
    }

    pub fn total_success(&self) -> u64 {
        self.total_success.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    pub fn session_recoveries(&self) -> u32 {
        self.session_recoveries.load(Ordering::Relaxed)
    }

    fn update_multiplier(&self, apply: impl Fn(f64) -> f64) {
        let _ = self
            .adaptive_multiplier_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some(apply(f64::from_bits(bits)).to_bits())
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_after_five_consecutive_failures() {
        let tracker = ResilienceTracker::new();
        for _ in 0..4 {
            tracker.record_failure();
            assert!(!tracker.should_skip_current_task());
        }
        tracker.record_failure();
        assert!(tracker.should_skip_current_task());

        tracker.record_success();
        assert!(!tracker.should_skip_current_task());
        assert_eq!(tracker.consecutive_errors(), 0);
        // Totals are cumulative, not windowed.
        assert_eq!(tracker.total_errors(), 5);
        assert_eq!(tracker.total_success(), 1);
    }

    #[test]
    fn success_rate_zero_without_attempts() {
        let tracker = ResilienceTracker::new();
        assert_eq!(tracker.success_rate(), 0.0);
        tracker.record_success();
        tracker.record_success();
        tracker.record_success();
        tracker.record_failure();
        assert!((tracker.success_rate() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn adaptive_multiplier_grows_capped_and_decays_floored() {
        let tracker = ResilienceTracker::new();
        assert_eq!(tracker.adaptive_delay_multiplier(), 1.0);
        tracker.record_failure();
        assert!((tracker.adaptive_delay_multiplier() - 1.25).abs() < 1e-9);
        for _ in 0..50 {
            tracker.record_failure();
        }
        assert_eq!(tracker.adaptive_delay_multiplier(), 5.0);
        for _ in 0..200 {
            tracker.record_success();
        }
        assert_eq!(tracker.adaptive_delay_multiplier(), 1.0);
    }

    #[test]
    fn scaled_delay_applies_multiplier() {
        let tracker = ResilienceTracker::new();
        tracker.record_failure();
        let scaled = tracker.scaled(Duration::from_millis(1_000));
        assert_eq!(scaled.as_millis(), 1_250);
    }

    #[test]
    fn session_recoveries_accumulate() {
        let tracker = ResilienceTracker::new();
        tracker.record_session_recovery();
        tracker.record_session_recovery();
        assert_eq!(tracker.session_recoveries(), 2);
    }
}
