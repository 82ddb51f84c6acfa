use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Hard ceiling on the scroll multiplier. Very large single scrolls trip the
/// target's virtualized-list defenses.
pub const MAX_SCROLL_MULTIPLIER: f64 = 2.5;

/// Injected randomness so the pacing functions stay pure and testable.
/// `sample` returns a value in `[0, 1)`.
pub trait JitterSource: Send {
    fn sample(&mut self) -> f64;

    /// Uniform duration inside inclusive millisecond bounds.
    fn range_ms(&mut self, bounds: [u64; 2]) -> Duration {
        let lower = bounds[0].min(bounds[1]);
        let upper = bounds[0].max(bounds[1]);
        let span = (upper - lower) as f64 + 1.0;
        Duration::from_millis(lower + (self.sample() * span) as u64)
    }
}

/// Live source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source for reproducible pacing runs.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: ChaCha8Rng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Constant source. `FixedJitter(0.5)` cancels the perturbation entirely.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Per-task interaction-pressure counters. Owned by one task loop; never
/// shared across sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacingState {
    consecutive_duplicates: u32,
    cumulative_interactions: u32,
}

impl PacingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_duplicates(&self) -> u32 {
        self.consecutive_duplicates
    }

    pub fn cumulative_interactions(&self) -> u32 {
        self.cumulative_interactions
    }

    pub fn record_duplicate(&mut self) {
        self.consecutive_duplicates = self.consecutive_duplicates.saturating_add(1);
    }

    pub fn record_new_content(&mut self) {
        self.consecutive_duplicates = 0;
    }

    /// Monotonic pressure signal for the lifetime of the task. There is
    /// deliberately no way to decrement or reset it.
    pub fn record_interaction(&mut self) {
        self.cumulative_interactions = self.cumulative_interactions.saturating_add(1);
    }

    pub fn scroll_multiplier(&self) -> f64 {
        scroll_multiplier(self.consecutive_duplicates, self.cumulative_interactions)
    }
}

/// Scroll-distance multiplier from duplicate pressure and session-long
/// interaction pressure.
///
/// The base curve is flat above 3 duplicates (0.5 below, 1.5 at or above);
/// escalation past that comes entirely from the interaction boost, which
/// applies only its highest matching tier.
pub fn scroll_multiplier(consecutive_duplicates: u32, cumulative_interactions: u32) -> f64 {
    let base: f64 = if consecutive_duplicates < 3 { 0.5 } else { 1.5 };
    let boost = if cumulative_interactions >= 32 {
        1.4
    } else if cumulative_interactions >= 24 {
        1.3
    } else if cumulative_interactions >= 18 {
        1.2
    } else if cumulative_interactions >= 12 {
        1.1
    } else {
        1.0
    };
    (base * boost).min(MAX_SCROLL_MULTIPLIER)
}

/// Wait budget for the settle loop: a step function of scroll depth, scaled
/// by duplicate pressure (highest matching tier only), then perturbed by a
/// uniform ±20% human-variation jitter.
pub fn intelligent_delay(
    scroll_depth_px: u32,
    consecutive_duplicates: u32,
    jitter: &mut dyn JitterSource,
) -> Duration {
    let base_ms: f64 = if scroll_depth_px < 2_000 {
        6_500.0
    } else if scroll_depth_px < 5_000 {
        12_000.0
    } else if scroll_depth_px < 10_000 {
        18_000.0
    } else {
        25_000.0
    };
    let duplicate_multiplier = if consecutive_duplicates >= 6 {
        1.5
    } else if consecutive_duplicates >= 3 {
        1.25
    } else {
        1.0
    };
    let variation = 1.0 + jitter.sample() * 0.4 - 0.2;
    Duration::from_millis((base_ms * duplicate_multiplier * variation).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn multiplier_base_tiers() {
        approx(scroll_multiplier(0, 0), 0.5);
        approx(scroll_multiplier(2, 0), 0.5);
        approx(scroll_multiplier(3, 0), 1.5);
        // Flat above the threshold: 6+ duplicates stay at the same base.
        approx(scroll_multiplier(6, 0), 1.5);
        approx(scroll_multiplier(40, 0), 1.5);
    }

    #[test]
    fn multiplier_interaction_boost_highest_tier_only() {
        approx(scroll_multiplier(0, 11), 0.5);
        approx(scroll_multiplier(0, 12), 0.55);
        approx(scroll_multiplier(0, 18), 0.6);
        approx(scroll_multiplier(0, 24), 0.65);
        approx(scroll_multiplier(0, 32), 0.7);
        approx(scroll_multiplier(6, 32), 2.1);
    }

    #[test]
    fn multiplier_monotonic_and_bounded() {
        let duplicates = [0u32, 1, 2, 3, 5, 6, 10, 50];
        let interactions = [0u32, 11, 12, 17, 18, 23, 24, 31, 32, 100];
        for window in interactions.windows(2) {
            for &d in &duplicates {
                assert!(scroll_multiplier(d, window[0]) <= scroll_multiplier(d, window[1]));
            }
        }
        for window in duplicates.windows(2) {
            for &c in &interactions {
                assert!(scroll_multiplier(window[0], c) <= scroll_multiplier(window[1], c));
            }
        }
        for &d in &duplicates {
            for &c in &interactions {
                let m = scroll_multiplier(d, c);
                assert!((0.5..=MAX_SCROLL_MULTIPLIER).contains(&m));
            }
        }
    }

    #[test]
    fn delay_depth_steps_with_neutral_jitter() {
        let mut jitter = FixedJitter(0.5);
        assert_eq!(intelligent_delay(0, 0, &mut jitter).as_millis(), 6_500);
        assert_eq!(intelligent_delay(1_000, 0, &mut jitter).as_millis(), 6_500);
        assert_eq!(intelligent_delay(2_000, 0, &mut jitter).as_millis(), 12_000);
        assert_eq!(intelligent_delay(5_000, 0, &mut jitter).as_millis(), 18_000);
        assert_eq!(
            intelligent_delay(10_000, 0, &mut jitter).as_millis(),
            25_000
        );
    }

    #[test]
    fn delay_duplicate_multiplier() {
        let mut jitter = FixedJitter(0.5);
        assert_eq!(intelligent_delay(1_000, 3, &mut jitter).as_millis(), 8_125);
        assert_eq!(
            intelligent_delay(11_000, 6, &mut jitter).as_millis(),
            37_500
        );
    }

    #[test]
    fn delay_jitter_spans_plus_minus_twenty_percent() {
        let mut low = FixedJitter(0.0);
        assert_eq!(intelligent_delay(1_000, 0, &mut low).as_millis(), 5_200);
        let mut high = FixedJitter(0.999_999);
        let ms = intelligent_delay(1_000, 0, &mut high).as_millis();
        assert!(ms > 7_700 && ms <= 7_800, "got {ms}");
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = SeededJitter::new(7);
        let mut b = SeededJitter::new(7);
        for _ in 0..16 {
            let sample = a.sample();
            assert!((0.0..1.0).contains(&sample));
            assert_eq!(sample.to_bits(), b.sample().to_bits());
        }
    }

    #[test]
    fn pacing_state_counters() {
        let mut state = PacingState::new();
        state.record_interaction();
        state.record_duplicate();
        state.record_duplicate();
        assert_eq!(state.consecutive_duplicates(), 2);
        assert_eq!(state.cumulative_interactions(), 1);
        state.record_new_content();
        assert_eq!(state.consecutive_duplicates(), 0);
        // Interactions survive a content reset.
        assert_eq!(state.cumulative_interactions(), 1);
        approx(state.scroll_multiplier(), 0.5);
    }
}
