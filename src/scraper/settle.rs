use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::SettleSection;

use super::driver::PageDriver;
use super::pacing::{intelligent_delay, JitterSource, PacingState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleOutcome {
    pub success: bool,
    pub new_items_found: u32,
}

/// Incremental scroll followed by a monitored wait for content growth.
///
/// DOM failures mid-loop are swallowed and logged; a flaky recount must not
/// abort the wait, so `run` is infallible. Callers
/// own the [`PacingState`] and should record one interaction per invocation;
/// a hard upper bound on total time belongs to a caller-level timeout
/// wrapped around the whole call.
pub struct ScrollSettleLoop {
    config: SettleSection,
}

impl ScrollSettleLoop {
    pub fn new(config: SettleSection) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        state: &PacingState,
        jitter: &mut dyn JitterSource,
    ) -> SettleOutcome {
        let initial_count = match driver.count_matches(&self.config.anchor_selector).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "initial anchor count failed, assuming empty page");
                0
            }
        };

        self.scroll_in_increments(driver, state, jitter).await;
        sleep(jitter.range_ms(self.config.settle_pause_ms)).await;

        let depth = match driver.scroll_depth_px().await {
            Ok(depth) => depth,
            Err(err) => {
                debug!(error = %err, "scroll depth unavailable, using zero");
                0
            }
        };
        let budget = intelligent_delay(depth, state.consecutive_duplicates(), jitter);
        debug!(
            initial_count,
            depth_px = depth,
            budget_ms = budget.as_millis() as u64,
            "entering settle wait"
        );

        self.poll_for_growth(driver, initial_count, budget).await
    }

    async fn scroll_in_increments(
        &self,
        driver: &dyn PageDriver,
        state: &PacingState,
        jitter: &mut dyn JitterSource,
    ) {
        let viewport = match driver.viewport_height().await {
            Ok(height) => height,
            Err(err) => {
                warn!(error = %err, "viewport height unavailable, using fallback");
                720.0
            }
        };
        let total_distance = viewport * state.scroll_multiplier();
        let increment = f64::from(self.config.scroll_increment_px.max(1));
        let steps = (total_distance / increment).ceil().max(1.0) as u32;
        debug!(
            total_px = total_distance as i64,
            steps, "scrolling in increments"
        );
        for _ in 0..steps {
            if let Err(err) = driver.scroll_by(increment).await {
                debug!(error = %err, "scroll increment failed, continuing");
            }
            // Short randomized pause per increment so the scroll cadence
            // reads as organic rather than a single synthetic jump.
            sleep(jitter.range_ms(self.config.increment_pause_ms)).await;
        }
    }

    async fn poll_for_growth(
        &self,
        driver: &dyn PageDriver,
        initial_count: u32,
        budget: Duration,
    ) -> SettleOutcome {
        let tick = Duration::from_millis(self.config.poll_tick_ms.max(1));
        let mut waited = Duration::ZERO;
        let mut last_count = initial_count;
        let mut unchanged_ticks = 0u32;
        let mut new_items = 0u32;

        while waited < budget {
            sleep(tick).await;
            waited += tick;

            let current = match driver.count_matches(&self.config.anchor_selector).await {
                Ok(count) => count,
                Err(err) => {
                    debug!(error = %err, "anchor recount failed, keeping last count");
                    last_count
                }
            };
            new_items = current.saturating_sub(initial_count);

            if new_items >= self.config.early_exit_new_items {
                info!(new_items, waited_ms = waited.as_millis() as u64, "batch rendered, early exit");
                return SettleOutcome {
                    success: true,
                    new_items_found: new_items,
                };
            }

            if current == last_count {
                unchanged_ticks += 1;
                if unchanged_ticks >= self.config.stable_ticks && new_items > 0 {
                    info!(new_items, "content stabilized after growth");
                    return SettleOutcome {
                        success: true,
                        new_items_found: new_items,
                    };
                }
            } else {
                unchanged_ticks = 0;
                last_count = current;
            }
        }

        if new_items == 0 {
            // Probable end of feed; the caller decides whether to move on.
            info!(budget_ms = budget.as_millis() as u64, "no growth within budget");
            SettleOutcome {
                success: false,
                new_items_found: 0,
            }
        } else {
            SettleOutcome {
                success: true,
                new_items_found: new_items,
            }
        }
    }
}
