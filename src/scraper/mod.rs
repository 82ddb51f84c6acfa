mod classifier;
mod driver;
mod error;
mod pacing;
mod resilience;
mod rotation;
mod session;
mod settle;
mod watchdog;

pub use classifier::{BlockClassification, ChallengeInfo, DetectionRules, NavigationOutcome};
pub use driver::{CdpDriver, NavigateOptions, NavigationResult, PageDriver};
pub use error::{ScrapeError, ScrapeResult};
pub use pacing::{
    intelligent_delay, scroll_multiplier, FixedJitter, JitterSource, PacingState, SeededJitter,
    ThreadRngJitter,
};
pub use resilience::ResilienceTracker;
pub use rotation::{AccountHandle, AccountRotation};
pub use session::{SessionReset, SessionResetReport};
pub use settle::{ScrollSettleLoop, SettleOutcome};
pub use watchdog::NavigationWatchdog;
