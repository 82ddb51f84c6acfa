use std::sync::Arc;

use tracing::{debug, warn};

use super::classifier::{BlockClassification, DetectionRules, NavigationOutcome};
use super::driver::{NavigateOptions, PageDriver};
use super::error::{ScrapeError, ScrapeResult};
use super::rotation::AccountRotation;

/// Performs exactly one navigation and one classification pass. Retry and
/// rotation policy belong to the caller; the watchdog never loops.
pub struct NavigationWatchdog {
    rules: DetectionRules,
    rotation: Arc<dyn AccountRotation>,
}

impl NavigationWatchdog {
    pub fn new(rules: DetectionRules, rotation: Arc<dyn AccountRotation>) -> Self {
        Self { rules, rotation }
    }

    /// Navigate and classify the landing state. Driver-level timeouts
    /// surface as [`ScrapeError::NavigationTimeout`] without entering the
    /// classifier; every non-clean classification maps 1:1 to an error
    /// variant of the same name.
    pub async fn navigate(
        &self,
        driver: &dyn PageDriver,
        url: &str,
        opts: &NavigateOptions,
    ) -> ScrapeResult<()> {
        let navigation = driver.navigate_to(url, opts).await?;
        let final_url = match driver.current_url().await {
            Ok(current) => current,
            Err(err) => {
                debug!(error = %err, "current-url read failed, using navigation result");
                navigation.final_url.clone()
            }
        };
        let body_snapshot = match driver.body_text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(url, error = %err, "body text unavailable, classifying without it");
                String::new()
            }
        };
        let outcome = NavigationOutcome {
            final_url,
            http_status: navigation.http_status,
            body_snapshot,
            challenge: None,
        };

        match self.rules.classify(&outcome) {
            BlockClassification::Ok => {
                debug!(url, final_url = %outcome.final_url, "navigation clean");
                Ok(())
            }
            BlockClassification::RateLimited => {
                warn!(url, "navigation rate limited");
                Err(ScrapeError::RateLimited)
            }
            BlockClassification::Challenge { kind, message } => {
                warn!(url, kind = %kind, "security challenge raised");
                Err(ScrapeError::Challenge { kind, message })
            }
            BlockClassification::ServerError { status } => {
                warn!(url, status, "target server error");
                Err(ScrapeError::ServerError { status })
            }
            BlockClassification::ServiceUnavailable => {
                warn!(url, "target service unavailable, restart expected");
                Err(ScrapeError::ServiceUnavailable)
            }
            BlockClassification::GenericBlock { reason } => {
                warn!(url, reason = %reason, "generic block detected");
                // Cool-down must be active before the caller sees the error,
                // so the rotation hook is awaited here, not left to them.
                self.rotation
                    .record_failure("generic_block", &reason)
                    .await;
                Err(ScrapeError::GenericBlock { reason })
            }
        }
    }
}
