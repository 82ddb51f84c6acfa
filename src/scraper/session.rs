use std::io::ErrorKind;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::config::NavigationSection;

use super::driver::{NavigateOptions, PageDriver};
use super::rotation::AccountHandle;

/// What actually happened during a reset. Every field is best-effort; a
/// false entry is logged, never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResetReport {
    pub home_reached: bool,
    pub logged_out: bool,
    pub cookies_cleared: bool,
    pub credential_file_removed: bool,
    pub login_cache_cleared: bool,
}

impl SessionResetReport {
    pub fn fully_clean(&self) -> bool {
        self.home_reached
            && self.logged_out
            && self.cookies_cleared
            && self.credential_file_removed
            && self.login_cache_cleared
    }
}

/// Best-effort identity teardown used during account rotation, never on
/// normal task completion. Each step is independently fault-tolerant so a
/// missing logout UI cannot prevent cookie clearing or credential-file
/// deletion from running.
pub struct SessionReset {
    home_url: String,
    logout_url: String,
    navigate: NavigateOptions,
    logged_in_as: Mutex<Option<String>>,
}

impl SessionReset {
    pub fn new(section: &NavigationSection) -> Self {
        Self {
            home_url: section.home_url.clone(),
            logout_url: section.logout_url.clone(),
            navigate: NavigateOptions::from_section(section),
            logged_in_as: Mutex::new(None),
        }
    }

    /// Cache the identity detected by the caller so `reset` can clear it.
    pub fn note_logged_in(&self, username: impl Into<String>) {
        if let Ok(mut guard) = self.logged_in_as.lock() {
            *guard = Some(username.into());
        }
    }

    pub fn logged_in_as(&self) -> Option<String> {
        self.logged_in_as.lock().ok().and_then(|guard| guard.clone())
    }

    pub async fn reset(
        &self,
        driver: &dyn PageDriver,
        account: &AccountHandle,
    ) -> SessionResetReport {
        let mut report = SessionResetReport::default();

        match driver.navigate_to(&self.home_url, &self.navigate).await {
            Ok(_) => report.home_reached = true,
            Err(err) => warn!(account = %account.id, error = %err, "home navigation failed during reset"),
        }

        match driver.navigate_to(&self.logout_url, &self.navigate).await {
            Ok(_) => report.logged_out = true,
            Err(err) => warn!(account = %account.id, error = %err, "logout navigation failed during reset"),
        }

        match driver.clear_cookies_and_cache().await {
            Ok(()) => report.cookies_cleared = true,
            Err(err) => warn!(account = %account.id, error = %err, "cookie/cache clear failed during reset"),
        }

        match tokio::fs::remove_file(&account.cookies_file).await {
            Ok(()) => report.credential_file_removed = true,
            // Nothing on disk is just as clean as a successful delete.
            Err(err) if err.kind() == ErrorKind::NotFound => {
                report.credential_file_removed = true;
            }
            Err(err) => warn!(
                account = %account.id,
                path = %account.cookies_file.display(),
                error = %err,
                "credential file removal failed during reset"
            ),
        }

        if let Ok(mut guard) = self.logged_in_as.lock() {
            *guard = None;
            report.login_cache_cleared = true;
        }

        info!(
            account = %account.id,
            fully_clean = report.fully_clean(),
            "session reset finished"
        );
        report
    }
}
