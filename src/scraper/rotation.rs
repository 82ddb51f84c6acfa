use std::path::PathBuf;

use async_trait::async_trait;

use super::error::ScrapeResult;

/// Opaque reference to the identity currently driving the session. Identity
/// state itself lives in the rotation service, never in this engine.
#[derive(Debug, Clone)]
pub struct AccountHandle {
    pub id: String,
    pub cookies_file: PathBuf,
}

/// Account-rotation collaborator. `record_failure` starts the cool-down
/// timer on the active account and is safe to call more than once for the
/// same incident; the engine awaits it so the cool-down is active before a
/// classified failure propagates.
#[async_trait]
pub trait AccountRotation: Send + Sync {
    async fn current_account(&self) -> ScrapeResult<AccountHandle>;
    async fn record_failure(&self, kind: &str, message: &str);
}
