use thiserror::Error;

pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// One variant per block classification, plus the driver-level timeout and
/// the ambient failure kinds. `ServiceUnavailable` must stay distinct from
/// `GenericBlock`: it tells the caller to restart the whole browser process
/// instead of rotating the account.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("rate limited by target (http 429)")]
    RateLimited,
    #[error("security challenge raised ({kind}): {message}")]
    Challenge { kind: String, message: String },
    #[error("target server error (http {status})")]
    ServerError { status: u16 },
    #[error("target service unavailable, browser restart required")]
    ServiceUnavailable,
    #[error("navigation blocked: {reason}")]
    GenericBlock { reason: String },
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),
    #[error("cdp error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}
