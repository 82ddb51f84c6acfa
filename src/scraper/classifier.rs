use regex::Regex;
use url::Url;

use crate::config::DetectionSection;
use crate::error::ConfigError;

/// Snapshot of one navigation attempt, built fresh per call and discarded
/// after classification. The body text is only read for signal matching.
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    pub final_url: String,
    pub http_status: Option<u16>,
    pub body_snapshot: String,
    pub challenge: Option<ChallengeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeInfo {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockClassification {
    Ok,
    RateLimited,
    Challenge { kind: String, message: String },
    ServerError { status: u16 },
    ServiceUnavailable,
    GenericBlock { reason: String },
}

/// Ordered block-signal rules compiled from [`DetectionSection`]. New block
/// signatures are added to the config tables, not to this control flow.
#[derive(Debug, Clone)]
pub struct DetectionRules {
    browser_error_schemes: Vec<String>,
    challenge_url_fragments: Vec<String>,
    challenge_body_patterns: Vec<Regex>,
    service_unavailable_markers: Vec<String>,
    generic_failure_markers: Vec<String>,
}

impl DetectionRules {
    pub fn from_section(section: &DetectionSection) -> Result<Self, ConfigError> {
        let challenge_body_patterns = section
            .challenge_body_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    source,
                    pattern: pattern.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            browser_error_schemes: section.browser_error_schemes.clone(),
            challenge_url_fragments: section.challenge_url_fragments.clone(),
            challenge_body_patterns,
            service_unavailable_markers: lowercase_all(&section.service_unavailable_markers),
            generic_failure_markers: lowercase_all(&section.generic_failure_markers),
        })
    }

    /// First match wins. Several signals can co-occur (a challenge page may
    /// also return a non-200 status), so the order here is load-bearing:
    /// 429, browser error page, plain 5xx, challenge, service-unavailable
    /// marker, generic failure marker. A 5xx whose body carries a
    /// service-unavailable marker falls through to the marker rule, because
    /// that case demands a browser restart rather than account rotation.
    pub fn classify(&self, outcome: &NavigationOutcome) -> BlockClassification {
        if outcome.http_status == Some(429) {
            return BlockClassification::RateLimited;
        }

        if self.is_browser_error_page(&outcome.final_url) {
            return BlockClassification::GenericBlock {
                reason: "browser-error-page".to_string(),
            };
        }

        let body = outcome.body_snapshot.to_lowercase();
        let unavailable = self
            .service_unavailable_markers
            .iter()
            .any(|marker| body.contains(marker));

        if let Some(status) = outcome.http_status {
            if status >= 500 && !unavailable {
                return BlockClassification::ServerError { status };
            }
        }

        if let Some(challenge) = self.detect_challenge(outcome) {
            return BlockClassification::Challenge {
                kind: challenge.kind,
                message: challenge.message,
            };
        }

        if unavailable {
            return BlockClassification::ServiceUnavailable;
        }

        if self
            .generic_failure_markers
            .iter()
            .any(|marker| body.contains(marker))
        {
            return BlockClassification::GenericBlock {
                reason: "content-error-page".to_string(),
            };
        }

        BlockClassification::Ok
    }

    fn is_browser_error_page(&self, final_url: &str) -> bool {
        match Url::parse(final_url) {
            Ok(url) => self
                .browser_error_schemes
                .iter()
                .any(|scheme| url.scheme() == scheme),
            // An unparseable final URL is itself a navigation-level failure.
            Err(_) => !final_url.is_empty() && !final_url.starts_with("about:"),
        }
    }

    fn detect_challenge(&self, outcome: &NavigationOutcome) -> Option<ChallengeInfo> {
        if let Some(info) = &outcome.challenge {
            return Some(info.clone());
        }
        if let Some(fragment) = self
            .challenge_url_fragments
            .iter()
            .find(|fragment| outcome.final_url.contains(fragment.as_str()))
        {
            return Some(ChallengeInfo {
                kind: "checkpoint".to_string(),
                message: format!("redirected to {fragment}"),
            });
        }
        for pattern in &self.challenge_body_patterns {
            if let Some(found) = pattern.find(&outcome.body_snapshot) {
                return Some(ChallengeInfo {
                    kind: "interstitial".to_string(),
                    message: found.as_str().to_string(),
                });
            }
        }
        None
    }
}

fn lowercase_all(markers: &[String]) -> Vec<String> {
    markers.iter().map(|m| m.to_lowercase()).collect()
}
