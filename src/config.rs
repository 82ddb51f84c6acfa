use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::scraper::DetectionRules;

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    pub navigation: NavigationSection,
    pub detection: DetectionSection,
    pub settle: SettleSection,
}

/// Target endpoints and driver-level navigation defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct NavigationSection {
    pub home_url: String,
    pub logout_url: String,
    pub wait_until: String,
    pub timeout_ms: u64,
}

/// Ordered block-signal tables. Markers are matched case-insensitively
/// against the rendered page text; patterns are regular expressions.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSection {
    pub browser_error_schemes: Vec<String>,
    pub challenge_url_fragments: Vec<String>,
    pub challenge_body_patterns: Vec<String>,
    pub service_unavailable_markers: Vec<String>,
    pub generic_failure_markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettleSection {
    pub anchor_selector: String,
    pub scroll_increment_px: u32,
    pub increment_pause_ms: [u64; 2],
    pub settle_pause_ms: [u64; 2],
    pub poll_tick_ms: u64,
    pub early_exit_new_items: u32,
    pub stable_ticks: u32,
}

/// Read, parse, and validate a scraper config. The detection tables are
/// compiled once here so an unloadable block signature fails the whole load
/// rather than surfacing mid-session.
pub fn load_scraper_config<P: AsRef<Path>>(path: P) -> Result<ScraperConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let config: ScraperConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })?;
    DetectionRules::from_section(&config.detection)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_fixture_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/scraper.toml");
        let config = load_scraper_config(path).expect("fixture config should parse");
        assert!(config.navigation.home_url.starts_with("https://"));
        assert_eq!(config.settle.poll_tick_ms, 1000);
        assert_eq!(config.settle.early_exit_new_items, 8);
        assert!(!config.detection.service_unavailable_markers.is_empty());
        assert!(!config.detection.generic_failure_markers.is_empty());
    }

    #[test]
    fn bad_challenge_pattern_fails_the_load() {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/scraper.toml");
        let content = std::fs::read_to_string(fixture).unwrap();
        let broken = content.replace("(?i)help us confirm", "(?i)help us confirm (unclosed");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(broken.as_bytes()).unwrap();

        let err = load_scraper_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Pattern { pattern, .. } if pattern.contains("unclosed")
        ));
    }
}
