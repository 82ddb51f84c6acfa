pub mod config;
pub mod error;
pub mod scraper;

pub use config::{
    load_scraper_config, DetectionSection, NavigationSection, ScraperConfig, SettleSection,
};
pub use error::{ConfigError, Result};
