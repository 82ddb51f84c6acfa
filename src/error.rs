use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
    /// A detection-table entry that cannot compile. Raised when the block
    /// signal tables are turned into rules, so a bad signature is caught at
    /// load time instead of on the first hostile page.
    #[error("invalid detection pattern {pattern:?}: {source}")]
    Pattern {
        source: regex::Error,
        pattern: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
