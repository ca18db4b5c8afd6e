//! Run configuration.
//!
//! Loaded from TOML, then overridden by command-line flags. Every field has a
//! default, so an empty file (or no file) reproduces the three-worker run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 3;
pub const MAX_WORKERS: usize = 1024;
pub const DEFAULT_THREAD_PREFIX: &str = "worker";

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Value {value} for field '{field}' is out of range (min: {min}, max: {max})")]
    OutOfRange {
        field: String,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid_value(
                "logging.format",
                other,
                "expected 'text' or 'json'",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Emit per-worker debug events.
    pub verbose: bool,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FanOutConfig {
    /// Number of workers, and therefore the length of the shared container.
    pub workers: usize,

    /// Worker threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,

    /// Turn an interrupted wait into a non-zero exit status.
    pub strict_interrupt: bool,

    pub logging: LoggingConfig,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            strict_interrupt: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl FanOutConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::OutOfRange {
                field: "workers".to_string(),
                value: self.workers,
                min: 1,
                max: MAX_WORKERS,
            });
        }

        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::invalid_value(
                "thread_name_prefix",
                "",
                "must not be empty",
            ));
        }
        if self.thread_name_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_value(
                "thread_name_prefix",
                self.thread_name_prefix.as_str(),
                "must not contain whitespace",
            ));
        }

        Ok(())
    }

    pub fn thread_name(&self, index: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, index)
    }
}
