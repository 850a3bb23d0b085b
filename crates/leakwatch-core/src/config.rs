//! Tracker configuration
//!
//! Configuration is read from TOML and may be overridden from the process
//! environment:
//!
//! ```toml
//! backtrace = "location"
//! max_report_frames = 32
//! verify_on_drop = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`LeakConfig::backtrace`]
pub const ENV_BACKTRACE: &str = "LEAKWATCH_BACKTRACE";
/// Environment variable overriding [`LeakConfig::max_report_frames`]
pub const ENV_MAX_REPORT_FRAMES: &str = "LEAKWATCH_MAX_REPORT_FRAMES";
/// Environment variable overriding [`LeakConfig::verify_on_drop`]
pub const ENV_VERIFY_ON_DROP: &str = "LEAKWATCH_VERIFY_ON_DROP";

/// How much of the call stack each registration captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacktraceMode {
    /// Record nothing beyond the sequence number
    Off,
    /// Record the caller's source location only
    Location,
    /// Record the source location and a full backtrace
    #[default]
    Full,
}

impl FromStr for BacktraceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "0" => Ok(Self::Off),
            "location" | "short" => Ok(Self::Location),
            "full" | "1" => Ok(Self::Full),
            other => Err(ConfigError::InvalidValue {
                key: "backtrace",
                value: other.to_string(),
            }),
        }
    }
}

/// Leak tracking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeakConfig {
    /// Stack capture performed on every registration
    pub backtrace: BacktraceMode,
    /// Cap on backtrace frames printed per event in leak reports
    pub max_report_frames: Option<usize>,
    /// Panic when a scope is dropped without verification and still has leaks
    pub verify_on_drop: bool,
}

impl Default for LeakConfig {
    fn default() -> Self {
        Self {
            backtrace: BacktraceMode::Full,
            max_report_frames: None,
            verify_on_drop: false,
        }
    }
}

impl LeakConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_with_env()?;
        Ok(config)
    }

    /// Apply `LEAKWATCH_*` environment overrides
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(mode) = std::env::var(ENV_BACKTRACE) {
            self.backtrace = mode.parse()?;
        }
        if let Ok(frames) = std::env::var(ENV_MAX_REPORT_FRAMES) {
            self.max_report_frames = if frames.trim().is_empty() {
                None
            } else {
                Some(frames.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "max_report_frames",
                    value: frames.clone(),
                })?)
            };
        }
        if let Ok(flag) = std::env::var(ENV_VERIFY_ON_DROP) {
            self.verify_on_drop = parse_flag(&flag).ok_or_else(|| ConfigError::InvalidValue {
                key: "verify_on_drop",
                value: flag.clone(),
            })?;
        }
        self.validate()
    }

    /// Reject configurations that cannot produce a useful report
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_report_frames == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "max_report_frames",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
