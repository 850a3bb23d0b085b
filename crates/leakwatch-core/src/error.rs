//! Error types for leak verification and configuration

use crate::report::LeakReport;
use std::path::PathBuf;

/// Result of a verification pass
pub type LeakResult<T = ()> = Result<T, LeakError>;

/// Failure raised at teardown.
///
/// `LeakDetected` is the only failure the tracker produces. It is meant to
/// reach the test runner unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LeakError {
    /// Listeners were registered and never unregistered
    #[error("{0}")]
    LeakDetected(LeakReport),
}

impl LeakError {
    /// The report carried by this error
    pub fn report(&self) -> &LeakReport {
        match self {
            Self::LeakDetected(report) => report,
        }
    }

    /// Consume the error, returning its report
    pub fn into_report(self) -> LeakReport {
        match self {
            Self::LeakDetected(report) => report,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML for [`crate::LeakConfig`]
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range or unrecognised
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Configuration key
        key: &'static str,
        /// Offending value
        value: String,
    },
}
