//! Settings file
//!
//! Optional TOML file passed with `--config`. Every field has a default, so
//! an empty file (or no file) is valid:
//!
//! ```toml
//! log_filter = "recode_import=debug"
//! base_dir = "config"
//!
//! [fetch]
//! workers = 16
//! queue_capacity = 100
//!
//! [s3]
//! enabled = true
//! ```

use recode_import::FetcherConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading the settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File cannot be read
    #[error("cannot read settings file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid settings TOML
    #[error("invalid settings file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Remote store switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    /// Route `s3://` references to a client built from the AWS environment
    pub enabled: bool,
}

/// Process-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `tracing` filter directive, used when `RECODE_LOG` is unset
    pub log_filter: Option<String>,
    /// Base directory for relative import and varfiles paths
    pub base_dir: Option<PathBuf>,
    /// Pattern fetch settings
    pub fetch: FetcherConfig,
    /// S3 access
    pub s3: S3Settings,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    /// - `SettingsError::Read` / `SettingsError::Parse`
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the log filter directive
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Set the base directory
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Set the number of fetch workers
    #[inline]
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.fetch.workers = workers;
        self
    }

    /// Enable or disable S3 access
    #[inline]
    #[must_use]
    pub fn with_s3_enabled(mut self, enabled: bool) -> Self {
        self.s3.enabled = enabled;
        self
    }
}
