//! Engine and report configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};
use crate::matching::DEFAULT_SCHOOL_THRESHOLD;

/// Smallest page budget that still fits a heading plus a few rows.
pub const MIN_ROWS_PER_PAGE: usize = 5;

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Exclusive lower bound on school name similarity, in `[0, 1]`.
    pub school_similarity_threshold: f64,
    /// Capacity of the notification queue when a `ChannelSink` is built
    /// from this config.
    pub notification_queue_capacity: usize,
    /// Report layout.
    pub report: ReportConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            school_similarity_threshold: DEFAULT_SCHOOL_THRESHOLD,
            notification_queue_capacity: 256,
            report: ReportConfig::default(),
        }
    }
}

/// Report layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Heading on the first page.
    pub title: String,
    /// Maximum blocks per page.
    pub rows_per_page: usize,
    /// Maximum rows in each directory listing.
    pub directory_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Marketplace Report".to_string(),
            rows_per_page: 40,
            directory_limit: 100,
        }
    }
}

impl ReportConfig {
    /// Checks the layout limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rows_per_page < MIN_ROWS_PER_PAGE {
            return Err(ValidationError::InvalidReportConfig {
                reason: format!(
                    "rows_per_page must be at least {MIN_ROWS_PER_PAGE}, got {}",
                    self.rows_per_page
                ),
            });
        }
        if self.directory_limit == 0 {
            return Err(ValidationError::InvalidReportConfig {
                reason: "directory_limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ReconcileConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks threshold range and report limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.school_similarity_threshold) {
            return Err(ValidationError::InvalidThreshold {
                value: self.school_similarity_threshold,
            });
        }
        self.report.validate()
    }
}
