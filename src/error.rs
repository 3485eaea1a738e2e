//! Error types for edureconcile.
//!
//! Errors are strongly typed using thiserror. Detection and scoring never
//! fail: malformed fields degrade to "no match". Only configuration, input
//! validation and the storage collaborator produce errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityId;
use crate::storage::StorageError;

/// Validation errors raised before any storage call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A threshold outside the unit interval.
    #[error("Similarity threshold {value} is out of range [0.0, 1.0]")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },

    /// Report settings that cannot produce a report.
    #[error("Invalid report configuration: {reason}")]
    InvalidReportConfig {
        /// Which setting is wrong.
        reason: String,
    },

    /// The survivor named for a resolution is outside the group.
    #[error("Kept record {id} is not a member of the duplicate group")]
    KeptIdNotInGroup {
        /// The requested survivor.
        id: EntityId,
    },

    /// A delete addressed a record outside the group.
    #[error("Record {id} is not a member of the duplicate group")]
    MemberNotInGroup {
        /// The requested record.
        id: EntityId,
    },

    /// A group with fewer than two distinct records.
    #[error("Duplicate group has {actual} members, at least 2 are required")]
    GroupTooSmall {
        /// Distinct ids present.
        actual: usize,
    },

    /// A record family name that is neither teacher nor school.
    #[error("Unknown entity kind: {value}")]
    UnknownEntityKind {
        /// The rejected name.
        value: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the settings shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed but failed validation.
    #[error("Invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

/// Top-level error type for edureconcile.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Rejected input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Settings failure.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Broken internal invariant.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl ReconcileError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if repeating the same call may succeed.
    ///
    /// Only transient backend failures qualify; a missing record or a bad
    /// argument stays wrong on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => matches!(e, StorageError::BackendError(_)),
            Self::Validation(_) | Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for edureconcile operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
