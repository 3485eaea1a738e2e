//! # edureconcile - Duplicate detection for marketplace records
//!
//! edureconcile finds teacher and school records that describe the same
//! real-world entity, lets an admin resolve them by keeping one, and
//! collapses near-duplicates when records are listed publicly.
//!
//! ## Core Concepts
//!
//! - **Entity Record**: a teacher or school as held by the backend store
//! - **Match Strategy**: the pairwise predicate for a record family
//! - **Duplicate Group**: records believed to be one entity, anchored on the
//!   first of them
//! - **Keep-one policy**: last-write-wins with a completeness tie-break
//!
//! ## Usage
//!
//! ```rust
//! use edureconcile::{compute_similarity, detect_duplicates, MatchStrategy, School};
//!
//! let schools = vec![
//!     School::new("s-1", "Gayaza High School"),
//!     School::new("s-2", "Gayaza High Schol"),
//!     School::new("s-3", "Kings College Budo"),
//! ];
//!
//! let strategy = MatchStrategy::name_similarity(0.8)?;
//! let groups = detect_duplicates(&schools, strategy);
//! assert_eq!(groups.len(), 1);
//! assert!(compute_similarity("Gayaza High School", "Gayaza High Schol") > 0.9);
//! # Ok::<(), edureconcile::ValidationError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod entity;
pub mod error;

// Detection and resolution
pub mod grouping;
pub mod matching;
pub mod resolution;
pub mod similarity;

// Collaborators and orchestration
pub mod engine;
pub mod notify;
pub mod report;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use config::{ReconcileConfig, ReportConfig};
pub use engine::{MergeOutcome, ReconciliationEngine, Resolution};
pub use entity::{ContactFields, EntityId, EntityKind, EntityRecord, Freshness, School, Teacher};
pub use error::{ConfigError, ReconcileError, ReconcileResult, ValidationError};
pub use grouping::{detect_duplicates, DuplicateGroup, ReviewState};
pub use matching::{MatchReason, MatchStrategy, DEFAULT_SCHOOL_THRESHOLD};
pub use notify::{ChannelSink, EventPayload, EventStream, NotificationSink, NullSink, ReconcileEvent};
pub use report::{Report, ReportBlock, ReportStats};
pub use resolution::{dedupe_for_display, select_survivor, should_replace, ReplaceReason};
pub use similarity::{edit_distance, normalize_name, similarity};
pub use storage::{EntityStore, InMemoryEntityStore, StorageError};

/// Similarity of two names after normalization, in `[0, 1]`.
///
/// Names are trimmed, lowercased and whitespace-collapsed before scoring.
#[must_use]
pub fn compute_similarity(a: &str, b: &str) -> f64 {
    similarity::normalized_similarity(a, b)
}
