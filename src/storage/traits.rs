//! Abstract storage contract for edureconcile.
//!
//! The engine never owns records; it reads snapshots from and delegates
//! deletions/updates to a storage collaborator implementing [`EntityStore`].
//! Keeping this a trait lets the admin back office plug in its managed
//! backend while tests supply in-memory or failing fakes.

use thiserror::Error;

use crate::entity::{EntityId, EntityKind, EntityRecord};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record of this kind has the id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record family looked up.
        kind: EntityKind,
        /// Missing id.
        id: EntityId,
    },

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(EntityId),

    /// The record's kind differs from the kind the call addressed.
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Kind the call addressed.
        expected: EntityKind,
        /// Kind of the supplied record.
        actual: EntityKind,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for teacher and school records.
///
/// # Consistency
/// - `list` returns records in stable insertion order; grouping order
///   depends on it.
/// - A successful `delete` or `update` is visible to the next `list`.
/// - A failed mutation leaves every other record untouched.
pub trait EntityStore: Send + Sync {
    /// All records of a kind, in insertion order.
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, StorageError>;

    /// Get a record by kind and id.
    fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<EntityRecord>, StorageError>;

    /// Insert a new record. Returns error if the id already exists for its kind.
    fn insert(&self, record: EntityRecord) -> Result<(), StorageError>;

    /// Replace the stored fields of an existing record (matched by kind and
    /// id), keeping its position. Returns error if not found.
    fn update(&self, record: EntityRecord) -> Result<(), StorageError>;

    /// Delete a record by kind and id. Returns error if not found.
    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), StorageError>;
}
