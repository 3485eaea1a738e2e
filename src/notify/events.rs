//! Reconciliation events.
//!
//! Serializable so a transport (email digest, admin alert feed) can forward
//! them unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityId, EntityKind};

/// Something the engine did that an operator may want to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A detection pass over stored records finished.
    DuplicatesDetected {
        /// Record family scanned.
        kind: EntityKind,
        /// Groups found.
        group_count: usize,
        /// Records scanned.
        record_count: usize,
    },

    /// One record was deleted during manual resolution.
    RecordRemoved {
        /// Record family.
        kind: EntityKind,
        /// Deleted record.
        id: EntityId,
    },

    /// A group was merged automatically into one survivor.
    GroupMerged {
        /// Record family.
        kind: EntityKind,
        /// Surviving record.
        kept: EntityId,
        /// Deleted records, in group order.
        removed: Vec<EntityId>,
    },

    /// A storage mutation failed; the group was left intact.
    ResolutionFailed {
        /// Record family.
        kind: EntityKind,
        /// Record the failed call addressed.
        id: EntityId,
        /// Storage error text.
        reason: String,
    },
}

/// A timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileEvent {
    /// When the engine emitted the event.
    pub at: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl ReconcileEvent {
    /// Stamps `payload` with the current time.
    #[must_use]
    pub fn now(payload: EventPayload) -> Self {
        Self {
            at: Utc::now(),
            payload,
        }
    }

    /// The record family the event concerns.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match &self.payload {
            EventPayload::DuplicatesDetected { kind, .. }
            | EventPayload::RecordRemoved { kind, .. }
            | EventPayload::GroupMerged { kind, .. }
            | EventPayload::ResolutionFailed { kind, .. } => *kind,
        }
    }
}

/// Delivery failures reported by a sink.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The bounded queue had no room.
    #[error("Notification queue is full")]
    QueueFull,

    /// The other side of the channel is gone.
    #[error("Notification receiver disconnected")]
    Disconnected,

    /// No event arrived in time.
    #[error("Timed out after {duration_ms}ms waiting for a notification")]
    Timeout {
        /// How long the consumer waited.
        duration_ms: u64,
    },
}
