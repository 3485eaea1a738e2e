//! Engine write path.
//!
//! Every mutation goes through the storage collaborator first; the caller's
//! in-memory group is never touched, so a failed call leaves the review
//! state exactly as it was. Notifications follow a successful storage call.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ReconciliationEngine;
use crate::entity::{ContactFields, EntityId, EntityKind, EntityRecord};
use crate::error::{ReconcileError, ReconcileResult, ValidationError};
use crate::grouping::DuplicateGroup;
use crate::notify::EventPayload;
use crate::resolution::select_survivor;

/// Outcome of a keep-one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Record family of the group.
    pub kind: EntityKind,
    /// The retained record.
    pub kept: EntityId,
    /// Deleted ids, in group order.
    pub removed: Vec<EntityId>,
}

/// Outcome of an automatic merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Record family of the group.
    pub kind: EntityKind,
    /// The surviving record as written back to storage.
    pub kept: EntityRecord,
    /// Deleted ids, in group order.
    pub removed: Vec<EntityId>,
}

impl ReconciliationEngine {
    /// Deletes one member of `group` from storage.
    ///
    /// The caller applies [`ReviewState::apply_delete`] once this returns
    /// `Ok`; on error the group is still accurate.
    ///
    /// [`ReviewState::apply_delete`]: crate::grouping::ReviewState::apply_delete
    ///
    /// # Errors
    /// - [`ValidationError::MemberNotInGroup`] if `id` is not a member
    /// - [`ReconcileError::Storage`] if the delete fails
    pub fn remove_member(
        &self,
        group: &DuplicateGroup<EntityRecord>,
        id: &EntityId,
    ) -> ReconcileResult<()> {
        if !group.contains(id) {
            return Err(ValidationError::MemberNotInGroup { id: id.clone() }.into());
        }
        self.delete_one(group.anchor().kind(), id)
    }

    /// Keeps `kept_id` and deletes every other member, in group order.
    ///
    /// Stops at the first storage failure: members before it are already
    /// gone, members after it are untouched, and the error is returned.
    ///
    /// # Errors
    /// - [`ValidationError::KeptIdNotInGroup`] if `kept_id` is not a member
    /// - [`ReconcileError::Storage`] from the first failing delete
    pub fn resolve_group(
        &self,
        group: &DuplicateGroup<EntityRecord>,
        kept_id: &EntityId,
    ) -> ReconcileResult<Resolution> {
        if !group.contains(kept_id) {
            return Err(ValidationError::KeptIdNotInGroup {
                id: kept_id.clone(),
            }
            .into());
        }

        let kind = group.anchor().kind();
        let mut removed = Vec::with_capacity(group.len().saturating_sub(1));
        for id in group.ids() {
            if id == kept_id {
                continue;
            }
            self.delete_one(kind, id)?;
            removed.push(id.clone());
        }

        info!(%kind, kept = %kept_id, removed = removed.len(), "duplicate group resolved");
        Ok(Resolution {
            kind,
            kept: kept_id.clone(),
            removed,
        })
    }

    /// Merges a group without an admin choice.
    ///
    /// The survivor is picked by the keep-one policy, gap-filled from the
    /// other members in group order, written back, and then the others are
    /// deleted.
    ///
    /// # Errors
    /// - [`ReconcileError::Storage`] if the update or any delete fails
    pub fn merge_group(&self, group: &DuplicateGroup<EntityRecord>) -> ReconcileResult<MergeOutcome> {
        let kind = group.anchor().kind();
        let survivor = select_survivor(group.members())
            .ok_or_else(|| ReconcileError::internal("duplicate group has no members"))?;

        let mut kept = survivor.clone();
        let kept_id = kept.id().clone();
        for other in group.members().iter().filter(|m| m.id() != &kept_id) {
            kept.absorb_missing(other);
        }

        self.store().update(kept.clone()).map_err(|e| {
            warn!(%kind, id = %kept_id, error = %e, "writing merged survivor failed");
            self.emit(EventPayload::ResolutionFailed {
                kind,
                id: kept_id.clone(),
                reason: e.to_string(),
            });
            e
        })?;

        let mut removed = Vec::with_capacity(group.len().saturating_sub(1));
        for id in group.ids() {
            if id == &kept_id {
                continue;
            }
            self.store().delete(kind, id).map_err(|e| self.report_failure(kind, id, e))?;
            removed.push(id.clone());
        }

        info!(%kind, kept = %kept_id, removed = removed.len(), "duplicate group merged");
        self.emit(EventPayload::GroupMerged {
            kind,
            kept: kept_id,
            removed: removed.clone(),
        });
        Ok(MergeOutcome {
            kind,
            kept,
            removed,
        })
    }

    fn delete_one(&self, kind: EntityKind, id: &EntityId) -> ReconcileResult<()> {
        self.store()
            .delete(kind, id)
            .map_err(|e| self.report_failure(kind, id, e))?;
        info!(%kind, %id, "duplicate record removed");
        self.emit(EventPayload::RecordRemoved {
            kind,
            id: id.clone(),
        });
        Ok(())
    }

    fn report_failure(
        &self,
        kind: EntityKind,
        id: &EntityId,
        error: crate::storage::StorageError,
    ) -> ReconcileError {
        warn!(%kind, %id, %error, "removing duplicate record failed");
        self.emit(EventPayload::ResolutionFailed {
            kind,
            id: id.clone(),
            reason: error.to_string(),
        });
        error.into()
    }
}
