//! Duplicate detection and grouping.
//!
//! Grouping is a single greedy pass anchored on each ungrouped record in
//! input order. A group holds the anchor plus every still-ungrouped record
//! that matches the *anchor directly*. It is not a transitive closure: with
//! `A ~ B`, `B ~ C` and `A !~ C`, the group formed at `A` is `[A, B]` and `C`
//! stays out. Long chains of near-duplicates are therefore under-merged.

use std::collections::HashSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::{ContactFields, EntityId, EntityKind};
use crate::error::ValidationError;
use crate::matching::MatchStrategy;

/// Records believed to be the same real-world entity.
///
/// Always holds at least two members with distinct ids; the first member is
/// the anchor the others matched against. Deserialization enforces the
/// same rule and fails with [`ValidationError::GroupTooSmall`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup<R> {
    members: Vec<R>,
}

impl<'de, R> Deserialize<'de> for DuplicateGroup<R>
where
    R: Deserialize<'de> + ContactFields,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Stored<R> {
            members: Vec<R>,
        }

        let stored = Stored::<R>::deserialize(deserializer)?;
        Self::try_from(stored.members).map_err(D::Error::custom)
    }
}

impl<R: ContactFields> DuplicateGroup<R> {
    /// Builds a group from members in order. Returns `None` for fewer than
    /// two distinct ids.
    #[must_use]
    pub fn from_members(members: Vec<R>) -> Option<Self> {
        let distinct: HashSet<&EntityId> = members.iter().map(ContactFields::id).collect();
        if distinct.len() < 2 {
            return None;
        }
        Some(Self { members })
    }

    /// The record every other member matched against.
    #[must_use]
    pub fn anchor(&self) -> &R {
        &self.members[0]
    }

    /// Members in grouping order.
    #[must_use]
    pub fn members(&self) -> &[R] {
        &self.members
    }

    /// Consumes the group, returning its members.
    #[must_use]
    pub fn into_members(self) -> Vec<R> {
        self.members
    }

    /// Member ids in grouping order.
    #[must_use]
    pub fn ids(&self) -> Vec<&EntityId> {
        self.members.iter().map(ContactFields::id).collect()
    }

    /// Number of members (always ≥ 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Groups are never empty; provided for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True when a member has this id.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.members.iter().any(|m| m.id() == id)
    }

    /// Looks up a member by id.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&R> {
        self.members.iter().find(|m| m.id() == id)
    }
}

impl<R: ContactFields> TryFrom<Vec<R>> for DuplicateGroup<R> {
    type Error = ValidationError;

    /// Rebuilds a group from a stored admin selection.
    fn try_from(members: Vec<R>) -> Result<Self, Self::Error> {
        let distinct = members
            .iter()
            .map(ContactFields::id)
            .collect::<HashSet<_>>()
            .len();
        Self::from_members(members).ok_or(ValidationError::GroupTooSmall { actual: distinct })
    }
}

/// Partitions `records` into duplicate groups under `strategy`.
///
/// Pure and deterministic: the same input yields the same groups in the same
/// order. Records that match nothing are not emitted. Empty and
/// single-record inputs yield no groups.
///
/// # Examples
///
/// ```
/// use edureconcile::{detect_duplicates, MatchStrategy, Teacher};
///
/// let teachers = vec![
///     Teacher::new(1u64, "Sarah Nakamya").with_email("s@x.com"),
///     Teacher::new(2u64, "Sarah Nakamya").with_email("s@x.com"),
///     Teacher::new(3u64, "John Okello").with_email("j@y.com"),
/// ];
/// let groups = detect_duplicates(&teachers, MatchStrategy::ContactOrName);
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].len(), 2);
/// ```
#[must_use]
pub fn detect_duplicates<R>(records: &[R], strategy: MatchStrategy) -> Vec<DuplicateGroup<R>>
where
    R: ContactFields + Clone,
{
    let mut grouped: HashSet<&EntityId> = HashSet::new();
    let mut groups = Vec::new();

    for (i, anchor) in records.iter().enumerate() {
        if grouped.contains(anchor.id()) {
            continue;
        }

        // A record sharing the anchor's id is the anchor itself.
        let matches: Vec<&R> = records
            .iter()
            .enumerate()
            .filter(|(j, other)| {
                *j != i
                    && other.id() != anchor.id()
                    && !grouped.contains(other.id())
                    && strategy.matches(anchor, *other)
            })
            .map(|(_, other)| other)
            .collect();

        if matches.is_empty() {
            continue;
        }

        let mut members = Vec::with_capacity(matches.len() + 1);
        members.push(anchor.clone());
        grouped.insert(anchor.id());
        for other in matches {
            // Two copies of one id matched the anchor: keep the first.
            if grouped.insert(other.id()) {
                members.push(other.clone());
            }
        }

        groups.push(DuplicateGroup { members });
    }

    groups
}

/// An admin review session over one detection pass.
///
/// Caller-side state is modelled as explicit command/result pairs: each
/// command returns a new state and leaves the old one untouched, so a failed
/// storage call simply means the old state is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de> + ContactFields"))]
pub struct ReviewState<R> {
    kind: EntityKind,
    groups: Vec<DuplicateGroup<R>>,
}

impl<R: ContactFields + Clone> ReviewState<R> {
    /// Starts a session from a detection pass.
    #[must_use]
    pub const fn new(kind: EntityKind, groups: Vec<DuplicateGroup<R>>) -> Self {
        Self { kind, groups }
    }

    /// The record family under review.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Groups still awaiting a decision.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup<R>] {
        &self.groups
    }

    /// Number of groups still awaiting a decision.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// State after `id` was deleted from storage.
    ///
    /// The member is dropped from its group without re-grouping the rest; a
    /// group left with a single member is resolved and disappears.
    #[must_use]
    pub fn apply_delete(&self, id: &EntityId) -> Self {
        let groups = self
            .groups
            .iter()
            .filter_map(|group| {
                if !group.contains(id) {
                    return Some(group.clone());
                }
                let remaining: Vec<R> = group
                    .members()
                    .iter()
                    .filter(|m| m.id() != id)
                    .cloned()
                    .collect();
                DuplicateGroup::from_members(remaining)
            })
            .collect();

        Self {
            kind: self.kind,
            groups,
        }
    }

    /// State after a whole group was resolved in favour of `kept`.
    #[must_use]
    pub fn apply_resolution(&self, kept: &EntityId) -> Self {
        Self {
            kind: self.kind,
            groups: self
                .groups
                .iter()
                .filter(|g| !g.contains(kept))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{School, Teacher};

    fn ids<R: ContactFields>(group: &DuplicateGroup<R>) -> Vec<String> {
        group.ids().iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn try_from_requires_two_distinct_ids() {
        let same = vec![Teacher::new("1", "A"), Teacher::new("1", "A")];
        assert!(matches!(
            DuplicateGroup::try_from(same),
            Err(ValidationError::GroupTooSmall { actual: 1 })
        ));
        let pair = vec![Teacher::new("1", "A"), Teacher::new("2", "A")];
        assert_eq!(DuplicateGroup::try_from(pair).unwrap().len(), 2);
    }

    #[test]
    fn deserializing_undersized_groups_fails() {
        let empty = serde_json::from_str::<DuplicateGroup<Teacher>>(r#"{"members": []}"#);
        assert!(empty.unwrap_err().to_string().contains("at least 2"));

        let single = r#"{"members": [{"id": "1", "full_name": "Ann"}]}"#;
        assert!(serde_json::from_str::<DuplicateGroup<Teacher>>(single).is_err());

        let same_id = r#"{"members": [{"id": "1", "full_name": "Ann"}, {"id": "1", "full_name": "Ann"}]}"#;
        assert!(serde_json::from_str::<DuplicateGroup<Teacher>>(same_id).is_err());

        let state = r#"{"kind": "teacher", "groups": [{"members": [{"id": "1", "full_name": "Ann"}]}]}"#;
        assert!(serde_json::from_str::<ReviewState<Teacher>>(state).is_err());
    }

    #[test]
    fn serialized_group_reads_back() {
        let group = DuplicateGroup::try_from(vec![
            Teacher::new("1", "Ann").with_email("ann@x.com"),
            Teacher::new("2", "Ann").with_email("ann@x.com"),
        ])
        .unwrap();
        let json = serde_json::to_string(&group).unwrap();
        let back: DuplicateGroup<Teacher> = serde_json::from_str(&json).unwrap();
        assert_eq!(ids(&back), vec!["1", "2"]);
        assert_eq!(back.anchor().id, EntityId::from("1"));
    }

    #[test]
    fn empty_and_single_inputs_yield_nothing() {
        let none: Vec<Teacher> = Vec::new();
        assert!(detect_duplicates(&none, MatchStrategy::ContactOrName).is_empty());
        let one = vec![Teacher::new("1", "Solo")];
        assert!(detect_duplicates(&one, MatchStrategy::ContactOrName).is_empty());
    }

    #[test]
    fn end_to_end_three_records() {
        let records = vec![
            Teacher::new(1u64, "Sarah Nakamya").with_email("s@x.com"),
            Teacher::new(2u64, "Sarah Nakamya").with_email("s@x.com"),
            Teacher::new(3u64, "John Okello").with_email("j@y.com"),
        ];
        let groups = detect_duplicates(&records, MatchStrategy::ContactOrName);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["1", "2"]);
        assert!(!groups[0].contains(&EntityId::from(3u64)));
    }

    #[test]
    fn grouping_is_anchor_based_not_transitive() {
        // A~B by email, B~C by phone, A and C share nothing.
        let records = vec![
            Teacher::new("a", "Alpha").with_email("shared@x.com"),
            Teacher::new("b", "Beta").with_email("shared@x.com").with_phone("0701"),
            Teacher::new("c", "Gamma").with_phone("0701"),
        ];
        let groups = detect_duplicates(&records, MatchStrategy::ContactOrName);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
    }

    #[test]
    fn members_follow_scan_order() {
        let records = vec![
            Teacher::new("x", "Other Person"),
            Teacher::new("a", "Mary Achieng").with_phone("0772 000 111"),
            Teacher::new("b", "M. Achieng").with_phone("0772000111"),
            Teacher::new("c", "mary achieng"),
        ];
        let groups = detect_duplicates(&records, MatchStrategy::ContactOrName);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn a_record_joins_at_most_one_group() {
        let records = vec![
            Teacher::new("1", "Okello").with_email("o@x.com"),
            Teacher::new("2", "Okello James").with_email("o@x.com"),
            Teacher::new("3", "Okello James"),
        ];
        let groups = detect_duplicates(&records, MatchStrategy::ContactOrName);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["1", "2", "3"]);
    }

    #[test]
    fn repeated_id_never_matches_itself() {
        let records = vec![
            Teacher::new("1", "Same"),
            Teacher::new("1", "Same"),
        ];
        assert!(detect_duplicates(&records, MatchStrategy::ContactOrName).is_empty());
    }

    #[test]
    fn detection_is_idempotent() {
        let records = vec![
            School::new("1", "Gayaza High School"),
            School::new("2", "Gayaza High Schol"),
            School::new("3", "Kings College Budo"),
            School::new("4", "King's College Budo"),
        ];
        let strategy = MatchStrategy::name_similarity(0.8).unwrap();
        let first = detect_duplicates(&records, strategy);
        let second = detect_duplicates(&records, strategy);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn works_over_borrowed_records() {
        let records = [
            Teacher::new("1", "Ann").with_email("ann@x.com"),
            Teacher::new("2", "Annet").with_email("ANN@x.com"),
        ];
        let borrowed: Vec<&Teacher> = records.iter().collect();
        let groups = detect_duplicates(&borrowed, MatchStrategy::ContactOrName);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn from_members_requires_two_distinct_ids() {
        assert!(DuplicateGroup::from_members(vec![Teacher::new("1", "A")]).is_none());
        assert!(DuplicateGroup::from_members(vec![Teacher::new("1", "A"), Teacher::new("1", "A")]).is_none());
        assert!(DuplicateGroup::from_members(vec![Teacher::new("1", "A"), Teacher::new("2", "A")]).is_some());
    }

    #[test]
    fn review_state_apply_delete() {
        let records = vec![
            Teacher::new("1", "Sarah").with_email("s@x.com"),
            Teacher::new("2", "Sarah N").with_email("s@x.com"),
            Teacher::new("3", "Sarah Nakamya").with_email("s@x.com"),
            Teacher::new("4", "Paul").with_phone("0700"),
            Teacher::new("5", "Paul O").with_phone("0700"),
        ];
        let state = ReviewState::new(
            EntityKind::Teacher,
            detect_duplicates(&records, MatchStrategy::ContactOrName),
        );
        assert_eq!(state.group_count(), 2);

        let after = state.apply_delete(&EntityId::from("2"));
        assert_eq!(after.group_count(), 2);
        assert_eq!(ids(&after.groups()[0]), vec!["1", "3"]);
        // The original state is untouched.
        assert_eq!(ids(&state.groups()[0]), vec!["1", "2", "3"]);

        let after = after.apply_delete(&EntityId::from("5"));
        assert_eq!(after.group_count(), 1);

        let done = after.apply_resolution(&EntityId::from("1"));
        assert_eq!(done.group_count(), 0);
        assert_eq!(done.kind(), EntityKind::Teacher);
    }
}
