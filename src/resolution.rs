//! Keep-one resolution policy.
//!
//! Last-write-wins with a completeness tie-break. The checks run in a fixed
//! order and the first that fires decides; reordering them changes outcomes
//! for records that differ in both recency and completeness.
//!
//! Policies are pure (no I/O), so a merge decision can be reproduced from the
//! same group.

use serde::{Deserialize, Serialize};

use crate::entity::{ContactFields, Freshness};
use crate::matching::MatchStrategy;

/// Which replacement rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceReason {
    /// Both have activity timestamps and the candidate's is strictly newer.
    MoreRecentActivity,
    /// The current record has no activity timestamp and the candidate does.
    GainedActivity,
    /// The candidate carries a completeness signal the current record lacks.
    MoreComplete,
}

/// The rule under which `candidate` should replace `current`, if any.
///
/// Evaluated in order, first applicable check decides:
/// 1. both have `last_activity`: replace only if the candidate's is strictly
///    newer (completeness is not consulted);
/// 2. `current` lacks `last_activity` and the candidate has one: replace;
/// 3. otherwise replace only if the candidate has a completeness signal that
///    `current` lacks.
#[must_use]
pub fn replace_reason<C, N>(current: &C, candidate: &N) -> Option<ReplaceReason>
where
    C: Freshness + ?Sized,
    N: Freshness + ?Sized,
{
    match (current.last_activity(), candidate.last_activity()) {
        (Some(cur), Some(cand)) => (cand > cur).then_some(ReplaceReason::MoreRecentActivity),
        (None, Some(_)) => Some(ReplaceReason::GainedActivity),
        _ => (candidate.has_completeness_signal() && !current.has_completeness_signal())
            .then_some(ReplaceReason::MoreComplete),
    }
}

/// True when `candidate` should replace `current`.
#[must_use]
pub fn should_replace<C, N>(current: &C, candidate: &N) -> bool
where
    C: Freshness + ?Sized,
    N: Freshness + ?Sized,
{
    replace_reason(current, candidate).is_some()
}

/// Folds the policy over `members` in order, starting from the first.
///
/// Returns `None` only for an empty slice.
#[must_use]
pub fn select_survivor<R: Freshness>(members: &[R]) -> Option<&R> {
    let (first, rest) = members.split_first()?;
    Some(rest.iter().fold(first, |current, candidate| {
        if should_replace(current, candidate) {
            candidate
        } else {
            current
        }
    }))
}

/// Collapses near-duplicates for public display.
///
/// Records are walked in order. One that matches an already-kept record
/// takes its slot when the policy prefers it and is dropped otherwise;
/// unmatched records are appended. Output order is first-seen slot order.
#[must_use]
pub fn dedupe_for_display<R>(records: &[R], strategy: MatchStrategy) -> Vec<R>
where
    R: ContactFields + Freshness + Clone,
{
    let mut kept: Vec<R> = Vec::with_capacity(records.len());

    for record in records {
        match kept.iter().position(|k| strategy.matches(k, record)) {
            Some(slot) => {
                if should_replace(&kept[slot], record) {
                    kept[slot] = record.clone();
                }
            }
            None => kept.push(record.clone()),
        }
    }

    kept
}
