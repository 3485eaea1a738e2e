//! Match predicates.
//!
//! Two predicates exist and are not interchangeable:
//!
//! - [`MatchStrategy::ContactOrName`]: admin review of teachers. Exact email,
//!   exact phone, or normalized name equality / literal containment.
//! - [`MatchStrategy::NameSimilarity`]: public-site school listing. Fuzzy name
//!   similarity strictly above a threshold, nothing else.
//!
//! A branch whose field is missing on either side is skipped; it never
//! matches and never aborts the comparison.

use serde::{Deserialize, Serialize};

use crate::config::ReconcileConfig;
use crate::entity::{ContactFields, EntityKind};
use crate::error::ValidationError;
use crate::similarity::{normalize_email, normalize_name, normalize_phone, similarity};

/// Default school similarity threshold (exclusive).
pub const DEFAULT_SCHOOL_THRESHOLD: f64 = 0.8;

/// Why two records were considered the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum MatchReason {
    /// Emails equal after trim + lowercase.
    Email,
    /// Phones equal after removing all whitespace.
    Phone,
    /// Normalized names identical.
    ExactName,
    /// One normalized name literally contains the other.
    NameContains,
    /// Normalized name similarity above the threshold.
    SimilarName {
        /// The similarity score that cleared the threshold.
        score: f64,
    },
}

/// Duplicate predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MatchStrategy {
    /// Email, then phone, then name (equality or containment).
    ContactOrName,

    /// Name similarity strictly greater than `threshold`.
    NameSimilarity {
        /// Exclusive lower bound on the similarity score.
        threshold: f64,
    },
}

impl MatchStrategy {
    /// Fuzzy-name strategy with a validated threshold.
    pub fn name_similarity(threshold: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ValidationError::InvalidThreshold { value: threshold });
        }
        Ok(Self::NameSimilarity { threshold })
    }

    /// The strategy used for a kind: teachers are reviewed by contact or name,
    /// schools by fuzzy name only.
    #[must_use]
    pub const fn for_kind(kind: EntityKind, config: &ReconcileConfig) -> Self {
        match kind {
            EntityKind::Teacher => Self::ContactOrName,
            EntityKind::School => Self::NameSimilarity {
                threshold: config.school_similarity_threshold,
            },
        }
    }

    /// Returns a short stable identifier suitable for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ContactOrName => "contact_or_name",
            Self::NameSimilarity { .. } => "name_similarity",
        }
    }

    /// True when `a` and `b` look like the same entity.
    #[must_use]
    pub fn matches<A, B>(&self, a: &A, b: &B) -> bool
    where
        A: ContactFields + ?Sized,
        B: ContactFields + ?Sized,
    {
        self.explain(a, b).is_some()
    }

    /// The first rule that matched, if any.
    #[must_use]
    pub fn explain<A, B>(&self, a: &A, b: &B) -> Option<MatchReason>
    where
        A: ContactFields + ?Sized,
        B: ContactFields + ?Sized,
    {
        match self {
            Self::ContactOrName => contact_or_name(a, b),
            Self::NameSimilarity { threshold } => {
                let (na, nb) = normalized_names(a, b)?;
                let score = similarity(&na, &nb);
                (score > *threshold).then_some(MatchReason::SimilarName { score })
            }
        }
    }
}

fn contact_or_name<A, B>(a: &A, b: &B) -> Option<MatchReason>
where
    A: ContactFields + ?Sized,
    B: ContactFields + ?Sized,
{
    if let (Some(ea), Some(eb)) = (a.email(), b.email()) {
        if normalize_email(ea) == normalize_email(eb) {
            return Some(MatchReason::Email);
        }
    }

    if let (Some(pa), Some(pb)) = (a.phone(), b.phone()) {
        let (pa, pb) = (normalize_phone(pa), normalize_phone(pb));
        if !pa.is_empty() && pa == pb {
            return Some(MatchReason::Phone);
        }
    }

    let (na, nb) = normalized_names(a, b)?;
    if na == nb {
        Some(MatchReason::ExactName)
    } else if na.contains(&nb) || nb.contains(&na) {
        Some(MatchReason::NameContains)
    } else {
        None
    }
}

fn normalized_names<A, B>(a: &A, b: &B) -> Option<(String, String)>
where
    A: ContactFields + ?Sized,
    B: ContactFields + ?Sized,
{
    let na = normalize_name(a.name()?);
    let nb = normalize_name(b.name()?);
    if na.is_empty() || nb.is_empty() {
        return None;
    }
    Some((na, nb))
}
