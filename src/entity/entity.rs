//! Entity identity and kind.
//!
//! Records arrive from several uncoordinated entry points (admin entry,
//! self-registration, bulk import, website sync), so ids are opaque strings
//! rather than a single numeric or UUID scheme.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque, stable record identifier.
///
/// Once assigned by the storage collaborator an `EntityId` never changes.
///
/// # Examples
///
/// ```
/// use edureconcile::EntityId;
///
/// let imported = EntityId::from("teacher-42");
/// assert_eq!(imported.as_str(), "teacher-42");
///
/// let minted = EntityId::new();
/// assert!(!minted.as_str().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Mints a new random identifier (UUID v4 text).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

/// The two record families kept by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A teacher profile.
    Teacher,
    /// A school (institution) profile.
    School,
}

impl EntityKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 2] = [Self::Teacher, Self::School];

    /// Stable lowercase name used in logs and serialized forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::School => "school",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("teacher") || trimmed.eq_ignore_ascii_case("teachers") {
            Ok(Self::Teacher)
        } else if trimmed.eq_ignore_ascii_case("school") || trimmed.eq_ignore_ascii_case("schools") {
            Ok(Self::School)
        } else {
            Err(ValidationError::UnknownEntityKind {
                value: value.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_creation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().contains('-'));
    }

    #[test]
    fn test_entity_id_conversions() {
        assert_eq!(EntityId::from(7u64), EntityId::from("7"));
        assert_eq!(EntityId::from("abc".to_string()).to_string(), "abc");
    }

    #[test]
    fn test_entity_id_serializes_transparently() {
        let json = serde_json::to_string(&EntityId::from("s-1")).unwrap();
        assert_eq!(json, "\"s-1\"");
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("Teacher".parse::<EntityKind>().unwrap(), EntityKind::Teacher);
        assert_eq!(" schools ".parse::<EntityKind>().unwrap(), EntityKind::School);
        assert!(matches!(
            "parent".parse::<EntityKind>(),
            Err(ValidationError::UnknownEntityKind { .. })
        ));
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Teacher.to_string(), "teacher");
        assert_eq!(
            serde_json::to_string(&EntityKind::School).unwrap(),
            "\"school\""
        );
    }
}
