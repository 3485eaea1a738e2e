//! Narrow views over records.
//!
//! Matching only needs `{ id, name, email, phone }` and the replacement policy
//! only needs activity and completeness. Keeping these as small traits lets the
//! engine work on any record shape without depending on unrelated fields.

use chrono::{DateTime, Utc};

use super::EntityId;

/// Contact fields consulted by the match predicates.
///
/// Accessors return `None` for absent values *and* for empty or
/// whitespace-only strings, so a blank field never matches anything.
pub trait ContactFields {
    /// Stable record identifier.
    fn id(&self) -> &EntityId;

    /// Display name used for fuzzy comparison. Whitespace-only reads as `None`.
    fn name(&self) -> Option<&str>;

    /// Contact email. Whitespace-only reads as `None`.
    fn email(&self) -> Option<&str>;

    /// Contact phone number. Whitespace-only reads as `None`, so two blank
    /// phones never match.
    fn phone(&self) -> Option<&str>;
}

/// Signals consulted by the keep-one replacement policy.
pub trait Freshness {
    /// Most recent modification time, if known.
    fn last_activity(&self) -> Option<DateTime<Utc>>;

    /// True when the domain-specific "more complete record" fields are populated.
    fn has_completeness_signal(&self) -> bool;
}

/// Returns the string when it contains something other than whitespace.
pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl<T: ContactFields + ?Sized> ContactFields for &T {
    fn id(&self) -> &EntityId {
        (**self).id()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }

    fn email(&self) -> Option<&str> {
        (**self).email()
    }

    fn phone(&self) -> Option<&str> {
        (**self).phone()
    }
}

impl<T: Freshness + ?Sized> Freshness for &T {
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        (**self).last_activity()
    }

    fn has_completeness_signal(&self) -> bool {
        (**self).has_completeness_signal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_filters_blank_strings() {
        let blank = "   ".to_string();
        let value = "a@b.com".to_string();
        assert_eq!(present(None), None);
        assert_eq!(present(Some(&String::new())), None);
        assert_eq!(present(Some(&blank)), None);
        assert_eq!(present(Some(&value)), Some("a@b.com"));
    }
}
