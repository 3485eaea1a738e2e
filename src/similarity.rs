//! Name normalization and edit-distance similarity.
//!
//! All lengths are measured in Unicode scalar values, so accented names
//! ("Nakamyà") cost one edit per character rather than one per byte.

/// Lowercases, collapses internal whitespace runs to one space, and trims.
///
/// # Examples
///
/// ```
/// use edureconcile::similarity::normalize_name;
///
/// assert_eq!(normalize_name("  Sarah   NAKAMYA "), "sarah nakamya");
/// ```
#[must_use]
pub fn normalize_name(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Levenshtein distance: single-character insert, delete and substitute,
/// each costing 1.
///
/// # Examples
///
/// ```
/// use edureconcile::similarity::edit_distance;
///
/// assert_eq!(edit_distance("kitten", "sitting"), 3);
/// assert_eq!(edit_distance("", "abc"), 3);
/// ```
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity in `[0, 1]`: `1 - distance(longer, shorter) / len(longer)`.
///
/// Inputs are compared as given; callers normalize first (see
/// [`normalized_similarity`]). Two empty strings are identical (`1.0`).
///
/// # Examples
///
/// ```
/// use edureconcile::similarity::similarity;
///
/// assert_eq!(similarity("", ""), 1.0);
/// assert_eq!(similarity("abcde", "abcdx"), 0.8);
/// ```
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// [`similarity`] over [`normalize_name`]d inputs.
#[must_use]
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    similarity(&normalize_name(a), &normalize_name(b))
}

/// Whitespace-free form used for phone comparison.
#[must_use]
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Trimmed, lowercased form used for email comparison.
#[must_use]
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
