//! Duplicate detection for flashcard content.
//!
//! Detection is an exact match on a normalized `front|back` key; there is
//! deliberately no fuzzy matching, so whether a card saves never depends on
//! a similarity threshold.

use std::collections::HashSet;

/// Build the canonical dedup key for a card's content.
pub fn normalize_flashcard_key(front: &str, back: &str) -> String {
    format!(
        "{}|{}",
        front.trim().to_lowercase(),
        back.trim().to_lowercase()
    )
}

/// Whether a card's content is already present in the key set.
pub fn is_duplicate(front: &str, back: &str, existing: &HashSet<String>) -> bool {
    existing.contains(&normalize_flashcard_key(front, back))
}
