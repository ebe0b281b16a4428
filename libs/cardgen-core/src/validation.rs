//! Input validation for source text and card fields.
//!
//! All checks run on trimmed input and are performed client-side before any
//! network call. Messages are user-facing and name the violated bound.

use serde::{Deserialize, Serialize};

/// Minimum trimmed length of source text submitted for generation.
pub const SOURCE_TEXT_MIN_CHARS: usize = 1000;
/// Maximum trimmed length of source text submitted for generation.
pub const SOURCE_TEXT_MAX_CHARS: usize = 10000;
/// Maximum length of a card's front text.
pub const FRONT_MAX_CHARS: usize = 200;
/// Maximum length of a card's back text.
pub const BACK_MAX_CHARS: usize = 500;

/// Which side of a card a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    Front,
    Back,
}

impl CardField {
    fn label(&self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Back => "Back",
        }
    }

    fn max_chars(&self) -> usize {
        match self {
            Self::Front => FRONT_MAX_CHARS,
            Self::Back => BACK_MAX_CHARS,
        }
    }
}

/// Validation result for source text, derived entirely from the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTextValidation {
    pub char_count: usize,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validate source text against the generation length bounds.
///
/// `char_count` is the character count of the trimmed text.
pub fn validate_source_text(text: &str) -> SourceTextValidation {
    let char_count = text.trim().chars().count();

    let error = if char_count == 0 {
        Some("Source text is required".to_string())
    } else if char_count < SOURCE_TEXT_MIN_CHARS {
        Some(format!(
            "Source text must be at least {} characters (currently {})",
            SOURCE_TEXT_MIN_CHARS, char_count
        ))
    } else if char_count > SOURCE_TEXT_MAX_CHARS {
        Some(format!(
            "Source text must not exceed {} characters (currently {})",
            SOURCE_TEXT_MAX_CHARS, char_count
        ))
    } else {
        None
    };

    SourceTextValidation {
        char_count,
        is_valid: error.is_none(),
        error,
    }
}

/// Validate one card field, returning a message when invalid.
pub fn validate_proposal_field(value: &str, field: CardField) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Some(format!("{} text is required", field.label()));
    }
    if trimmed.chars().count() > field.max_chars() {
        return Some(format!(
            "{} text must not exceed {} characters",
            field.label(),
            field.max_chars()
        ));
    }

    None
}
