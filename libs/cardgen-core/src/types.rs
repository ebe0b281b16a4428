//! Core types for the flashcard generation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An LLM-generated candidate flashcard, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub front: String,
    pub back: String,
}

/// One server-recorded LLM invocation producing a batch of proposals.
///
/// Proposal order is server order and is never re-sorted; a proposal's
/// position in the list is its identity for the whole review session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub id: i64,
    pub model: String,
    pub generated_count: u32,
    /// Time the model spent generating, in milliseconds.
    pub generated_duration: i64,
    pub source_text_hash: String,
    pub source_text_length: usize,
    pub created_at: DateTime<Utc>,
    pub proposals: Vec<Proposal>,
}

/// Provenance of a persisted flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashcardSource {
    Manual,
    AiFull,
    AiEdited,
}

impl FlashcardSource {
    /// Get the source as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AiFull => "ai-full",
            Self::AiEdited => "ai-edited",
        }
    }

    /// Parse from the wire string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "ai-full" => Some(Self::AiFull),
            "ai-edited" => Some(Self::AiEdited),
            _ => None,
        }
    }
}

/// A persisted flashcard record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one entry in a batch save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveItemStatus {
    Pending,
    Saving,
    Success,
    Duplicate,
    Error,
}

/// Progress of a single proposal through a batch save, in save order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveProgressItem {
    pub proposal_index: usize,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub status: SaveItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcard_id: Option<i64>,
}

/// A card that failed to save, kept for the summary's error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCard {
    pub front: String,
    pub back: String,
    pub error: String,
}

/// Aggregate result of a completed batch save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveSummary {
    pub total_attempted: usize,
    pub success_count: usize,
    pub unedited_count: usize,
    pub edited_count: usize,
    pub duplicate_count: usize,
    pub error_count: usize,
    pub failed: Vec<FailedCard>,
}

impl SaveSummary {
    /// Compute the summary from a finished batch's progress items.
    ///
    /// Edited/unedited counts cover successful saves only, split by the
    /// source the item was saved with.
    pub fn from_items(items: &[SaveProgressItem]) -> Self {
        let mut summary = Self {
            total_attempted: items.len(),
            ..Self::default()
        };

        for item in items {
            match item.status {
                SaveItemStatus::Success => {
                    summary.success_count += 1;
                    match item.source {
                        FlashcardSource::AiEdited => summary.edited_count += 1,
                        _ => summary.unedited_count += 1,
                    }
                }
                SaveItemStatus::Duplicate => summary.duplicate_count += 1,
                SaveItemStatus::Error => {
                    summary.error_count += 1;
                    summary.failed.push(FailedCard {
                        front: item.front.clone(),
                        back: item.back.clone(),
                        error: item.error.clone().unwrap_or_default(),
                    });
                }
                SaveItemStatus::Pending | SaveItemStatus::Saving => {}
            }
        }

        summary
    }
}
