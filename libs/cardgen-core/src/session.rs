//! The generation/review/save session state machine.
//!
//! [`ReviewSession`] is pure state plus synchronous transition methods; it
//! performs no I/O and owns no timers. The effect layer (network calls,
//! tickers, persistence) lives in the engine crate, which drives these
//! transitions and is the only owner of a session. That split keeps every
//! transition directly unit-testable without a host UI or a runtime.
//!
//! Generation lifecycle: `Idle -> Generating -> {Ready | RateLimited |
//! Failed}`. Batch-save bookkeeping runs through `begin_save` /
//! `start_item` / `mark_item_*` / `finish_save`, and single-item retry
//! through `begin_retry` / `complete_retry_*`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::review::{saveable_indices, ProposalStatus, ProposalViewModel, StatusCounts};
use crate::types::{
    FlashcardSource, Generation, SaveItemStatus, SaveProgressItem, SaveSummary,
};
use crate::validation::{validate_source_text, CardField, SourceTextValidation};

/// Structured failure payload for a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub code: String,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Generic fallback when the underlying error carries no message.
    pub fn ai_service_error() -> Self {
        Self::new("AI_SERVICE_ERROR", "The AI service failed to generate flashcards")
    }
}

/// Where the session stands in the generation lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GenerationPhase {
    Idle,
    Generating {
        elapsed_secs: u64,
    },
    Ready {
        generation: Generation,
    },
    RateLimited {
        retry_after_secs: u64,
        reset_at: DateTime<Utc>,
    },
    Failed {
        error: GenerationFailure,
    },
}

/// Source text plus its derived validation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTextState {
    pub text: String,
    pub validation: SourceTextValidation,
}

impl SourceTextState {
    fn new(text: String) -> Self {
        let validation = validate_source_text(&text);
        Self { text, validation }
    }
}

impl Default for SourceTextState {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Full state of one generation/review/save session.
///
/// All mutation goes through the methods below; the engine holds the only
/// instance and serializes snapshots out to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    pub source: SourceTextState,
    pub phase: GenerationPhase,
    pub proposals: Vec<ProposalViewModel>,
    pub save_in_progress: bool,
    pub save_items: Vec<SaveProgressItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SaveSummary>,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self {
            source: SourceTextState::default(),
            phase: GenerationPhase::Idle,
            proposals: Vec::new(),
            save_in_progress: false,
            save_items: Vec::new(),
            summary: None,
        }
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source text, recomputing validation.
    pub fn set_source_text(&mut self, text: String) {
        self.source = SourceTextState::new(text);
    }

    /// The loaded generation, if one is ready.
    pub fn generation(&self) -> Option<&Generation> {
        match &self.phase {
            GenerationPhase::Ready { generation } => Some(generation),
            _ => None,
        }
    }

    /// Per-status counts over the proposal list.
    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.proposals)
    }

    // === Generation lifecycle ===

    /// Enter `Generating`: elapsed resets to zero and prior proposals, save
    /// progress, and summary are cleared.
    pub fn begin_generation(&mut self) -> Result<()> {
        if !self.source.validation.is_valid {
            return Err(SessionError::InvalidSourceText);
        }
        if self.save_in_progress {
            return Err(SessionError::SaveInProgress);
        }

        self.phase = GenerationPhase::Generating { elapsed_secs: 0 };
        self.proposals.clear();
        self.save_items.clear();
        self.summary = None;
        Ok(())
    }

    /// One elapsed-timer tick. Counts only while `Generating`.
    pub fn tick_elapsed(&mut self) {
        if let GenerationPhase::Generating { elapsed_secs } = &mut self.phase {
            *elapsed_secs += 1;
        }
    }

    /// Generation succeeded: load proposals and enter `Ready`.
    pub fn complete_generation(&mut self, generation: Generation) {
        self.proposals = generation
            .proposals
            .iter()
            .map(ProposalViewModel::from_proposal)
            .collect();
        self.phase = GenerationPhase::Ready { generation };
    }

    /// Generation hit the rate limiter: start the countdown window.
    pub fn rate_limit(&mut self, retry_after_secs: u64, now: DateTime<Utc>) {
        self.phase = GenerationPhase::RateLimited {
            retry_after_secs,
            reset_at: now + Duration::seconds(retry_after_secs as i64),
        };
    }

    /// One countdown tick. Returns true when the window just cleared.
    pub fn tick_rate_limit(&mut self) -> bool {
        if let GenerationPhase::RateLimited { retry_after_secs, .. } = &mut self.phase {
            *retry_after_secs = retry_after_secs.saturating_sub(1);
            if *retry_after_secs == 0 {
                self.phase = GenerationPhase::Idle;
                return true;
            }
        }
        false
    }

    /// Generation failed for a non-rate-limit reason.
    pub fn fail_generation(&mut self, error: GenerationFailure) {
        self.phase = GenerationPhase::Failed { error };
    }

    // === Proposal review ===

    fn proposal_mut(&mut self, index: usize) -> Result<&mut ProposalViewModel> {
        self.proposals
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfBounds(index))
    }

    pub fn accept(&mut self, index: usize) -> Result<()> {
        self.proposal_mut(index)?.accept();
        Ok(())
    }

    pub fn reject(&mut self, index: usize) -> Result<()> {
        self.proposal_mut(index)?.reject();
        Ok(())
    }

    pub fn edit_field(&mut self, index: usize, field: CardField, value: String) -> Result<()> {
        self.proposal_mut(index)?.edit_field(field, value);
        Ok(())
    }

    // === Batch save ===

    /// Snapshot the saveable set and enter the in-progress state.
    ///
    /// Items are built in proposal order with trimmed text and the source
    /// tag derived from each proposal's status. Returns the generation id
    /// the batch saves against and the number of items.
    pub fn begin_save(&mut self) -> Result<(i64, usize)> {
        if self.save_in_progress {
            return Err(SessionError::SaveInProgress);
        }
        let generation_id = match &self.phase {
            GenerationPhase::Ready { generation } => generation.id,
            _ => return Err(SessionError::NoGeneration),
        };

        let indices = saveable_indices(&self.proposals);
        if indices.is_empty() {
            return Err(SessionError::NothingToSave);
        }

        self.save_items = indices
            .into_iter()
            .map(|i| {
                let proposal = &self.proposals[i];
                SaveProgressItem {
                    proposal_index: i,
                    front: proposal.current_front.trim().to_string(),
                    back: proposal.current_back.trim().to_string(),
                    source: source_for_status(proposal.status),
                    status: SaveItemStatus::Pending,
                    error: None,
                    flashcard_id: None,
                }
            })
            .collect();
        self.save_in_progress = true;
        self.summary = None;

        Ok((generation_id, self.save_items.len()))
    }

    fn save_item_mut(&mut self, position: usize) -> Result<&mut SaveProgressItem> {
        self.save_items
            .get_mut(position)
            .ok_or(SessionError::IndexOutOfBounds(position))
    }

    /// Mark an item as being attempted and return a copy for the caller.
    pub fn start_item(&mut self, position: usize) -> Result<SaveProgressItem> {
        let item = self.save_item_mut(position)?;
        item.status = SaveItemStatus::Saving;
        item.error = None;
        Ok(item.clone())
    }

    pub fn mark_item_duplicate(&mut self, position: usize) -> Result<()> {
        self.save_item_mut(position)?.status = SaveItemStatus::Duplicate;
        Ok(())
    }

    pub fn mark_item_success(&mut self, position: usize, flashcard_id: i64) -> Result<()> {
        let item = self.save_item_mut(position)?;
        item.status = SaveItemStatus::Success;
        item.flashcard_id = Some(flashcard_id);
        Ok(())
    }

    pub fn mark_item_error(&mut self, position: usize, message: String) -> Result<()> {
        let item = self.save_item_mut(position)?;
        item.status = SaveItemStatus::Error;
        item.error = Some(message);
        Ok(())
    }

    /// Close out the batch: compute and store the summary, clear the flag.
    pub fn finish_save(&mut self) -> SaveSummary {
        let summary = SaveSummary::from_items(&self.save_items);
        self.summary = Some(summary.clone());
        self.save_in_progress = false;
        summary
    }

    // === Single-item retry ===

    /// Begin retrying one failed item.
    ///
    /// The item's source is re-derived from its proposal's current status,
    /// so a card edited since the batch ran saves as `ai-edited`. Blocks
    /// concurrent batch saves until the retry completes.
    pub fn begin_retry(&mut self, position: usize) -> Result<SaveProgressItem> {
        if self.save_in_progress {
            return Err(SessionError::SaveInProgress);
        }
        let item = self
            .save_items
            .get(position)
            .ok_or(SessionError::IndexOutOfBounds(position))?;
        if item.status != SaveItemStatus::Error {
            return Err(SessionError::NotRetryable(position));
        }
        let proposal_status = self
            .proposals
            .get(item.proposal_index)
            .map(|p| p.status)
            .unwrap_or(ProposalStatus::Accepted);

        self.save_in_progress = true;
        let item = &mut self.save_items[position];
        item.status = SaveItemStatus::Saving;
        item.error = None;
        item.source = source_for_status(proposal_status);
        Ok(item.clone())
    }

    /// Retry succeeded: update the item and fold it into the summary.
    pub fn complete_retry_success(&mut self, position: usize, flashcard_id: i64) -> Result<()> {
        let (front, back, source) = {
            let item = self.save_item_mut(position)?;
            item.status = SaveItemStatus::Success;
            item.flashcard_id = Some(flashcard_id);
            (item.front.clone(), item.back.clone(), item.source)
        };

        if let Some(summary) = &mut self.summary {
            summary.error_count = summary.error_count.saturating_sub(1);
            summary.success_count += 1;
            match source {
                FlashcardSource::AiEdited => summary.edited_count += 1,
                _ => summary.unedited_count += 1,
            }
            if let Some(pos) = summary
                .failed
                .iter()
                .position(|f| f.front == front && f.back == back)
            {
                summary.failed.remove(pos);
            }
        }

        self.save_in_progress = false;
        Ok(())
    }

    /// Retry failed again: back to `Error` with the new message, summary
    /// untouched.
    pub fn complete_retry_failure(&mut self, position: usize, message: String) -> Result<()> {
        let item = self.save_item_mut(position)?;
        item.status = SaveItemStatus::Error;
        item.error = Some(message);
        self.save_in_progress = false;
        Ok(())
    }

    // === Reset ===

    /// Return to the initial configuration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn source_for_status(status: ProposalStatus) -> FlashcardSource {
    match status {
        ProposalStatus::Edited => FlashcardSource::AiEdited,
        _ => FlashcardSource::AiFull,
    }
}
