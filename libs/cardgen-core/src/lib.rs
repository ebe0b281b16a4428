//! Core library for the AI flashcard generation pipeline.
//!
//! Provides:
//! - Source-text and card-field validation
//! - Proposal review transitions (accept/edit/reject) and status tallies
//! - The generation/review/save session state machine (pure transitions)
//! - Duplicate-detection key normalization
//! - Retry-After parsing and elapsed-time formatting
//!
//! Everything here is synchronous and I/O-free; the engine crate supplies
//! network calls, timers, and persistence.

pub mod dedup;
pub mod error;
pub mod review;
pub mod session;
pub mod timing;
pub mod types;
pub mod validation;

pub use dedup::{is_duplicate, normalize_flashcard_key};
pub use error::{Result, SessionError};
pub use review::{saveable_indices, FieldErrors, ProposalStatus, ProposalViewModel, StatusCounts};
pub use session::{GenerationFailure, GenerationPhase, ReviewSession, SourceTextState};
pub use timing::{format_elapsed_time, parse_retry_after, DEFAULT_RETRY_AFTER_SECS};
pub use types::{
    FailedCard, Flashcard, FlashcardSource, Generation, Proposal, SaveItemStatus,
    SaveProgressItem, SaveSummary,
};
pub use validation::{
    validate_proposal_field, validate_source_text, CardField, SourceTextValidation,
    BACK_MAX_CHARS, FRONT_MAX_CHARS, SOURCE_TEXT_MAX_CHARS, SOURCE_TEXT_MIN_CHARS,
};
