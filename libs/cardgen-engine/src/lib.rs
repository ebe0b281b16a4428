//! Effect layer for the flashcard generation pipeline.
//!
//! Provides:
//! - A typed reqwest client for the flashcard backend ([`api`])
//! - The [`ApiError`] taxonomy mapping HTTP failures
//! - SQLite-backed draft persistence ([`draft`])
//! - A generic debounce utility ([`debounce`])
//! - [`GenerationPipeline`], the orchestrator driving the pure
//!   [`cardgen_core::session::ReviewSession`] state machine
//!
//! The crate emits `tracing` events for swallowed best-effort failures;
//! installing a subscriber is the host application's job.

pub mod api;
pub mod debounce;
pub mod draft;
pub mod error;
pub mod pipeline;

pub use api::{CreateFlashcardInput, FlashcardBackend, HttpBackend};
pub use debounce::Debouncer;
pub use draft::{DraftStore, DRAFT_KEY};
pub use error::ApiError;
pub use pipeline::{hash_source_text, GenerationPipeline};
