//! The generation/review/save pipeline orchestrator.
//!
//! Wraps the pure [`ReviewSession`] state machine with its effect layer:
//! backend calls, the 1-second elapsed and rate-limit tickers, debounced
//! draft persistence, and request supersession. All session mutation goes
//! through one async mutex, so transitions never race; network awaits
//! happen with the lock released.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use cardgen_core::dedup::normalize_flashcard_key;
use cardgen_core::error::Result;
use cardgen_core::review::StatusCounts;
use cardgen_core::session::{GenerationFailure, GenerationPhase, ReviewSession};
use cardgen_core::types::SaveSummary;
use cardgen_core::validation::CardField;

use crate::api::{CreateFlashcardInput, FlashcardBackend};
use crate::debounce::Debouncer;
use crate::draft::DraftStore;
use crate::error::ApiError;

/// Quiet period before an edited draft is written to disk.
const DRAFT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Tick interval for the elapsed and rate-limit countdowns.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Inner state shared across clones.
struct PipelineInner<B> {
    backend: B,
    session: AsyncMutex<ReviewSession>,
    drafts: Mutex<DraftStore>,
    debouncer: Debouncer,
    /// Monotonic token identifying the most recent generate request;
    /// responses carrying an older token are discarded.
    request_seq: AtomicU64,
    /// The single active ticker. Only one of the elapsed or rate-limit
    /// countdowns runs at a time; replacing the slot aborts the old task.
    ticker: Mutex<Option<JoinHandle<()>>>,
}

/// Orchestrator for one flashcard generation session.
///
/// Clone-able: all state lives behind an `Arc`, so clones share the same
/// session and can cross async boundaries without holding locks.
pub struct GenerationPipeline<B> {
    inner: Arc<PipelineInner<B>>,
}

impl<B> Clone for GenerationPipeline<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> GenerationPipeline<B>
where
    B: FlashcardBackend + Send + Sync + 'static,
{
    pub fn new(backend: B, drafts: DraftStore) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                backend,
                session: AsyncMutex::new(ReviewSession::new()),
                drafts: Mutex::new(drafts),
                debouncer: Debouncer::new(DRAFT_DEBOUNCE),
                request_seq: AtomicU64::new(0),
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Current session state, cloned for the host to render.
    pub async fn snapshot(&self) -> ReviewSession {
        self.inner.session.lock().await.clone()
    }

    /// Per-status proposal counts.
    pub async fn counts(&self) -> StatusCounts {
        self.inner.session.lock().await.counts()
    }

    /// Load a previously persisted draft into the source text, if any.
    pub async fn restore_draft(&self) {
        let draft = self.inner.drafts.lock().expect("draft store lock").load();
        if let Some(text) = draft {
            tracing::debug!(chars = text.chars().count(), "restored source-text draft");
            self.inner.session.lock().await.set_source_text(text);
        }
    }

    /// Replace the source text; revalidates immediately and persists the
    /// draft after the debounce window.
    pub async fn set_source_text(&self, text: String) {
        {
            let mut session = self.inner.session.lock().await;
            session.set_source_text(text.clone());
        }

        let inner = Arc::clone(&self.inner);
        self.inner.debouncer.call(move || {
            let drafts = inner.drafts.lock().expect("draft store lock");
            if let Err(err) = drafts.save(&text) {
                tracing::warn!(error = %err, "failed to persist draft");
            }
        });
    }

    // === Generation ===

    /// Run one generation attempt.
    ///
    /// Errors only on session misuse (invalid source, save running);
    /// backend failures land in the session phase, not in the return
    /// value. A later `generate` supersedes this one: the stale response
    /// is discarded when it eventually arrives.
    pub async fn generate(&self) -> Result<()> {
        let token = self.inner.request_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let source_text = {
            let mut session = self.inner.session.lock().await;
            session.begin_generation()?;
            session.source.text.trim().to_string()
        };
        self.start_elapsed_ticker();

        let result = self.inner.backend.generate_proposals(&source_text).await;

        if self.inner.request_seq.load(Ordering::SeqCst) != token {
            tracing::debug!("discarding superseded generation response");
            return Ok(());
        }
        self.stop_ticker();

        let mut session = self.inner.session.lock().await;
        match result {
            Ok(generation) => {
                let local_hash = hash_source_text(&source_text);
                if generation.source_text_hash != local_hash {
                    tracing::warn!(
                        server = %generation.source_text_hash,
                        local = %local_hash,
                        "source text hash mismatch"
                    );
                }
                tracing::debug!(
                    generation_id = generation.id,
                    proposals = generation.proposals.len(),
                    "generation ready for review"
                );
                session.complete_generation(generation);
                drop(session);
                // A debounced write still in flight would resurrect the
                // draft after this clear.
                self.inner.debouncer.cancel();
                self.clear_draft();
            }
            Err(ApiError::RateLimited { retry_after_secs }) => {
                session.rate_limit(retry_after_secs, Utc::now());
                drop(session);
                self.start_rate_limit_ticker();
            }
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "generation failed");
                session.fail_generation(GenerationFailure::new(err.code(), err.user_message()));
            }
        }

        Ok(())
    }

    // === Review ===

    pub async fn accept(&self, index: usize) -> Result<()> {
        self.inner.session.lock().await.accept(index)
    }

    pub async fn reject(&self, index: usize) -> Result<()> {
        self.inner.session.lock().await.reject(index)
    }

    pub async fn edit_field(&self, index: usize, field: CardField, value: String) -> Result<()> {
        self.inner.session.lock().await.edit_field(index, field, value)
    }

    // === Batch save ===

    /// Save every saveable proposal, strictly in proposal order.
    ///
    /// Existing flashcards are fetched once for duplicate detection; a
    /// fetch failure degrades to saving without dedup. Each item's outcome
    /// is recorded before the next item starts, and a successful save adds
    /// its key to the set so later items in the batch cannot duplicate it.
    /// Per-item failures never abort the loop.
    pub async fn save_accepted(&self) -> Result<SaveSummary> {
        let (generation_id, item_count) = {
            let mut session = self.inner.session.lock().await;
            session.begin_save()?
        };

        let existing = match self.inner.backend.list_existing_flashcards(None).await {
            Ok(cards) => cards,
            Err(err) => {
                tracing::warn!(error = %err, "existing-flashcard fetch failed; saving without dedup");
                Vec::new()
            }
        };
        let mut seen: HashSet<String> = existing
            .iter()
            .map(|card| normalize_flashcard_key(&card.front, &card.back))
            .collect();

        for position in 0..item_count {
            let item = {
                let mut session = self.inner.session.lock().await;
                session.start_item(position)?
            };

            let key = normalize_flashcard_key(&item.front, &item.back);
            if seen.contains(&key) {
                let mut session = self.inner.session.lock().await;
                session.mark_item_duplicate(position)?;
                continue;
            }

            let input = CreateFlashcardInput {
                front: item.front,
                back: item.back,
                source: item.source,
                generation_id: Some(generation_id),
            };
            match self.inner.backend.create_flashcard(&input).await {
                Ok(card) => {
                    seen.insert(key);
                    let mut session = self.inner.session.lock().await;
                    session.mark_item_success(position, card.id)?;
                }
                Err(err) => {
                    let mut session = self.inner.session.lock().await;
                    session.mark_item_error(position, err.user_message())?;
                }
            }
        }

        let mut session = self.inner.session.lock().await;
        Ok(session.finish_save())
    }

    /// Retry a single failed save item by its position in the batch.
    pub async fn retry_save_item(&self, position: usize) -> Result<()> {
        let (item, generation_id) = {
            let mut session = self.inner.session.lock().await;
            let item = session.begin_retry(position)?;
            let generation_id = session.generation().map(|g| g.id);
            (item, generation_id)
        };

        let input = CreateFlashcardInput {
            front: item.front,
            back: item.back,
            source: item.source,
            generation_id,
        };
        match self.inner.backend.create_flashcard(&input).await {
            Ok(card) => {
                let mut session = self.inner.session.lock().await;
                session.complete_retry_success(position, card.id)
            }
            Err(err) => {
                let mut session = self.inner.session.lock().await;
                session.complete_retry_failure(position, err.user_message())
            }
        }
    }

    /// Return to the initial configuration: clears the session, the
    /// persisted draft, pending debounced writes, and any running ticker.
    pub async fn reset(&self) {
        self.stop_ticker();
        self.inner.debouncer.cancel();
        self.inner.session.lock().await.reset();
        self.clear_draft();
    }

    // === Private ===

    fn start_elapsed_ticker(&self) {
        let inner = Arc::clone(&self.inner);
        self.set_ticker(Some(tokio::spawn(async move {
            loop {
                sleep(TICK_INTERVAL).await;
                let mut session = inner.session.lock().await;
                if matches!(session.phase, GenerationPhase::Generating { .. }) {
                    session.tick_elapsed();
                } else {
                    break;
                }
            }
        })));
    }

    fn start_rate_limit_ticker(&self) {
        let inner = Arc::clone(&self.inner);
        self.set_ticker(Some(tokio::spawn(async move {
            loop {
                sleep(TICK_INTERVAL).await;
                let mut session = inner.session.lock().await;
                if !matches!(session.phase, GenerationPhase::RateLimited { .. }) {
                    break;
                }
                if session.tick_rate_limit() {
                    tracing::debug!("rate limit window cleared");
                    break;
                }
            }
        })));
    }

    /// Install a new ticker, aborting whichever one was running.
    fn set_ticker(&self, handle: Option<JoinHandle<()>>) {
        let mut slot = self.inner.ticker.lock().expect("ticker lock");
        if let Some(old) = slot.take() {
            old.abort();
        }
        *slot = handle;
    }

    fn stop_ticker(&self) {
        self.set_ticker(None);
    }

    fn clear_draft(&self) {
        let drafts = self.inner.drafts.lock().expect("draft store lock");
        if let Err(err) = drafts.clear() {
            tracing::warn!(error = %err, "failed to clear draft");
        }
    }
}

/// SHA-256 hex digest of source text, for cross-checking the server's
/// recorded hash.
pub fn hash_source_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hash_is_stable_hex() {
        let hash = hash_source_text("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_source_text("hello"));
        assert_ne!(hash, hash_source_text("hello "));
    }
}
