//! Local draft persistence.
//!
//! A thin key-value wrapper over SQLite storing the in-progress source
//! text under one well-known key, so a crash or reload never loses pasted
//! input. All operations are best-effort from the pipeline's point of
//! view: failures are logged by the caller and never interrupt the flow.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The single well-known key the source-text draft lives under.
pub const DRAFT_KEY: &str = "cardgen:source-draft";

/// Draft store errors.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, DraftError>;

/// Key-value store for source-text drafts.
pub struct DraftStore {
    conn: Connection,
}

impl DraftStore {
    /// Open (and initialize) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open the store at the default location under the local data dir.
    pub fn open_default() -> Result<Self> {
        Self::open(&default_db_path())
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS drafts (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Write the draft, or delete it when the text is blank after trimming.
    pub fn save(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return self.clear();
        }
        self.conn.execute(
            "INSERT INTO drafts (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![DRAFT_KEY, text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Read the draft. Absence and read errors both yield `None`.
    pub fn load(&self) -> Option<String> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM drafts WHERE key = ?1",
                params![DRAFT_KEY],
                |row| row.get(0),
            )
            .optional();

        match result {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load draft");
                None
            }
        }
    }

    /// Delete the draft.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM drafts WHERE key = ?1", params![DRAFT_KEY])?;
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardgen")
        .join("drafts.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load_round_trips() {
        let store = DraftStore::in_memory().unwrap();
        assert_eq!(store.load(), None);

        store.save("half-finished notes").unwrap();
        assert_eq!(store.load().as_deref(), Some("half-finished notes"));
    }

    #[test]
    fn save_overwrites_previous_draft() {
        let store = DraftStore::in_memory().unwrap();
        store.save("first").unwrap();
        store.save("second").unwrap();
        assert_eq!(store.load().as_deref(), Some("second"));
    }

    #[test]
    fn blank_text_deletes_the_draft() {
        let store = DraftStore::in_memory().unwrap();
        store.save("something").unwrap();
        store.save("   \n  ").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clear_removes_the_draft() {
        let store = DraftStore::in_memory().unwrap();
        store.save("something").unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        // Clearing an absent draft is fine.
        store.clear().unwrap();
    }
}
