//! Append-only SQLite log of relayed completions.
//!
//! One row per successful upstream call. Rows are never updated or deleted
//! by this system; retention is an operator concern. Each handler
//! invocation opens its own short-lived connection, so the only shared
//! state between requests is the database file itself.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a locked database before failing the insert.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A persisted response row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    /// The original request payload, serialized as JSON text.
    pub message: String,
    pub completion_id: Option<String>,
    pub model_used: String,
    /// ISO-8601 UTC, e.g. `2024-01-01T12:00:00Z`.
    pub created_timestamp: String,
    pub content: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Fields for a new row; the identifier is assigned by SQLite on insert.
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub message: String,
    pub completion_id: Option<String>,
    pub model_used: String,
    pub created_timestamp: String,
    pub content: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Aggregate view of the log for the stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LogStats {
    pub total_responses: u64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Response log backed by SQLite.
pub struct ResponseLog {
    conn: Connection,
}

impl ResponseLog {
    /// Open a connection scoped to one caller. Does not touch the schema;
    /// that happens once at startup via [`ResponseLog::init`].
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open response log at {:?}", path))?;

        // WAL plus a busy timeout lets independent per-request writers
        // coexist without surfacing SQLITE_BUSY on a contended insert.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Ok(Self { conn })
    }

    /// Open the log and ensure the schema exists. Idempotent; run once
    /// before the server accepts traffic.
    pub fn init(path: &Path) -> Result<Self> {
        let log = Self::open(path)?;
        log.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS responses (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                message           TEXT NOT NULL,
                completion_id     TEXT,
                model_used        TEXT NOT NULL,
                created_timestamp TEXT NOT NULL,
                content           TEXT NOT NULL,
                prompt_tokens     INTEGER NOT NULL DEFAULT 0,
                completion_tokens INTEGER NOT NULL DEFAULT 0,
                total_tokens      INTEGER NOT NULL DEFAULT 0
            );
            ",
        )?;
        Ok(log)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Write path (the relay handler's single insert)
    // ─────────────────────────────────────────────────────────────────────

    /// Insert one record, returning its assigned identifier.
    pub fn insert(&self, row: &NewResponse) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO responses
                 (message, completion_id, model_used, created_timestamp,
                  content, prompt_tokens, completion_tokens, total_tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.message,
                row.completion_id,
                row.model_used,
                row.created_timestamp,
                row.content,
                row.prompt_tokens,
                row.completion_tokens,
                row.total_tokens,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read path (list / fetch / stats endpoints)
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch one record by identifier.
    pub fn get(&self, id: i64) -> Result<Option<ResponseRecord>> {
        self.conn
            .query_row(
                "SELECT id, message, completion_id, model_used, created_timestamp,
                        content, prompt_tokens, completion_tokens, total_tokens
                 FROM responses WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List records newest first.
    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<ResponseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, message, completion_id, model_used, created_timestamp,
                    content, prompt_tokens, completion_tokens, total_tokens
             FROM responses ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit, offset], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Count all records.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Row count plus token-sum aggregates.
    pub fn stats(&self) -> Result<LogStats> {
        // COALESCE keeps the sums at zero on an empty log.
        self.conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(prompt_tokens), 0),
                        COALESCE(SUM(completion_tokens), 0),
                        COALESCE(SUM(total_tokens), 0)
                 FROM responses",
                [],
                |row| {
                    Ok(LogStats {
                        total_responses: row.get::<_, i64>(0)? as u64,
                        prompt_tokens: row.get(1)?,
                        completion_tokens: row.get(2)?,
                        total_tokens: row.get(3)?,
                    })
                },
            )
            .map_err(Into::into)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResponseRecord> {
    Ok(ResponseRecord {
        id: row.get(0)?,
        message: row.get(1)?,
        completion_id: row.get(2)?,
        model_used: row.get(3)?,
        created_timestamp: row.get(4)?,
        content: row.get(5)?,
        prompt_tokens: row.get(6)?,
        completion_tokens: row.get(7)?,
        total_tokens: row.get(8)?,
    })
}
