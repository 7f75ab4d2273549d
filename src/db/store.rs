//! SQLite-backed idempotency store.
//!
//! Conflict detection rides on the `event_id` PRIMARY KEY: `INSERT OR
//! IGNORE` keeps create-if-absent a single atomic statement, and zero
//! affected rows means another delivery already holds the key.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::DbPool;
use crate::store::{EventStore, StoreError, WebhookEvent};

const EVENT_COLS: &str = "event_id, event_type, payload_hash, processed, retry_count, created_at";

fn now() -> i64 {
    Utc::now().timestamp()
}

fn storage(e: rusqlite::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn event_from_row(row: &Row) -> rusqlite::Result<WebhookEvent> {
    Ok(WebhookEvent {
        event_id: row.get(0)?,
        event_type: row.get(1)?,
        payload_hash: row.get(2)?,
        processed: row.get::<_, i64>(3)? != 0,
        retry_count: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[derive(Clone)]
pub struct SqliteEventStore {
    pool: DbPool,
}

impl SqliteEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, StoreError> {
        self.pool
            .get()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    /// Purge event records older than the retention period.
    /// Runs off the ingestion hot path (startup and the cleanup task).
    /// Returns the number of deleted records. A non-positive retention
    /// means retention is disabled; nothing is deleted.
    pub fn purge_older_than(&self, retention_days: i64) -> Result<usize, StoreError> {
        if retention_days <= 0 {
            return Ok(0);
        }
        let conn = self.conn()?;
        let cutoff = now() - retention_days * 86400;
        conn.execute(
            "DELETE FROM webhook_events WHERE created_at < ?1",
            params![cutoff],
        )
        .map_err(storage)
    }
}

impl EventStore for SqliteEventStore {
    fn try_create(
        &self,
        event_id: &str,
        event_type: &str,
        payload_hash: &str,
    ) -> Result<WebhookEvent, StoreError> {
        let conn = self.conn()?;
        let created_at = now();
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO webhook_events \
                 (event_id, event_type, payload_hash, processed, retry_count, created_at) \
                 VALUES (?1, ?2, ?3, 0, 0, ?4)",
                params![event_id, event_type, payload_hash, created_at],
            )
            .map_err(storage)?;

        if affected == 0 {
            return Err(StoreError::Conflict);
        }

        Ok(WebhookEvent {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            payload_hash: payload_hash.to_string(),
            processed: false,
            retry_count: 0,
            created_at,
        })
    }

    fn get(&self, event_id: &str) -> Result<Option<WebhookEvent>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {EVENT_COLS} FROM webhook_events WHERE event_id = ?1"),
            params![event_id],
            event_from_row,
        )
        .optional()
        .map_err(storage)
    }

    fn mark_retry(&self, event_id: &str, payload_hash: &str) -> Result<WebhookEvent, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE webhook_events \
                 SET retry_count = retry_count + 1, payload_hash = ?2 \
                 WHERE event_id = ?1 RETURNING {EVENT_COLS}"
            ),
            params![event_id, payload_hash],
            event_from_row,
        )
        .optional()
        .map_err(storage)?
        .ok_or_else(|| StoreError::NotFound(event_id.to_string()))
    }

    fn mark_processed(&self, event_id: &str) -> Result<WebhookEvent, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE webhook_events SET processed = 1 \
                 WHERE event_id = ?1 RETURNING {EVENT_COLS}"
            ),
            params![event_id],
            event_from_row,
        )
        .optional()
        .map_err(storage)?
        .ok_or_else(|| StoreError::NotFound(event_id.to_string()))
    }
}
