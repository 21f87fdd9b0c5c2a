//! SQLite-backed lead store.
//!
//! One table, `call_requests` — a plain row-store. The dispatch job only
//! needs a range query on the due column and a single-row conditional
//! update; everything else is intake-side CRUD.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};

use voxlead_core::error::{Result, VoxleadError};
use voxlead_core::traits::FollowUpStore;
use voxlead_core::types::CallRequest;

/// Lead record store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

// Timestamps are stored as fixed-width UTC text so SQL string comparison
// matches chronological order.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

impl SqliteStore {
    /// Open or create the store database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| VoxleadError::Store(format!("DB open: {e}")))?;

        // WAL gives concurrent readers read-after-write visibility of
        // email_sent_at across overlapping dispatch runs.
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS call_requests (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                email TEXT,
                phone TEXT NOT NULL,
                created_at TEXT NOT NULL,
                scheduled_email_at TEXT,
                email_sent_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_call_requests_scheduled
                ON call_requests (scheduled_email_at);
         ",
        )
        .map_err(|e| VoxleadError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VoxleadError::Store(format!("Lock: {e}")))
    }

    /// Insert a new booking row.
    pub fn insert(&self, record: &CallRequest) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO call_requests
             (id, name, email, phone, created_at, scheduled_email_at, email_sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.name,
                record.email,
                record.phone,
                ts(record.created_at),
                record.scheduled_email_at.map(ts),
                record.email_sent_at.map(ts),
            ],
        )
        .map_err(|e| VoxleadError::Store(format!("Insert: {e}")))?;
        tracing::debug!("💾 Call request saved: {}", record.id);
        Ok(())
    }

    /// Fetch one record by ID.
    pub fn get(&self, id: &str) -> Result<Option<CallRequest>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, phone, created_at, scheduled_email_at, email_sent_at
                 FROM call_requests WHERE id = ?1",
            )
            .map_err(|e| VoxleadError::Store(format!("Get: {e}")))?;
        let mut rows = stmt
            .query_map([id], row_to_record)
            .map_err(|e| VoxleadError::Store(format!("Get: {e}")))?;
        match rows.next() {
            Some(row) => row
                .map(Some)
                .map_err(|e| VoxleadError::Store(format!("Get: {e}"))),
            None => Ok(None),
        }
    }

    /// Total stored rows.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM call_requests", [], |row| row.get(0))
            .map_err(|e| VoxleadError::Store(format!("Count: {e}")))
    }

    /// Due, unsent records with a recipient, oldest due first.
    pub fn find_due_sync(&self, now: DateTime<Utc>) -> Result<Vec<CallRequest>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, phone, created_at, scheduled_email_at, email_sent_at
                 FROM call_requests
                 WHERE email IS NOT NULL
                   AND email_sent_at IS NULL
                   AND scheduled_email_at IS NOT NULL
                   AND scheduled_email_at <= ?1
                 ORDER BY scheduled_email_at ASC",
            )
            .map_err(|e| VoxleadError::Store(format!("Find due: {e}")))?;
        let rows = stmt
            .query_map([ts(now)], row_to_record)
            .map_err(|e| VoxleadError::Store(format!("Find due: {e}")))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| VoxleadError::Store(format!("Find due: {e}")))
    }

    /// Stamp `email_sent_at` for one record. Zero rows affected means the
    /// record was already marked (or never existed) — not an error.
    pub fn mark_sent_sync(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE call_requests SET email_sent_at = ?2
                 WHERE id = ?1 AND email_sent_at IS NULL",
                params![id, ts(sent_at)],
            )
            .map_err(|e| VoxleadError::Store(format!("Mark sent: {e}")))?;
        if changed == 0 {
            tracing::debug!("Record {id} already marked sent — no-op");
        }
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CallRequest> {
    let created_at_str: String = row.get(4)?;
    let scheduled_str: Option<String> = row.get(5)?;
    let sent_str: Option<String> = row.get(6)?;
    Ok(CallRequest {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
        scheduled_email_at: scheduled_str.as_deref().and_then(parse_ts),
        email_sent_at: sent_str.as_deref().and_then(parse_ts),
    })
}

#[async_trait]
impl FollowUpStore for SqliteStore {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<CallRequest>> {
        self.find_due_sync(now)
    }

    async fn mark_sent(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()> {
        self.mark_sent_sync(id, sent_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store(name: &str) -> (SqliteStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("voxlead-store-{name}"));
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("test.db");
        std::fs::remove_file(&path).ok();
        (SqliteStore::open(&path).unwrap(), dir)
    }

    fn record(email: Option<&str>, due_offset: Option<Duration>) -> CallRequest {
        let now = Utc::now();
        let mut rec = CallRequest::new("Lead", email, "+919876543210", Duration::zero());
        rec.scheduled_email_at = due_offset.map(|d| now + d);
        rec
    }

    #[test]
    fn test_open_and_migrate_empty() {
        let (store, dir) = temp_store("empty");
        assert!(store.find_due_sync(Utc::now()).unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_insert_and_get() {
        let (store, dir) = temp_store("roundtrip");
        let rec = record(Some("lead@example.com"), Some(Duration::minutes(-5)));
        store.insert(&rec).unwrap();

        let loaded = store.get(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.id, rec.id);
        assert_eq!(loaded.email.as_deref(), Some("lead@example.com"));
        assert_eq!(loaded.phone, "+919876543210");
        assert!(loaded.email_sent_at.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_find_due_filters() {
        let (store, dir) = temp_store("filters");
        let now = Utc::now();

        let due = record(Some("due@example.com"), Some(Duration::minutes(-5)));
        let future = record(Some("future@example.com"), Some(Duration::minutes(5)));
        let no_email = record(None, Some(Duration::minutes(-5)));
        let never = record(Some("never@example.com"), None);
        let mut sent = record(Some("sent@example.com"), Some(Duration::minutes(-10)));
        sent.email_sent_at = Some(now);

        for rec in [&due, &future, &no_email, &never, &sent] {
            store.insert(rec).unwrap();
        }

        let found = store.find_due_sync(now).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_find_due_oldest_first() {
        let (store, dir) = temp_store("order");
        let now = Utc::now();

        let newer = record(Some("newer@example.com"), Some(Duration::minutes(-1)));
        let older = record(Some("older@example.com"), Some(Duration::minutes(-30)));
        store.insert(&newer).unwrap();
        store.insert(&older).unwrap();

        let found = store.find_due_sync(now).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, older.id);
        assert_eq!(found[1].id, newer.id);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mark_sent_first_write_wins() {
        let (store, dir) = temp_store("idempotent");
        let rec = record(Some("lead@example.com"), Some(Duration::minutes(-5)));
        store.insert(&rec).unwrap();

        let t1 = Utc::now();
        let t2 = t1 + Duration::minutes(10);
        store.mark_sent_sync(&rec.id, t1).unwrap();
        store.mark_sent_sync(&rec.id, t2).unwrap();

        let loaded = store.get(&rec.id).unwrap().unwrap();
        let sent = loaded.email_sent_at.unwrap();
        assert!((sent - t1).num_seconds().abs() < 1);
        assert!(sent < t2);

        // Marked rows drop out of the due set regardless of due time.
        assert!(store.find_due_sync(t2).unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mark_sent_unknown_id_is_noop() {
        let (store, dir) = temp_store("unknown");
        store.mark_sent_sync("no-such-id", Utc::now()).unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }
}
