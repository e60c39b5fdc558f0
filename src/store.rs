use crate::error::{MergepulseError, Result};
use crate::model::{PullRequest, SCHEMA_VERSION};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::debug;

/// Durable keyed table of closed pull requests.
///
/// The store is the single owner of all cached records: the sync engine
/// only submits upserts, the aggregator only reads. There is no separate
/// sync bookmark; the incremental watermark is always derived live from
/// `max_known_id`.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %db_path.display(), "opening store");
        let conn = Connection::open(db_path)?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pulls (
                id         INTEGER PRIMARY KEY,
                number     INTEGER NOT NULL,
                title      TEXT NOT NULL,
                merged_at  INTEGER,
                created_at INTEGER NOT NULL,
                closed_at  INTEGER NOT NULL,
                author     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pulls_merged_at ON pulls(merged_at);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(MergepulseError::Store(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Inserts the record or replaces the row with the same `id`.
    /// A single statement, so each upsert is atomic on its own.
    pub fn upsert(&mut self, pr: &PullRequest) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO pulls (id, number, title, merged_at, created_at, closed_at, author)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                pr.id,
                pr.number,
                pr.title,
                pr.merged_at.map(|t| t.timestamp()),
                pr.created_at.timestamp(),
                pr.closed_at.timestamp(),
                pr.author,
            ],
        )?;
        Ok(())
    }

    /// Every stored record, in no particular order; the aggregator re-sorts.
    pub fn scan_all(&self) -> Result<Vec<PullRequest>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, number, title, merged_at, created_at, closed_at, author FROM pulls",
        )?;
        let rows = stmt.query_map([], row_to_pull_request)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// The incremental-sync watermark: `None` means the store is empty.
    pub fn max_known_id(&self) -> Result<Option<i64>> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM pulls", [], |row| row.get(0))?;
        Ok(max)
    }

    /// Deletes every row; one statement, so it fully succeeds or fully fails.
    pub fn clear(&mut self) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM pulls", [])?;
        debug!(deleted, "cleared store");
        Ok(())
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pulls", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_pull_request(row: &Row<'_>) -> rusqlite::Result<PullRequest> {
    let merged_at: Option<i64> = row.get(3)?;
    Ok(PullRequest {
        id: row.get(0)?,
        number: row.get(1)?,
        title: row.get(2)?,
        merged_at: merged_at
            .map(|ts| timestamp_to_utc(ts, 3))
            .transpose()?,
        created_at: timestamp_to_utc(row.get(4)?, 4)?,
        closed_at: timestamp_to_utc(row.get(5)?, 5)?,
        author: row.get(6)?,
    })
}

fn timestamp_to_utc(ts: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            column,
            "timestamp".to_string(),
            rusqlite::types::Type::Integer,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn pr(id: i64, merged: bool) -> PullRequest {
        PullRequest {
            id,
            number: id,
            title: format!("change {id}"),
            merged_at: merged.then(|| utc(2024, 1, 10)),
            created_at: utc(2024, 1, 1),
            closed_at: utc(2024, 1, 10),
            author: "octocat".to_string(),
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> Store {
        Store::open(dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn empty_store_has_no_watermark() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.max_known_id().unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.scan_all().unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_row_with_same_id() {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir);

        store.upsert(&pr(7, true)).unwrap();
        let mut updated = pr(7, true);
        updated.title = "retitled".to_string();
        store.upsert(&updated).unwrap();

        let records = store.scan_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 7);
        assert_eq!(records[0].title, "retitled");
    }

    #[test]
    fn unmerged_records_survive_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir);

        store.upsert(&pr(1, false)).unwrap();
        let records = store.scan_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].merged_at, None);
    }

    #[test]
    fn max_known_id_tracks_largest_id() {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir);

        for id in [3, 9, 5] {
            store.upsert(&pr(id, true)).unwrap();
        }
        assert_eq!(store.max_known_id().unwrap(), Some(9));
    }

    #[test]
    fn clear_removes_every_row() {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir);

        store.upsert(&pr(1, true)).unwrap();
        store.upsert(&pr(2, false)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.max_known_id().unwrap(), None);
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        {
            let mut store = Store::open(&db_path).unwrap();
            store.upsert(&pr(42, true)).unwrap();
        }
        let store = Store::open(&db_path).unwrap();
        assert_eq!(store.max_known_id().unwrap(), Some(42));
        assert_eq!(store.scan_all().unwrap()[0], pr(42, true));
    }
}
