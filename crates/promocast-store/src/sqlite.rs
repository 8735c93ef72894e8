//! SQLite storage backend: config singleton, destination registry,
//! append-only activity ledger.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use promocast_core::error::{PromoError, Result};
use promocast_core::traits::Storage;
use promocast_core::types::{
    ActivityRecord, BroadcastConfig, Destination, NewDestination, RunState,
    ACTIVITY_SUCCESS_PREFIX,
};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn store_err(e: rusqlite::Error) -> PromoError {
    PromoError::Store(e.to_string())
}

impl SqliteStore {
    /// Open or create the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        tracing::debug!("opened database at {}", path.display());
        Self::init(conn)
    }

    /// In-memory database, used by tests and previews.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                id INTEGER PRIMARY KEY,
                message TEXT NOT NULL DEFAULT '',
                photo TEXT NOT NULL DEFAULT '',
                interval_min INTEGER NOT NULL,
                interval_max INTEGER NOT NULL,
                scheduler_status TEXT NOT NULL,
                preview_id TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS destinations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                group_label TEXT NOT NULL DEFAULT 'default',
                active INTEGER NOT NULL DEFAULT 1,
                last_status TEXT NOT NULL DEFAULT 'unchecked'
            );
            CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                detail TEXT NOT NULL
            );",
        )
        .map_err(store_err)?;

        // Seed the config singleton on first open
        let seed = BroadcastConfig::seed();
        conn.execute(
            "INSERT OR IGNORE INTO config
             (id, message, photo, interval_min, interval_max, scheduler_status, preview_id)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                seed.message,
                seed.photo,
                seed.interval_min,
                seed.interval_max,
                seed.run_state.as_str(),
                seed.preview_id,
            ],
        )
        .map_err(store_err)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PromoError::Store(e.to_string()))
    }
}

fn map_destination(row: &rusqlite::Row<'_>) -> rusqlite::Result<Destination> {
    Ok(Destination {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        name: row.get(2)?,
        group_label: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
        last_status: row.get(5)?,
    })
}

const DEST_COLUMNS: &str = "id, chat_id, name, group_label, active, last_status";

#[async_trait]
impl Storage for SqliteStore {
    async fn load_config(&self) -> Result<BroadcastConfig> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT message, photo, interval_min, interval_max, scheduler_status, preview_id
             FROM config WHERE id = 1",
            [],
            |row| {
                Ok(BroadcastConfig {
                    message: row.get(0)?,
                    photo: row.get(1)?,
                    interval_min: row.get(2)?,
                    interval_max: row.get(3)?,
                    run_state: RunState::parse(&row.get::<_, String>(4)?),
                    preview_id: row.get(5)?,
                })
            },
        )
        .map_err(store_err)
    }

    async fn save_config(&self, config: &BroadcastConfig) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE config SET message = ?1, photo = ?2, interval_min = ?3,
             interval_max = ?4, scheduler_status = ?5, preview_id = ?6 WHERE id = 1",
            rusqlite::params![
                config.message,
                config.photo,
                config.interval_min,
                config.interval_max,
                config.run_state.as_str(),
                config.preview_id,
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_destination(&self, dest: &NewDestination) -> Result<Destination> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO destinations (chat_id, name, group_label) VALUES (?1, ?2, ?3)",
            rusqlite::params![dest.chat_id, dest.name, dest.group_label],
        );
        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                conn.query_row(
                    &format!("SELECT {DEST_COLUMNS} FROM destinations WHERE id = ?1"),
                    rusqlite::params![id],
                    map_destination,
                )
                .map_err(store_err)
            }
            Err(e) => {
                if let rusqlite::Error::SqliteFailure(err, _) = &e {
                    if err.code == rusqlite::ErrorCode::ConstraintViolation {
                        return Err(PromoError::DuplicateDestination(dest.chat_id.clone()));
                    }
                }
                Err(store_err(e))
            }
        }
    }

    async fn delete_destination(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM destinations WHERE id = ?1", rusqlite::params![id])
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    async fn list_destinations(&self) -> Result<Vec<Destination>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DEST_COLUMNS} FROM destinations ORDER BY group_label, name"
            ))
            .map_err(store_err)?;
        let rows = stmt.query_map([], map_destination).map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    async fn active_destinations(&self) -> Result<Vec<Destination>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DEST_COLUMNS} FROM destinations WHERE active = 1 ORDER BY id"
            ))
            .map_err(store_err)?;
        let rows = stmt.query_map([], map_destination).map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    async fn set_destination_active(&self, id: i64, active: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE destinations SET active = ?1 WHERE id = ?2",
            rusqlite::params![active as i64, id],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn set_destination_status(&self, id: i64, status: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE destinations SET last_status = ?1 WHERE id = ?2",
            rusqlite::params![status, id],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn append_activity(&self, detail: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO activity_log (timestamp, detail) VALUES (?1, ?2)",
            rusqlite::params![Utc::now().to_rfc3339(), detail],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, timestamp, detail FROM activity_log ORDER BY id DESC LIMIT ?1")
            .map_err(store_err)?;
        let rows = stmt
            .query_map(rusqlite::params![limit as i64], |row| {
                Ok(ActivityRecord {
                    id: row.get(0)?,
                    timestamp: row
                        .get::<_, String>(1)
                        .map(|s| {
                            DateTime::parse_from_rfc3339(&s)
                                .map(|d| d.with_timezone(&Utc))
                                .unwrap_or_default()
                        })
                        .unwrap_or_default(),
                    detail: row.get(2)?,
                })
            })
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    async fn sent_since(&self, since: DateTime<Utc>) -> Result<u32> {
        let conn = self.lock()?;
        // RFC 3339 UTC timestamps compare lexicographically
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM activity_log
                 WHERE detail LIKE ?1 AND timestamp >= ?2",
                rusqlite::params![format!("{ACTIVITY_SUCCESS_PREFIX}%"), since.to_rfc3339()],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        Ok(count as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promocast_core::types::NewDestination;

    #[tokio::test]
    async fn config_seeded_on_open() {
        let store = SqliteStore::open_in_memory().unwrap();
        let config = store.load_config().await.unwrap();
        assert_eq!(config.interval_min, 30);
        assert_eq!(config.interval_max, 40);
        assert_eq!(config.run_state, RunState::Running);
        assert!(config.message.is_empty());
    }

    #[tokio::test]
    async fn duplicate_chat_id_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dest = NewDestination::new("-100123", "room a", "default");
        store.insert_destination(&dest).await.unwrap();
        let err = store.insert_destination(&dest).await.unwrap_err();
        assert!(matches!(err, PromoError::DuplicateDestination(_)));
        assert_eq!(store.list_destinations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn active_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store
            .insert_destination(&NewDestination::new("1", "a", "default"))
            .await
            .unwrap();
        store
            .insert_destination(&NewDestination::new("2", "b", "default"))
            .await
            .unwrap();
        store.set_destination_active(a.id, false).await.unwrap();
        let active = store.active_destinations().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].chat_id, "2");
    }

    #[tokio::test]
    async fn sent_since_counts_only_success_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let before = Utc::now() - chrono::Duration::seconds(5);
        store.append_activity("sent to 3 active destinations").await.unwrap();
        store.append_activity("broadcast failed: empty template").await.unwrap();
        store.append_activity("sent to 1 active destination").await.unwrap();
        assert_eq!(store.sent_since(before).await.unwrap(), 2);
        let future = Utc::now() + chrono::Duration::seconds(60);
        assert_eq!(store.sent_since(future).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recent_activity_is_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..7 {
            store.append_activity(&format!("entry {i}")).await.unwrap();
        }
        let recent = store.recent_activity(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].detail, "entry 6");
    }

    #[tokio::test]
    async fn corrupt_row_is_reported_not_dropped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_destination(&NewDestination::new("ok", "fine", "default"))
            .await
            .unwrap();
        {
            // Bypass the typed insert to plant a row the mapper rejects
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO destinations (chat_id, active) VALUES ('bad', 'not-a-number')",
                [],
            )
            .unwrap();
        }
        let err = store.list_destinations().await.unwrap_err();
        assert!(matches!(err, PromoError::Store(_)));
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dest = store
            .insert_destination(&NewDestination::new("9", "x", "default"))
            .await
            .unwrap();
        assert!(store.delete_destination(dest.id).await.unwrap());
        assert!(!store.delete_destination(dest.id).await.unwrap());
    }
}
