// SqliteResultCache — rusqlite-backed ResultCache.
//
// Connection wrapped in tokio::sync::Mutex because rusqlite::Connection is
// !Send; the lock is only ever held across synchronous rusqlite calls, never
// across an .await point (same discipline as the teacher's SqliteDatabase).

use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::warn;

use crate::model::CascadeResult;

use super::ResultCache;

pub struct SqliteResultCache {
    conn: Mutex<Connection>,
}

impl SqliteResultCache {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> anyhow::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cascade_cache (
                key TEXT PRIMARY KEY,
                result_json TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn now_unix() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn lookup_sync(conn: &Connection, key: &str) -> anyhow::Result<Option<CascadeResult>> {
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT result_json, expires_at FROM cascade_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .ok();

        match row {
            Some((json, expires_at)) if expires_at > Self::now_unix() => {
                Ok(Some(serde_json::from_str(&json)?))
            }
            Some(_) => {
                conn.execute("DELETE FROM cascade_cache WHERE key = ?1", params![key])?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store_sync(
        conn: &Connection,
        key: &str,
        result: &CascadeResult,
        ttl: Duration,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(result)?;
        let expires_at = Self::now_unix() + ttl.as_secs() as i64;
        conn.execute(
            "INSERT INTO cascade_cache (key, result_json, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET result_json = excluded.result_json, expires_at = excluded.expires_at",
            params![key, json, expires_at],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ResultCache for SqliteResultCache {
    async fn lookup(&self, key: &str) -> Option<CascadeResult> {
        let conn = self.conn.lock().await;
        match Self::lookup_sync(&conn, key) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &str, result: &CascadeResult, ttl: Duration) {
        let conn = self.conn.lock().await;
        if let Err(e) = Self::store_sync(&conn, key, result, ttl) {
            warn!(error = %e, "cache store failed, continuing without caching");
        }
    }
}
