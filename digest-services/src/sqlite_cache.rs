//! SQLite cache store
//!
//! Timestamps are stored as Unix milliseconds so ordering and retention
//! comparisons happen in SQL.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use digest_core::{CachedItem, FeedItem, LIST_LIMIT};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{error, warn};

use crate::cache_store::{CacheStore, CacheStoreError};

const SELECT_COLUMNS: &str = "id, title, link, comments, guid, author, publish_date, \
     description, summary, marked_as_read, created_at, updated_at";

/// Cache store backed by a SQLite database
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    /// Open (or create) the database at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, CacheStoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CacheStoreError::Io(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (useful for testing)
    pub fn new_in_memory() -> Result<Self, CacheStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheStoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cached_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                comments TEXT NOT NULL DEFAULT '',
                guid TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT '',
                publish_date TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                summary TEXT NOT NULL DEFAULT '',
                marked_as_read INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_cached_items_guid
            ON cached_items(guid);

            CREATE INDEX IF NOT EXISTS idx_cached_items_marked_as_read
            ON cached_items(marked_as_read);
            "#,
        )?;

        Ok(())
    }

    pub fn try_exists(&self, guid: &str) -> Result<bool, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cached_items WHERE guid = ?1",
            params![guid],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    pub fn try_upsert(
        &self,
        item: &FeedItem,
        title: &str,
        summary: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;
        let millis = at.timestamp_millis();

        conn.execute(
            r#"
            INSERT INTO cached_items
                (title, link, comments, guid, author, publish_date, description, summary,
                 marked_as_read, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?9)
            ON CONFLICT(guid) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                updated_at = excluded.updated_at
            "#,
            params![
                title,
                item.link,
                item.comments.as_deref().unwrap_or_default(),
                item.guid,
                item.author.as_deref().unwrap_or_default(),
                item.publish_date(),
                item.description,
                summary,
                millis,
            ],
        )?;

        Ok(())
    }

    pub fn try_fetch(&self, guid: &str) -> Result<Option<CachedItem>, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        let item = conn
            .query_row(
                &format!("SELECT {} FROM cached_items WHERE guid = ?1", SELECT_COLUMNS),
                params![guid],
                row_to_item,
            )
            .optional()?;

        Ok(item)
    }

    /// Returns whether a row was updated
    pub fn try_mark_as_read(&self, guid: &str) -> Result<bool, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        let updated = conn.execute(
            "UPDATE cached_items SET marked_as_read = 1, updated_at = ?1 WHERE guid = ?2",
            params![Utc::now().timestamp_millis(), guid],
        )?;

        Ok(updated > 0)
    }

    pub fn try_list(&self, include_read: bool) -> Result<Vec<CachedItem>, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        let items = if include_read {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM cached_items ORDER BY created_at DESC, id DESC LIMIT ?1",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![LIST_LIMIT as i64], row_to_item)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM cached_items WHERE marked_as_read = 0 \
                 ORDER BY created_at DESC, id DESC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map([], row_to_item)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(items)
    }

    pub fn try_delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::LockError)?;

        let deleted = conn.execute(
            "DELETE FROM cached_items WHERE created_at < ?1",
            params![cutoff.timestamp_millis()],
        )?;

        Ok(deleted)
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<CachedItem> {
    Ok(CachedItem {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        comments: row.get(3)?,
        guid: row.get(4)?,
        author: row.get(5)?,
        publish_date: row.get(6)?,
        description: row.get(7)?,
        summary: row.get(8)?,
        marked_as_read: row.get::<_, i64>(9)? != 0,
        created_at: from_millis(row.get(10)?),
        updated_at: from_millis(row.get(11)?),
    })
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

impl CacheStore for SqliteCacheStore {
    fn exists(&self, guid: &str) -> bool {
        self.try_exists(guid).unwrap_or_else(|e| {
            error!("Failed to check cached item '{}': {}", guid, e);
            false
        })
    }

    fn upsert(&self, item: &FeedItem, title: &str, summary: &str, at: DateTime<Utc>) {
        if let Err(e) = self.try_upsert(item, title, summary, at) {
            error!("Failed to cache item '{}': {}", item.guid, e);
        }
    }

    fn fetch(&self, guid: &str) -> Option<CachedItem> {
        self.try_fetch(guid).unwrap_or_else(|e| {
            error!("Failed to fetch cached item '{}': {}", guid, e);
            None
        })
    }

    fn mark_as_read(&self, guid: &str) {
        match self.try_mark_as_read(guid) {
            Ok(true) => {}
            Ok(false) => warn!("No cached item with guid '{}' to mark as read", guid),
            Err(e) => error!("Failed to mark cached item '{}' as read: {}", guid, e),
        }
    }

    fn list(&self, include_read: bool) -> Vec<CachedItem> {
        self.try_list(include_read).unwrap_or_else(|e| {
            error!("Failed to list cached items: {}", e);
            Vec::new()
        })
    }

    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        self.try_delete_created_before(cutoff).unwrap_or_else(|e| {
            error!("Failed to delete old cached items: {}", e);
            0
        })
    }
}
