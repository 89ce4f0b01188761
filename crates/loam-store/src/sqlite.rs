//! SQLite implementation of the ObjectStore trait.
//!
//! This is the primary storage backend for loam. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! Records are stored as one JSON blob per row, with the canonical URL,
//! first type tag, parsed published time, and tombstone flag lifted into
//! indexed columns. Containment predicates are evaluated over the scanned
//! candidate rows in process; an inverted property index can replace that
//! scan behind the same trait without touching callers.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use loam_core::{contains, StoredObject};

use crate::error::{Result, StoreError};
use crate::memory::rewrite_prefixes;
use crate::migration;
use crate::traits::{ObjectStore, UpsertOp, UpsertOutcome};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("spawn_blocking failed: {e}")))?
    }
}

/// Escape a URL prefix for use in a LIKE pattern with `ESCAPE '\'`.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Decode the `data` column into a StoredObject.
fn row_to_object(data: &str) -> Result<StoredObject> {
    Ok(serde_json::from_str(data)?)
}

/// Column values derived from a record.
fn derived_columns(record: &StoredObject) -> (String, Option<i64>, bool) {
    let kind = record.types.first().cloned().unwrap_or_default();
    let published = record.published().map(|dt| dt.timestamp_millis());
    (kind, published, record.deleted)
}

#[async_trait]
impl ObjectStore for SqliteStore {
    async fn get_by_url(&self, url: &str) -> Result<Option<StoredObject>> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let data: Option<String> = conn
                .query_row(
                    "SELECT data FROM objects WHERE url = ?1",
                    params![url],
                    |row| row.get(0),
                )
                .optional()?;
            data.as_deref().map(row_to_object).transpose()
        })
        .await
    }

    async fn get_by_url_prefix(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let pattern = format!("{}%", escape_like(prefix));
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT data FROM objects WHERE url LIKE ?1 ESCAPE '\\' ORDER BY url",
            )?;
            let rows = stmt.query_map(params![pattern], |row| row.get::<_, String>(0))?;

            let mut objects = Vec::new();
            for data in rows {
                objects.push(row_to_object(&data?)?);
            }
            Ok(objects)
        })
        .await
    }

    async fn query_by_property_containment(
        &self,
        predicates: &[Value],
    ) -> Result<Vec<StoredObject>> {
        let predicates = predicates.to_vec();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT data FROM objects WHERE deleted = 0 ORDER BY url")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut objects = Vec::new();
            for data in rows {
                let object = row_to_object(&data?)?;
                let properties = Value::Object(object.properties.clone());
                if predicates.iter().any(|p| contains(&properties, p)) {
                    objects.push(object);
                }
            }
            Ok(objects)
        })
        .await
    }

    async fn upsert_batch(&self, records: &[StoredObject]) -> Result<Vec<UpsertOutcome>> {
        // Validate before opening the transaction: a record without a URL
        // aborts the whole batch with nothing written.
        let mut keyed = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let url = record.url().ok_or(StoreError::MissingUrl(index))?;
            keyed.push((url.to_string(), record.clone()));
        }

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let now = now_millis();

            let mut outcomes = Vec::with_capacity(keyed.len());
            for (url, record) in keyed {
                let exists: Option<i64> = tx
                    .query_row(
                        "SELECT 1 FROM objects WHERE url = ?1",
                        params![url],
                        |row| row.get(0),
                    )
                    .optional()?;

                let (kind, published, deleted) = derived_columns(&record);
                let data = serde_json::to_string(&record)?;
                tx.execute(
                    "INSERT INTO objects (url, kind, data, published, deleted, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(url) DO UPDATE SET
                         kind = excluded.kind,
                         data = excluded.data,
                         published = excluded.published,
                         deleted = excluded.deleted,
                         updated_at = excluded.updated_at",
                    params![url, kind, data, published, deleted as i64, now],
                )?;

                let op = if exists.is_some() {
                    UpsertOp::Updated
                } else {
                    UpsertOp::Inserted
                };
                outcomes.push(UpsertOutcome { url, op });
            }

            tx.commit()?;
            debug!(records = outcomes.len(), "upserted batch");
            Ok(outcomes)
        })
        .await
    }

    async fn tombstone(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let data: Option<String> = conn
                .query_row(
                    "SELECT data FROM objects WHERE url = ?1",
                    params![url],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(data) = data else {
                return Ok(false);
            };

            let mut object = row_to_object(&data)?;
            object.deleted = true;
            conn.execute(
                "UPDATE objects SET data = ?2, deleted = 1, updated_at = ?3 WHERE url = ?1",
                params![url, serde_json::to_string(&object)?, now_millis()],
            )?;
            Ok(true)
        })
        .await
    }

    async fn rename_url_prefix(&self, old: &str, new: &str) -> Result<u64> {
        let old = old.to_string();
        let new = new.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let pattern = format!("{}%", escape_like(&old));

            let moving: Vec<(String, String)> = {
                let mut stmt = tx.prepare(
                    "SELECT url, data FROM objects WHERE url LIKE ?1 ESCAPE '\\' ORDER BY url",
                )?;
                let rows = stmt.query_map(params![pattern], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                rows.collect::<std::result::Result<_, _>>()?
            };

            let now = now_millis();
            let mut count = 0u64;
            for (url, data) in moving {
                let mut object = row_to_object(&data)?;
                rewrite_prefixes(&mut object, &old, &new);
                let rest = url.strip_prefix(old.as_str()).unwrap_or(&url);
                let moved_url = format!("{new}{rest}");
                let (kind, published, deleted) = derived_columns(&object);

                tx.execute("DELETE FROM objects WHERE url = ?1", params![url])?;
                tx.execute(
                    "INSERT OR REPLACE INTO objects (url, kind, data, published, deleted, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        moved_url,
                        kind,
                        serde_json::to_string(&object)?,
                        published,
                        deleted as i64,
                        now
                    ],
                )?;
                count += 1;
            }

            tx.commit()?;
            Ok(count)
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
