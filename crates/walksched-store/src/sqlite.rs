//! SQLite-based store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, Document, DocumentWrite, Store, StoreError, StoreResult};

/// SQLite-based store.
///
/// Each document is one row holding its JSON body. Queries run on the
/// blocking pool so a slow disk never stalls the timer tasks.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        lock_conn(&self.conn)
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_conn(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Database(format!("store task failed: {}", e)))?
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Documents keyed by collection + id
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn read_document(conn: &Connection, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ? AND id = ?",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => match serde_json::from_str::<Value>(&body)? {
                Value::Object(doc) => Ok(Some(doc)),
                _ => Err(StoreError::Serialization(format!(
                    "document {}/{} is not a JSON object",
                    collection, id
                ))),
            },
            None => Ok(None),
        }
    }

    fn write_document(conn: &Connection, collection: &str, id: &str, doc: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(doc)?;
        conn.execute(
            "INSERT INTO documents (collection, id, body, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![collection, id, body, walksched_util::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn batch_write_sync(conn: &mut Connection, writes: &[DocumentWrite]) -> StoreResult<()> {
        let tx = conn.transaction()?;

        for write in writes {
            let mut doc = Self::read_document(&tx, &write.collection, &write.id)?.ok_or_else(|| {
                StoreError::NotFound(format!("{}/{}", write.collection, write.id))
            })?;
            write.apply_to(&mut doc);
            Self::write_document(&tx, &write.collection, &write.id, &doc)?;
        }

        tx.commit()?;
        debug!(documents = writes.len(), "Batch committed");
        Ok(())
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Database("connection mutex poisoned".into()))
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let (collection, id) = (collection.to_owned(), id.to_owned());
        self.with_conn(move |conn| Self::read_document(conn, &collection, &id))
            .await
    }

    async fn put(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        let (collection, id) = (collection.to_owned(), id.to_owned());
        self.with_conn(move |conn| Self::write_document(conn, &collection, &id, &doc))
            .await
    }

    async fn batch_write(&self, writes: Vec<DocumentWrite>) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        self.with_conn(move |conn| Self::batch_write_sync(conn, &writes))
            .await
    }

    async fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let event_json = serde_json::to_string(&event.event)?;
        let timestamp = event.timestamp.to_rfc3339();

        event.id = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
                    params![timestamp, event_json],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    async fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
                )?;
                let rows = stmt.query_map([limit as i64], |row| {
                    let id: i64 = row.get(0)?;
                    let timestamp_str: String = row.get(1)?;
                    let event_json: String = row.get(2)?;
                    Ok((id, timestamp_str, event_json))
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for (id, timestamp_str, event_json) in rows {
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| walksched_util::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store connection mutex poisoned");
                false
            }
        }
    }
}
