//! Durable local storage for reminders and conversation memory
//!
//! Both collections live in one SQLite file, one row per logical table
//! holding the full collection as JSON. A connection is opened for each
//! operation and dropped afterwards, so several `parley` processes (for
//! example `reminders watch` next to `chat`) can share the same file.
//! Read-modify-write updates run inside an `IMMEDIATE` transaction.

use crate::config::StorageConfig;
use crate::error::{ParleyError, Result};
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod types;
pub use types::Table;

/// How long a connection waits for another process holding the write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Handle to the local store
///
/// Cloning is cheap; clones share the same location and the same update
/// lock.
#[derive(Clone)]
pub struct Storage {
    backing: Backing,
    update_lock: Arc<Mutex<()>>,
}

#[derive(Clone)]
enum Backing {
    /// Database file, opened per operation
    File(PathBuf),
    /// Private in-memory database kept alive by this handle
    Memory(Arc<Mutex<Connection>>),
}

fn storage_error(action: &'static str) -> impl Fn(rusqlite::Error) -> ParleyError {
    move |e| ParleyError::Storage(format!("{}: {}", action, e))
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(storage_error("Failed to open database"))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(storage_error("Failed to configure database"))?;
    Ok(conn)
}

fn read_blob(conn: &Connection, table: Table) -> Result<Option<String>> {
    let blob = conn
        .query_row(
            "SELECT data FROM collections WHERE name = ?1",
            params![table.key()],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_error("Failed to read table"))?;
    Ok(blob)
}

fn write_blob(conn: &Connection, table: Table, data: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO collections (name, data, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![table.key(), data, Utc::now().to_rfc3339()],
    )
    .map_err(storage_error("Failed to write table"))?;
    Ok(())
}

/// Deserialize a table blob; corruption is logged and read as empty
fn decode<T: DeserializeOwned>(table: Table, blob: Option<String>) -> Vec<T> {
    let Some(blob) = blob else {
        return Vec::new();
    };
    match serde_json::from_str(&blob) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(%table, "Stored table is corrupted, treating as empty: {}", e);
            Vec::new()
        }
    }
}

fn encode<T: Serialize>(records: &[T]) -> Result<String> {
    serde_json::to_string(records)
        .map_err(|e| ParleyError::Storage(format!("Serialization failed: {}", e)).into())
}

impl Storage {
    /// Open or create a store at the given file path
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Storage` if the directory or schema cannot be
    /// created
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::storage::Storage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = Storage::open(dir.path().join("parley.db")).unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ParleyError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let conn = open_connection(path)?;
        conn.execute(SCHEMA, [])
            .map_err(storage_error("Failed to create tables"))?;
        tracing::debug!("Opened storage at {}", path.display());

        Ok(Self {
            backing: Backing::File(path.to_path_buf()),
            update_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Open the store described by configuration
    ///
    /// Falls back to the platform data directory when no path is configured.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::open(path),
            None => Self::open(default_storage_path()?),
        }
    }

    /// Create a throwaway in-memory store
    pub fn temporary() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(storage_error("Failed to open database"))?;
        conn.execute(SCHEMA, [])
            .map_err(storage_error("Failed to create tables"))?;
        Ok(Self {
            backing: Backing::Memory(Arc::new(Mutex::new(conn))),
            update_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Run `f` on a connection to this store
    fn with_connection<R>(&self, f: impl FnOnce(&mut Connection) -> Result<R>) -> Result<R> {
        match &self.backing {
            Backing::File(path) => {
                let mut conn = open_connection(path)?;
                f(&mut conn)
            }
            Backing::Memory(shared) => {
                let mut conn = shared
                    .lock()
                    .map_err(|_| ParleyError::Storage("Database lock poisoned".to_string()))?;
                f(&mut conn)
            }
        }
    }

    /// Load every record of a table
    ///
    /// A missing table is empty. An unreadable or corrupted blob is logged
    /// and also treated as empty.
    pub fn load<T: DeserializeOwned>(&self, table: Table) -> Vec<T> {
        match self.with_connection(|conn| read_blob(conn, table)) {
            Ok(blob) => decode(table, blob),
            Err(e) => {
                tracing::error!(%table, "Failed to read table: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Replace the contents of a table
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Storage` if serialization or writing fails
    pub fn save<T: Serialize>(&self, table: Table, records: &[T]) -> Result<()> {
        let data = encode(records)?;
        self.with_connection(|conn| write_blob(conn, table, &data))?;
        tracing::debug!(%table, records = records.len(), "Persisted table");
        Ok(())
    }

    /// Load, mutate and persist a table as one critical section
    ///
    /// Updates through clones of this handle are serialized by a lock, and
    /// updates from other processes by the database write lock, so a status
    /// change and a delete on the same table cannot interleave.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Storage` if the lock is poisoned or persisting fails
    pub fn update<T, R, F>(&self, table: Table, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|_| ParleyError::Storage("Storage update lock poisoned".to_string()))?;

        self.with_connection(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage_error("Failed to start transaction"))?;

            let mut records: Vec<T> = decode(table, read_blob(&tx, table)?);
            let result = f(&mut records);
            write_blob(&tx, table, &encode(&records)?)?;

            tx.commit()
                .map_err(storage_error("Failed to commit transaction"))?;
            Ok(result)
        })
    }

    /// Remove a table entirely
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Storage` if removal fails
    pub fn clear(&self, table: Table) -> Result<()> {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|_| ParleyError::Storage("Storage update lock poisoned".to_string()))?;

        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM collections WHERE name = ?1",
                params![table.key()],
            )
            .map_err(storage_error("Failed to clear table"))?;
            Ok(())
        })?;

        tracing::info!(%table, "Cleared table");
        Ok(())
    }

    /// Write raw text under a table name, bypassing serialization
    #[cfg(test)]
    pub(crate) fn put_raw(&self, table: Table, raw: &str) -> Result<()> {
        self.with_connection(|conn| write_blob(conn, table, raw))
    }
}

/// Default database location inside the user's data directory
fn default_storage_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "parley", "parley")
        .ok_or_else(|| ParleyError::Storage("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().join("parley.db"))
}
