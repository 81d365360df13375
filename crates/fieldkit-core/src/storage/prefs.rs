//! Namespaced key-value preference stores.
//!
//! Provides:
//! - [`PreferenceStore`]: the storage seam every plugin component receives
//! - [`SqlitePreferences`]: SQLite-backed store in the data directory
//! - [`MemoryPreferences`]: process-local store for tests and embedding

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{CoreError, StorageError};

/// Persistent key-value store scoped per named namespace.
///
/// Values are opaque strings; callers own the encoding.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Mutex guarding read-modify-write cycles on `(namespace, key)`.
    ///
    /// Every call with the same pair on the same store returns the same mutex.
    fn collection_lock(&self, namespace: &str, key: &str) -> Arc<Mutex<()>>;
}

/// Registry of per-collection mutexes, created on first use.
#[derive(Default)]
pub struct CollectionLocks {
    locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl CollectionLocks {
    pub fn get(&self, namespace: &str, key: &str) -> Arc<Mutex<()>> {
        // The map only ever gains entries, so a poisoned registry is still usable.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry((namespace.to_string(), key.to_string()))
                .or_default(),
        )
    }
}

/// SQLite preference store.
///
/// One `prefs` table keyed by `(namespace, key)`. The connection sits behind
/// a mutex so the store can be shared across threads.
pub struct SqlitePreferences {
    conn: Mutex<Connection>,
    locks: CollectionLocks,
}

impl SqlitePreferences {
    /// Open the store at `<data_dir>/fieldkit.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("fieldkit.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
            locks: CollectionLocks::default(),
        };
        store.migrate()?;
        tracing::debug!(path = %path.display(), "opened preference store");
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            locks: CollectionLocks::default(),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                namespace  TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );",
        )?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM prefs WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO prefs (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock()?;
        conn.execute(
            "DELETE FROM prefs WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(())
    }

    fn collection_lock(&self, namespace: &str, key: &str) -> Arc<Mutex<()>> {
        self.locks.get(namespace, key)
    }
}

/// In-memory preference store.
#[derive(Default)]
pub struct MemoryPreferences {
    entries: Mutex<HashMap<(String, String), String>>,
    locks: CollectionLocks,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock()?;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()?;
        entries.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()?;
        entries.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn collection_lock(&self, namespace: &str, key: &str) -> Arc<Mutex<()>> {
        self.locks.get(namespace, key)
    }
}
