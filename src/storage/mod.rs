//! Durable client-local key-value storage
//!
//! DocBot keeps exactly two pieces of client-local state across runs: the
//! active session token and the theme preference. Both live in a
//! [`KeyValueStore`] that is created once at startup and injected into the
//! components that own each key.

use crate::error::{DocbotError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key holding the serialized active session
pub const SESSION_KEY: &str = "session_token";

/// Key holding the theme preference
pub const THEME_KEY: &str = "theme";

/// Environment variable overriding the on-disk state database location
pub const STATE_DB_ENV: &str = "DOCBOT_STATE_DB";

/// Durable string key-value storage
///
/// Each key has a single writer: only `SessionIdentity` writes
/// [`SESSION_KEY`] and only `ThemePreference` writes [`THEME_KEY`].
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store living in the user's data directory
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open the store at its default location
    ///
    /// Honors [`STATE_DB_ENV`] when set; otherwise uses `state.db` inside the
    /// platform data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STATE_DB_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "docbot", "docbot")
            .ok_or_else(|| storage_error("Could not determine data directory"))?;

        Self::new_with_path(proj_dirs.data_dir().join("state.db"))
    }

    /// Open the store at an explicit path, creating parent directories
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::storage::{KeyValueStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("state.db")).unwrap();
    /// store.set("theme", "light").unwrap();
    /// assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for state database")
                .map_err(|e| storage_error(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Location of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| storage_error(e.to_string()))?;
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open state database")
            .map_err(|e| storage_error(e.to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to query key")
            .map_err(|e| storage_error(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write key")
        .map_err(|e| storage_error(e.to_string()))?;
        tracing::debug!("Persisted key {} to {}", key, self.db_path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| storage_error(e.to_string()))?;
        Ok(())
    }
}

/// In-process store for ephemeral runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| storage_error("Failed to acquire lock on memory store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| storage_error("Failed to acquire lock on memory store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| storage_error("Failed to acquire lock on memory store"))?;
        entries.remove(key);
        Ok(())
    }
}

fn storage_error(message: impl Into<String>) -> anyhow::Error {
    DocbotError::Storage(message.into()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store =
            SqliteStore::new_with_path(dir.path().join("state.db")).expect("failed to create store");
        (store, dir)
    }

    #[test]
    fn test_sqlite_store_init_creates_table() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='kv'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_sqlite_store_get_missing_key() {
        let (store, _dir) = create_test_store();
        assert!(store.get(SESSION_KEY).expect("get failed").is_none());
    }

    #[test]
    fn test_sqlite_store_set_overwrites() {
        let (store, _dir) = create_test_store();
        store.set(THEME_KEY, "dark").expect("set failed");
        store.set(THEME_KEY, "light").expect("set failed");
        assert_eq!(
            store.get(THEME_KEY).expect("get failed").as_deref(),
            Some("light")
        );
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempdir().expect("failed to create tempdir");
        let path = dir.path().join("state.db");
        {
            let store = SqliteStore::new_with_path(&path).expect("create");
            store.set(SESSION_KEY, "token-1").expect("set failed");
        }
        let reopened = SqliteStore::new_with_path(&path).expect("reopen");
        assert_eq!(
            reopened.get(SESSION_KEY).expect("get failed").as_deref(),
            Some("token-1")
        );
    }

    #[test]
    fn test_sqlite_store_remove() {
        let (store, _dir) = create_test_store();
        store.set(SESSION_KEY, "token-1").expect("set failed");
        store.remove(SESSION_KEY).expect("remove failed");
        store.remove(SESSION_KEY).expect("second remove is a no-op");
        assert!(store.get(SESSION_KEY).expect("get failed").is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryStore::new();
        store.set(SESSION_KEY, "token-1").expect("set failed");
        store.set(THEME_KEY, "light").expect("set failed");
        store.remove(THEME_KEY).expect("remove failed");
        assert_eq!(
            store.get(SESSION_KEY).expect("get failed").as_deref(),
            Some("token-1")
        );
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("state.db");
        env::set_var(STATE_DB_ENV, db_path.to_string_lossy().to_string());

        let store = SqliteStore::new().expect("new failed with env override");
        assert_eq!(store.path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var(STATE_DB_ENV);
    }
}
