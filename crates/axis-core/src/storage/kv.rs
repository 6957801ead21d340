//! SQLite-backed key-value storage.
//!
//! Plays the role of browser local storage: one table, string keys,
//! JSON string values written wholesale.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{data_dir, StateStorage};
use crate::error::StorageError;

pub struct KvStorage {
    conn: Connection,
}

impl KvStorage {
    /// Open the store at `~/.config/axis/axis.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("axis.db");
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl StateStorage for KvStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let kv = KvStorage::open_memory().unwrap();
        assert!(kv.load("test").unwrap().is_none());
        kv.save("test", "hello").unwrap();
        assert_eq!(kv.load("test").unwrap().unwrap(), "hello");
        kv.save("test", "again").unwrap();
        assert_eq!(kv.load("test").unwrap().unwrap(), "again");
        kv.remove("test").unwrap();
        assert!(kv.load("test").unwrap().is_none());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axis.db");
        {
            let kv = KvStorage::open_at(&path).unwrap();
            kv.save("axis_state_v1", "{}").unwrap();
        }
        let kv = KvStorage::open_at(&path).unwrap();
        assert_eq!(kv.load("axis_state_v1").unwrap().as_deref(), Some("{}"));
    }
}
