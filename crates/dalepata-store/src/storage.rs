use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{Result, StoreError};

/// Durable key-value storage on top of SQLite
///
/// One row per key, values are opaque strings (JSON for structured data).
/// The connection sits behind a mutex so every operation, including the
/// read-modify-write in [`DeviceStorage::update_json`], runs alone.
pub struct DeviceStorage {
    conn: Mutex<Connection>,
}

impl DeviceStorage {
    /// Open (or create) the storage file at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        debug!("Opened device storage at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Storage that vanishes with the process. Handy for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        read_value(&conn, key)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        write_value(&conn, key, value)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Remove several keys in one transaction - either all go or none do
    pub fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Read and decode a JSON value. A value that doesn't decode is an error,
    /// not a silent `None`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }

    /// Atomic read-modify-write of a JSON value
    ///
    /// `mutate` gets the current value (or `T::default()` when the key is
    /// absent) and returns whether it changed anything. Nothing is written
    /// when it returns false. Returns the value as it stands afterwards.
    pub fn update_json<T, F>(&self, key: &str, mutate: F) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        self.update_json_inner(key, false, mutate)
    }

    /// Like [`DeviceStorage::update_json`], but a value that doesn't decode
    /// is replaced: `mutate` starts from `T::default()` and its result is
    /// always written.
    pub fn update_json_or_default<T, F>(&self, key: &str, mutate: F) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        self.update_json_inner(key, true, mutate)
    }

    fn update_json_inner<T, F>(&self, key: &str, reset_corrupt: bool, mutate: F) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut replaced = false;
        let mut value: T = match read_value(&tx, key)? {
            Some(raw) => match decode(key, &raw) {
                Ok(value) => value,
                Err(e) if reset_corrupt => {
                    warn!("{}; overwriting it", e);
                    replaced = true;
                    T::default()
                }
                Err(e) => return Err(e),
            },
            None => T::default(),
        };

        if mutate(&mut value) || replaced {
            let raw = serde_json::to_string(&value)?;
            write_value(&tx, key, &raw)?;
        }

        tx.commit()?;
        Ok(value)
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}
