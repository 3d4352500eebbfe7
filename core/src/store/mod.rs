//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engines call store methods; they never execute SQL directly.
//!
//! Every component table has the same physical shape (`key BLOB`,
//! `value TEXT`), so reads and writes are generic over [`Table`].
//! Absent keys read back as `None`; that is never an error.

mod counters;
mod events;
mod key;

pub use counters::Count;
pub use key::TableKey;

use crate::{
    error::{StateError, StateResult},
    tables::Table,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct WorldStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl WorldStore {
    pub fn open(path: &str) -> StateResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        log::info!("opened world store at {path}");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> StateResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// Open a second connection to the same database, e.g. one per worker.
    /// For in-memory databases this returns a new, isolated database.
    pub fn reopen(&self) -> StateResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> StateResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_components.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_event_log.sql"))?;
        Ok(())
    }

    /// Names of the tables currently present in the database.
    pub fn table_names(&self) -> StateResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ── Atomic units ───────────────────────────────────────────

    /// Run `op` as one all-or-nothing unit.
    ///
    /// Backed by a SQLite savepoint: released when `op` returns `Ok`,
    /// rolled back when it returns `Err`. Units nest.
    pub fn atomic<R>(&self, op: impl FnOnce() -> StateResult<R>) -> StateResult<R> {
        self.conn.execute_batch("SAVEPOINT state_op;")?;
        match op() {
            Ok(value) => {
                self.conn.execute_batch("RELEASE state_op;")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO state_op; RELEASE state_op;")
                {
                    log::error!("rollback after '{err}' failed: {rollback}");
                }
                Err(err)
            }
        }
    }

    // ── Generic table access ───────────────────────────────────

    pub fn get<T: Table>(&self, key: &T::Key) -> StateResult<Option<T::Record>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", T::NAME);
        let raw: Option<String> = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key.encode()], |row| row.get(0))
            .optional()?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    /// Read a row, treating an absent key as the record's zero value.
    pub fn get_or_default<T: Table>(&self, key: &T::Key) -> StateResult<T::Record>
    where
        T::Record: Default,
    {
        Ok(self.get::<T>(key)?.unwrap_or_default())
    }

    pub fn contains<T: Table>(&self, key: &T::Key) -> StateResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE key = ?1", T::NAME);
        let found: Option<i64> = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key.encode()], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn set<T: Table>(&self, key: &T::Key, record: &T::Record) -> StateResult<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)",
            T::NAME
        );
        let json = serde_json::to_string(record)?;
        self.conn
            .prepare_cached(&sql)?
            .execute(params![key.encode(), json])?;
        Ok(())
    }

    /// Remove a row. Returns whether a row was present.
    pub fn delete<T: Table>(&self, key: &T::Key) -> StateResult<bool> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", T::NAME);
        let removed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params![key.encode()])?;
        Ok(removed > 0)
    }

    /// All rows whose encoded key starts with `prefix`, in key order.
    /// For `Balance` a 16-byte resource type prefix yields every holder.
    pub fn scan_prefix<T: Table>(&self, prefix: &[u8]) -> StateResult<Vec<(T::Key, T::Record)>> {
        let sql = format!(
            "SELECT key, value FROM {} WHERE substr(key, 1, ?2) = ?1 ORDER BY key",
            T::NAME
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_map(params![prefix, prefix.len() as i64], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(key, json)| decode_row::<T>(&key, &json))
            .collect()
    }

    /// Every key in a table, in key order.
    pub fn keys<T: Table>(&self) -> StateResult<Vec<T::Key>> {
        let sql = format!("SELECT key FROM {} ORDER BY key", T::NAME);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        raw.iter()
            .map(|bytes| T::Key::decode(bytes).ok_or_else(|| invalid_key::<T>(bytes.len())))
            .collect()
    }

    pub fn row_count<T: Table>(&self) -> StateResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::NAME);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

fn decode_row<T: Table>(key: &[u8], json: &str) -> StateResult<(T::Key, T::Record)> {
    let key = T::Key::decode(key).ok_or_else(|| invalid_key::<T>(key.len()))?;
    Ok((key, serde_json::from_str(json)?))
}

fn invalid_key<T: Table>(len: usize) -> StateError {
    StateError::InvalidKey {
        table:  T::NAME,
        reason: format!("stored key is {len} bytes, expected {}", T::Key::WIDTH),
    }
}
