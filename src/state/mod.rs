use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;

use crate::dashboard::Route;

const AUTH_TOKEN_KEY: &str = "auth_token";
const LAST_ROUTE_KEY: &str = "last_route";

/// Errors that can occur during local state operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed key/value store for client-local state.
///
/// Holds what a browser would keep in local storage: the backend auth token
/// and the last screen the operator had open.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a throwaway in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn auth_token(&self) -> Result<Option<String>> {
        Ok(self
            .get(AUTH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    pub fn set_auth_token(&mut self, token: &str) -> Result<()> {
        self.set(AUTH_TOKEN_KEY, token.trim())
    }

    pub fn clear_auth_token(&mut self) -> Result<bool> {
        self.remove(AUTH_TOKEN_KEY)
    }

    /// Last opened screen; unknown stored paths are ignored.
    pub fn last_route(&self) -> Result<Option<Route>> {
        Ok(self
            .get(LAST_ROUTE_KEY)?
            .and_then(|path| Route::from_path(&path)))
    }

    pub fn set_last_route(&mut self, route: Route) -> Result<()> {
        self.set(LAST_ROUTE_KEY, route.path())
    }
}
