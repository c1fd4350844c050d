// src/storage/sqlite.rs
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;

const SQL_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
  key   TEXT PRIMARY KEY,
  value TEXT NOT NULL
)
"#;

const SQL_UPSERT: &str = r#"
INSERT INTO kv (key, value) VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#;

fn sql_err(e: rusqlite::Error) -> io::Error {
    io::Error::other(e)
}

pub struct SqliteStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path).map_err(sql_err)?;
        conn.execute(SQL_CREATE, []).map_err(sql_err)?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(sql_err)
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.conn
            .execute(SQL_UPSERT, params![key, value])
            .map(|_| ())
            .map_err(sql_err)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map(|_| ())
            .map_err(sql_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.get("movies_1").unwrap(), None);
            store.set("movies_1", "[1]").unwrap();
            store.set("movies_1", "[2]").unwrap();
            store.set("scratch", "x").unwrap();
            store.remove("scratch").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("movies_1").unwrap().as_deref(), Some("[2]"));
        assert_eq!(store.get("scratch").unwrap(), None);
    }
}
