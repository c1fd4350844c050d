// src/storage/mod.rs
use std::io;
use std::path::Path;

use tracing::warn;

use crate::config::{store_db_path, store_json_path, StoreBackend};

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// String slots addressed by name. Values are opaque text; callers pick the encoding.
pub trait KeyValueStore {
    /// `Ok(None)` when the slot has never been written.
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        (**self).remove(key)
    }
}

/// Open the configured backend under `cache_dir`. A backend that fails to open
/// degrades to an in-memory store so the table stays usable for the session.
pub fn open_store(backend: StoreBackend, cache_dir: &Path) -> Box<dyn KeyValueStore> {
    match backend {
        StoreBackend::JsonFile => match JsonFileStore::open(store_json_path(cache_dir)) {
            Ok(store) => Box::new(store),
            Err(err) => {
                warn!("json store unavailable ({err}); watched state will not persist");
                Box::new(MemoryStore::default())
            }
        },
        StoreBackend::Sqlite => match SqliteStore::open(store_db_path(cache_dir)) {
            Ok(store) => Box::new(store),
            Err(err) => {
                warn!("sqlite store unavailable ({err}); watched state will not persist");
                Box::new(MemoryStore::default())
            }
        },
        StoreBackend::Memory => Box::new(MemoryStore::default()),
    }
}
