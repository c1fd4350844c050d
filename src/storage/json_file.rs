// src/storage/json_file.rs
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::KeyValueStore;

/// All slots live in one JSON object on disk; every write replaces the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    slots: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let slots = Self::read_slots(&path);
        Ok(Self { path, slots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(path: &Path) -> BTreeMap<String, String> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("Ignoring malformed store {}: {err}", path.display());
                BTreeMap::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!("Failed to read store {}: {err}", path.display());
                BTreeMap::new()
            }
        }
    }

    fn save(&self) -> io::Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&self.slots).map_err(io::Error::other)?;
        fs::write(&tmp, data)?;
        fs::rename(tmp, &self.path)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.slots.insert(key.to_owned(), value.to_owned());
        self.save()
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        if self.slots.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}
