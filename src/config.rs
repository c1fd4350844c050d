use std::{fs, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_CACHE_DIR: &str = ".cinelist";
pub const DEFAULT_MOVIES_FILE: &str = "movies.json";
pub const DEFAULT_GENRES_FILE: &str = "genres.json";
pub const TMDB_IMG_URL: &str = "https://image.tmdb.org/t/p/w500";
/// America/Sao_Paulo has stayed on UTC-3 since DST was abolished in 2019.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    JsonFile,
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" | "file" => Some(Self::JsonFile),
            "sqlite" | "db" => Some(Self::Sqlite),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::JsonFile
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cache_dir: Option<String>,
    pub store_backend: StoreBackend,
    pub movies_file: String,
    pub genres_file: String,
    pub poster_base_url: String,
    pub utc_offset_hours: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            store_backend: StoreBackend::default(),
            movies_file: DEFAULT_MOVIES_FILE.to_string(),
            genres_file: DEFAULT_GENRES_FILE.to_string(),
            poster_base_url: TMDB_IMG_URL.to_string(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    cache_dir: Option<String>,
    #[serde(alias = "storage")]
    store_backend: Option<String>,
    movies_file: Option<String>,
    genres_file: Option<String>,
    poster_base_url: Option<String>,
    utc_offset_hours: Option<i32>,
}

pub fn load_config() -> AppConfig {
    let cfg_path = PathBuf::from("config.json");
    match fs::read_to_string(&cfg_path) {
        Ok(raw) => {
            let cfg = parse_config(&raw);
            info!("Loaded config from {}", cfg_path.display());
            cfg
        }
        Err(_) => {
            info!("No config.json found; using defaults");
            AppConfig::default()
        }
    }
}

/// Merge a raw `config.json` body over the defaults. Parse failures fall back to defaults.
pub fn parse_config(raw: &str) -> AppConfig {
    let mut cfg = AppConfig::default();

    let parsed = match serde_json::from_str::<RawConfig>(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("Failed to parse config.json ({}). Using defaults.", err);
            return cfg;
        }
    };

    if parsed.cache_dir.is_some() {
        cfg.cache_dir = parsed.cache_dir;
    }
    if let Some(mode) = parsed.store_backend {
        match StoreBackend::from_str(&mode) {
            Some(kind) => cfg.store_backend = kind,
            None => warn!("Unknown store_backend `{mode}` in config.json; falling back to json."),
        }
    }
    if let Some(path) = parsed.movies_file {
        cfg.movies_file = path;
    }
    if let Some(path) = parsed.genres_file {
        cfg.genres_file = path;
    }
    if let Some(url) = parsed.poster_base_url {
        cfg.poster_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(hours) = parsed.utc_offset_hours {
        if (-23..=23).contains(&hours) {
            cfg.utc_offset_hours = hours;
        } else {
            warn!("utc_offset_hours {hours} out of range; keeping {DEFAULT_UTC_OFFSET_HOURS}.");
        }
    }

    cfg
}

pub fn store_json_path(cache_dir: &std::path::Path) -> PathBuf {
    cache_dir.join("store.json")
}

pub fn store_db_path(cache_dir: &std::path::Path) -> PathBuf {
    cache_dir.join("store.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_keeps_defaults() {
        let cfg = parse_config("{}");
        assert_eq!(cfg.store_backend, StoreBackend::JsonFile);
        assert_eq!(cfg.movies_file, DEFAULT_MOVIES_FILE);
        assert_eq!(cfg.poster_base_url, TMDB_IMG_URL);
        assert_eq!(cfg.utc_offset_hours, -3);
    }

    #[test]
    fn overrides_are_merged() {
        let cfg = parse_config(
            r#"{"store_backend": "SQLite", "movies_file": "m.json", "poster_base_url": "http://img/", "utc_offset_hours": 1}"#,
        );
        assert_eq!(cfg.store_backend, StoreBackend::Sqlite);
        assert_eq!(cfg.movies_file, "m.json");
        assert_eq!(cfg.genres_file, DEFAULT_GENRES_FILE);
        assert_eq!(cfg.poster_base_url, "http://img");
        assert_eq!(cfg.utc_offset_hours, 1);
    }

    #[test]
    fn unknown_backend_and_bad_offset_fall_back() {
        let cfg = parse_config(r#"{"storage": "redis", "utc_offset_hours": 40}"#);
        assert_eq!(cfg.store_backend, StoreBackend::JsonFile);
        assert_eq!(cfg.utc_offset_hours, DEFAULT_UTC_OFFSET_HOURS);
    }

    #[test]
    fn malformed_json_uses_defaults() {
        let cfg = parse_config("{not json");
        assert_eq!(cfg.store_backend, StoreBackend::JsonFile);
        assert!(cfg.cache_dir.is_none());
    }
}
