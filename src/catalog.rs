// src/catalog.rs
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub type MovieId = u64;
pub type GenreMap = HashMap<u64, String>;

/// One movie as supplied by the search source (TMDB result shape).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub overview: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoviesFile {
    List(Vec<MovieRecord>),
    Page { results: Vec<MovieRecord> },
}

#[derive(Deserialize)]
struct GenreItem {
    id: u64,
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenresFile {
    List { genres: Vec<GenreItem> },
    Map(HashMap<String, String>),
}

pub fn parse_movies(raw: &str) -> Result<Vec<MovieRecord>, String> {
    match serde_json::from_str::<MoviesFile>(raw) {
        Ok(MoviesFile::List(list)) => Ok(list),
        Ok(MoviesFile::Page { results }) => Ok(results),
        Err(e) => Err(format!("movies: {e}")),
    }
}

pub fn parse_genres(raw: &str) -> Result<GenreMap, String> {
    match serde_json::from_str::<GenresFile>(raw) {
        Ok(GenresFile::List { genres }) => {
            Ok(genres.into_iter().map(|g| (g.id, g.name)).collect())
        }
        Ok(GenresFile::Map(map)) => map
            .into_iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<u64>()
                    .map(|id| (id, v))
                    .map_err(|e| format!("genres: bad id `{k}`: {e}"))
            })
            .collect(),
        Err(e) => Err(format!("genres: {e}")),
    }
}

/// Missing file → empty list (the table shows its prompt view instead).
pub fn load_movies(path: &Path) -> Result<Vec<MovieRecord>, String> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let movies = parse_movies(&raw).map_err(|e| format!("{}: {e}", path.display()))?;
            info!("Loaded {} movies from {}", movies.len(), path.display());
            Ok(movies)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No movie list at {}; starting empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(format!("read {}: {e}", path.display())),
    }
}

pub fn load_genres(path: &Path) -> Result<GenreMap, String> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_genres(&raw).map_err(|e| format!("{}: {e}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(GenreMap::new()),
        Err(e) => Err(format!("read {}: {e}", path.display())),
    }
}

/// Display names for the given ids, skipping ids the map does not know.
pub fn genre_names(ids: &[u64], genres: &GenreMap) -> Vec<String> {
    ids.iter().filter_map(|id| genres.get(id).cloned()).collect()
}

pub fn poster_url(base: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with('/') {
        Some(format!("{base}{path}"))
    } else {
        Some(format!("{base}/{path}"))
    }
}
