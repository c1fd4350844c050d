// src/app/types.rs
use eframe::egui::TextureHandle;
use std::path::PathBuf;

use crate::catalog::{genre_names, poster_url, GenreMap, MovieRecord};

/// (row_idx, cache_key, url, cached_path)
pub type WorkItem = (usize, String, String, Option<PathBuf>);

pub struct PrefetchDone {
    pub row_idx: usize,
    pub result: Result<PathBuf, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PosterState {
    Missing, // no poster_path; placeholder only
    Pending, // queued or downloading
    Cached,  // file present on disk (ready to upload)
    Ready,   // texture uploaded
    Failed,  // permanent failure
}

/// What the table asked for this frame; applied after the table releases its borrows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    Check { row_idx: usize, checked: bool },
    Dub { row_idx: usize, dubbed: bool },
    OpenDetail { row_idx: usize },
}

// ---- one table row ----
pub struct MovieRow {
    pub movie: MovieRecord,
    pub genres: Vec<String>,
    pub poster_url: Option<String>,
    pub key: Option<String>,
    pub path: Option<PathBuf>,
    pub tex: Option<TextureHandle>, // UI thread only
    pub state: PosterState,
}

impl MovieRow {
    pub fn new(movie: MovieRecord, genres: &GenreMap, poster_base: &str) -> Self {
        let url = poster_url(poster_base, movie.poster_path.as_deref());
        let key = url.as_deref().map(crate::app::cache::url_to_cache_key);
        let state = if url.is_some() {
            PosterState::Pending
        } else {
            PosterState::Missing
        };
        Self {
            genres: genre_names(&movie.genre_ids, genres),
            movie,
            poster_url: url,
            key,
            path: None,
            tex: None,
            state,
        }
    }
}
