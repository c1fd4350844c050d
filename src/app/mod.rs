// src/app/mod.rs — movie table + watched toggles + detail dialog

// ---- Standard lib imports ----
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::Instant;

// ---- Crates ----
use eframe::egui as eg;
use tracing::{info, warn};

// ---- Local modules ----
pub mod cache;
pub mod detail;
pub mod filters;
pub mod gfx;
pub mod prefetch;
pub mod prefs;
pub mod types;
pub mod ui;
pub mod utils;

use crate::catalog::{load_genres, load_movies, GenreMap, MovieRecord};
use crate::config::{load_config, AppConfig};
use crate::storage::{open_store, KeyValueStore};
use crate::watched::{offset_from_hours, WatchedState};
use types::{MovieRow, PrefetchDone, RowAction};

// ---- Tunables ----
const WORKER_COUNT: usize = 8;
const RESIZE_MAX_W: u32 = 240;
const RESIZE_QUALITY: u8 = 80;
const MAX_DONE_PER_FRAME: usize = 12;
const MAX_UPLOADS_PER_FRAME: usize = 4;

pub struct CineApp {
    // data
    rows: Vec<MovieRow>,
    watched: WatchedState<Box<dyn KeyValueStore>>,

    // ui state
    selected_idx: Option<usize>,
    search_query: String,
    hide_watched: bool,
    poster_width_ui: f32,
    status: Option<String>,

    // prefs autosave
    prefs_dirty: bool,
    prefs_last_write: Instant,

    // one-time init guard
    did_init: bool,

    // poster prefetch plumbing
    prefetch_started: bool,
    total_targets: usize,
    completed: usize,
    failed: usize,
    done_rx: Option<Receiver<PrefetchDone>>,
}

impl CineApp {
    /// Load config, catalog files, UI prefs and the configured store from disk.
    pub fn new() -> Self {
        let cfg = load_config();
        let cache_dir = cache::cache_dir();

        let mut status = None;
        let movies = load_movies(Path::new(&cfg.movies_file)).unwrap_or_else(|e| {
            warn!("movie list unavailable: {e}");
            status = Some(format!("Lista de filmes inválida: {e}"));
            Vec::new()
        });
        let genres = load_genres(Path::new(&cfg.genres_file)).unwrap_or_else(|e| {
            warn!("genre list unavailable: {e}");
            GenreMap::new()
        });

        let store = open_store(cfg.store_backend, &cache_dir);
        info!(
            "store backend {:?} under {}",
            cfg.store_backend,
            cache_dir.display()
        );

        let mut app = Self::from_parts(movies, &genres, store, &cfg);
        let prefs = prefs::load_prefs();
        app.search_query = prefs.search;
        app.hide_watched = prefs.hide_watched;
        app.poster_width_ui = prefs.poster_w;
        app.status = status;
        app
    }

    pub fn from_parts(
        movies: Vec<MovieRecord>,
        genres: &GenreMap,
        store: Box<dyn KeyValueStore>,
        cfg: &AppConfig,
    ) -> Self {
        let rows = movies
            .into_iter()
            .map(|m| MovieRow::new(m, genres, &cfg.poster_base_url))
            .collect();

        let mut watched = WatchedState::new(store, offset_from_hours(cfg.utc_offset_hours));
        watched.load_state();

        let defaults = prefs::UiPrefs::default();
        Self {
            rows,
            watched,
            selected_idx: None,
            search_query: defaults.search,
            hide_watched: defaults.hide_watched,
            poster_width_ui: defaults.poster_w,
            status: None,
            prefs_dirty: false,
            prefs_last_write: Instant::now(),
            did_init: false,
            prefetch_started: false,
            total_targets: 0,
            completed: 0,
            failed: 0,
            done_rx: None,
        }
    }

    fn set_status<S: Into<String>>(&mut self, s: S) {
        self.status = Some(s.into());
    }

    fn visible_rows(&self) -> Vec<usize> {
        filters::visible_indices(
            self.rows
                .iter()
                .map(|r| (r.movie.id, r.movie.title.as_str())),
            &self.search_query,
            self.hide_watched,
            |id| self.watched.is_checked(id),
        )
    }

    fn apply_row_action(&mut self, action: RowAction) {
        match action {
            RowAction::Check { row_idx, checked } => {
                if let Some(row) = self.rows.get(row_idx) {
                    self.watched.set_checked(&row.movie, checked);
                }
            }
            RowAction::Dub { row_idx, dubbed } => {
                if let Some(row) = self.rows.get(row_idx) {
                    self.watched.set_dubbed(row.movie.id, dubbed);
                }
            }
            RowAction::OpenDetail { row_idx } => self.selected_idx = Some(row_idx),
        }
    }
}

impl Default for CineApp {
    fn default() -> Self {
        Self::new()
    }
}

// ========== App impl ==========
impl eframe::App for CineApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        if !self.did_init {
            self.did_init = true;
            self.start_prefetch(ctx);
        }
        if self.done_rx.is_some() {
            self.poll_prefetch_done(ctx);
        }

        eg::TopBottomPanel::top("topbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.ui_render_topbar(ui);
            ui.add_space(4.0);
        });

        eg::CentralPanel::default().show(ctx, |ui| {
            if self.rows.is_empty() {
                self.ui_render_empty(ui);
                return;
            }
            let visible = self.visible_rows();
            if visible.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label(eg::RichText::new("Nenhum filme corresponde à busca.").weak());
                });
                return;
            }
            self.ui_render_table(ui, ctx, &visible);
        });

        self.ui_render_detail_dialog(ctx);
        self.maybe_save_prefs();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.prefs_dirty {
            self.save_prefs();
        }
    }
}
