// src/app/prefs.rs
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::warn;

pub const POSTER_W_MIN: f32 = 40.0;
pub const POSTER_W_MAX: f32 = 120.0;

/// Persisted UI knobs. Unknown keys and bad values are skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct UiPrefs {
    pub search: String,
    pub hide_watched: bool,
    pub poster_w: f32,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            search: String::new(),
            hide_watched: false,
            poster_w: 64.0,
        }
    }
}

impl UiPrefs {
    pub fn parse(txt: &str) -> Self {
        let mut prefs = Self::default();
        for line in txt.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let v = v.trim();
            match k.trim() {
                "search" => prefs.search = v.to_string(),
                "hide_watched" => prefs.hide_watched = matches!(v, "1" | "true" | "yes"),
                "poster_w" => {
                    if let Ok(n) = v.parse::<f32>() {
                        prefs.poster_w = n.clamp(POSTER_W_MIN, POSTER_W_MAX);
                    }
                }
                _ => {}
            }
        }
        prefs
    }

    pub fn render(&self) -> String {
        format!(
            "# cinelist ui prefs\n\
             search={}\n\
             hide_watched={}\n\
             poster_w={:.1}\n",
            self.search.replace('\n', " "),
            if self.hide_watched { "1" } else { "0" },
            self.poster_w,
        )
    }
}

pub fn prefs_path() -> PathBuf {
    crate::app::cache::cache_dir().join("ui_prefs.txt")
}

pub fn load_prefs() -> UiPrefs {
    fs::read_to_string(prefs_path())
        .map(|txt| UiPrefs::parse(&txt))
        .unwrap_or_default()
}

impl crate::app::CineApp {
    pub(crate) fn mark_dirty(&mut self) {
        self.prefs_dirty = true;
    }

    pub(crate) fn maybe_save_prefs(&mut self) {
        // debounce a bit to avoid writing every keystroke
        if self.prefs_dirty && self.prefs_last_write.elapsed() >= Duration::from_millis(300) {
            self.save_prefs();
            self.prefs_dirty = false;
            self.prefs_last_write = Instant::now();
        }
    }

    pub(crate) fn save_prefs(&self) {
        let prefs = UiPrefs {
            search: self.search_query.clone(),
            hide_watched: self.hide_watched,
            poster_w: self.poster_width_ui,
        };
        if let Err(err) = fs::write(prefs_path(), prefs.render()) {
            warn!("failed to save ui prefs: {err}");
        }
    }
}
