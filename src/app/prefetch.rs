// src/app/prefetch.rs
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use eframe::egui as eg;
use tracing::{debug, info, warn};

use super::types::{PosterState, PrefetchDone, WorkItem};

impl crate::app::CineApp {
    /// Queue every row with a poster URL. Rows with a file already on disk skip the network.
    pub(crate) fn start_prefetch(&mut self, ctx: &eg::Context) {
        if self.prefetch_started {
            return;
        }
        self.prefetch_started = true;

        if std::env::var_os("CINELIST_DISABLE_POSTERS").is_some() {
            info!("poster download disabled via CINELIST_DISABLE_POSTERS");
            for row in &mut self.rows {
                row.state = PosterState::Missing;
            }
            return;
        }

        let targets: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.poster_url.is_some())
            .map(|(i, _)| i)
            .collect();

        self.completed = 0;
        self.failed = 0;
        self.total_targets = targets.len();
        if targets.is_empty() {
            return;
        }

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>();
        let (done_tx, done_rx) = mpsc::channel::<PrefetchDone>();
        self.done_rx = Some(done_rx);

        let work_rx = Arc::new(Mutex::new(work_rx));

        // One shared HTTP client.
        let client = match reqwest::blocking::Client::builder()
            .user_agent("cinelist/posters")
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(super::WORKER_COUNT)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build()
        {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!("http client build failed: {e}");
                self.set_status(format!("Pôsteres indisponíveis: {e}"));
                self.failed = self.total_targets;
                for idx in targets {
                    self.rows[idx].state = PosterState::Failed;
                }
                return;
            }
        };

        for _ in 0..super::WORKER_COUNT.min(self.total_targets) {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let client = Arc::clone(&client);

            std::thread::spawn(move || loop {
                let job = match work_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let (row_idx, key, url, cached_path) = match job {
                    Ok(t) => t,
                    Err(_) => break,
                };

                let result: Result<PathBuf, String> = cached_path.map_or_else(
                    || {
                        crate::app::cache::download_and_store_resized(
                            &client,
                            &url,
                            &key,
                            super::RESIZE_MAX_W,
                            super::RESIZE_QUALITY,
                        )
                        .or_else(|_e| crate::app::cache::download_and_store(&client, &url, &key))
                    },
                    Ok,
                );

                if done_tx.send(PrefetchDone { row_idx, result }).is_err() {
                    break;
                }
            });
        }

        for idx in targets {
            let row = &mut self.rows[idx];
            let (Some(key), Some(url)) = (row.key.clone(), row.poster_url.clone()) else {
                continue;
            };
            if row.path.is_none() {
                row.path = crate::app::cache::find_any_by_key(&key);
            }
            row.state = if row.path.is_some() {
                PosterState::Cached
            } else {
                PosterState::Pending
            };
            let _ = work_tx.send((idx, key, url, row.path.clone()));
        }
        // Dropping the sender lets idle workers exit once the queue drains.
        drop(work_tx);

        ctx.request_repaint();
    }

    /// Drain finished downloads without blocking the UI thread.
    pub(crate) fn poll_prefetch_done(&mut self, ctx: &eg::Context) {
        let mut drained = 0usize;

        while drained < super::MAX_DONE_PER_FRAME {
            let Some(rx) = &self.done_rx else {
                break;
            };

            match rx.try_recv() {
                Ok(msg) => {
                    drained += 1;
                    let Some(row) = self.rows.get_mut(msg.row_idx) else {
                        self.failed += 1;
                        continue;
                    };
                    match msg.result {
                        Ok(path) => {
                            row.path = Some(path);
                            row.state = PosterState::Cached; // uploaded lazily during paint
                            self.completed += 1;
                        }
                        Err(e) => {
                            debug!("poster failed for {}: {e}", row.movie.title);
                            row.state = PosterState::Failed;
                            self.failed += 1;
                        }
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.done_rx = None;
                    break;
                }
            }
        }

        if drained > 0 {
            if self.completed + self.failed >= self.total_targets {
                info!(
                    "poster cache ready ({} cached, {} failed)",
                    self.completed, self.failed
                );
            }
            ctx.request_repaint();
        }
    }

    /// Upload the texture for one row if its file is on disk. Returns true if uploaded now.
    pub(crate) fn try_lazy_upload_row(
        rows: &mut [super::types::MovieRow],
        ctx: &eg::Context,
        idx: usize,
    ) -> bool {
        let Some(row) = rows.get_mut(idx) else {
            return false;
        };
        if row.tex.is_some() || row.state != PosterState::Cached {
            return false;
        }
        let (Some(path), Some(key)) = (row.path.as_ref(), row.key.as_ref()) else {
            return false;
        };
        match crate::app::gfx::load_texture_from_path(ctx, path, key) {
            Ok(tex) => {
                row.tex = Some(tex);
                row.state = PosterState::Ready;
                true
            }
            Err(e) => {
                debug!("poster upload failed for {}: {e}", row.movie.title);
                row.state = PosterState::Failed;
                false
            }
        }
    }
}
