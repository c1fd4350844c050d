// src/app/detail.rs
use eframe::egui as eg;

use crate::app::utils::format_release_long;

impl crate::app::CineApp {
    /// Modal-style window for the selected movie. Closing it clears the selection.
    pub(crate) fn ui_render_detail_dialog(&mut self, ctx: &eg::Context) {
        let Some(sel) = self.selected_idx else {
            return;
        };
        let Some(row) = self.rows.get(sel) else {
            self.selected_idx = None;
            return;
        };

        // Dim and swallow input on everything under the window.
        let backdrop = eg::Area::new(eg::Id::new("movie_detail_backdrop"))
            .order(eg::Order::PanelResizeLine)
            .fixed_pos(eg::Pos2::ZERO)
            .interactable(true)
            .show(ctx, |ui| {
                let screen = ctx.screen_rect();
                ui.painter()
                    .rect_filled(screen, 0.0, eg::Color32::from_black_alpha(140));
                ui.allocate_rect(screen, eg::Sense::click())
            })
            .inner;

        let mut open = true;
        eg::Window::new(row.movie.title.as_str())
            .id(eg::Id::new("movie_detail"))
            .collapsible(false)
            .resizable(false)
            .default_width(380.0)
            .anchor(eg::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    if let Some(tex) = &row.tex {
                        let w = 200.0;
                        let aspect = tex.size_vec2().y / tex.size_vec2().x.max(1.0);
                        ui.image((tex.id(), eg::vec2(w, w * aspect)));
                    } else if row.poster_url.is_some() {
                        ui.add(eg::Spinner::new().size(18.0));
                    }
                });

                ui.add_space(8.0);
                if !row.genres.is_empty() {
                    ui.horizontal_wrapped(|ui| {
                        for genre in &row.genres {
                            super::ui::genre_badge(ui, genre, false);
                        }
                    });
                    ui.add_space(6.0);
                }

                eg::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    ui.label(eg::RichText::new(&row.movie.overview).weak());
                });

                ui.add_space(6.0);
                ui.label(format!(
                    "Data de Lançamento: {}",
                    format_release_long(&row.movie.release_date)
                ));
            });

        if !open || backdrop.clicked() || ctx.input(|i| i.key_pressed(eg::Key::Escape)) {
            self.selected_idx = None;
        }
    }
}
