// src/app/ui/topbar.rs
use eframe::egui as eg;

use crate::app::prefs::{POSTER_W_MAX, POSTER_W_MIN};

impl crate::app::CineApp {
    pub(crate) fn ui_render_topbar(&mut self, ui: &mut eg::Ui) {
        ui.horizontal(|ui| {
            let resp = ui.add(
                eg::TextEdit::singleline(&mut self.search_query)
                    .hint_text("Buscar título…")
                    .desired_width(220.0),
            );
            if resp.changed() {
                self.mark_dirty();
            }
            if !self.search_query.is_empty() && ui.small_button("Limpar").clicked() {
                self.search_query.clear();
                self.mark_dirty();
            }

            ui.separator();

            if ui
                .checkbox(&mut self.hide_watched, "Ocultar assistidos")
                .changed()
            {
                self.mark_dirty();
            }

            ui.separator();

            ui.label("Pôster:");
            if ui
                .add(eg::Slider::new(&mut self.poster_width_ui, POSTER_W_MIN..=POSTER_W_MAX).suffix(" px"))
                .changed()
            {
                self.mark_dirty();
            }

            let watched_here = self
                .rows
                .iter()
                .filter(|r| self.watched.is_checked(r.movie.id))
                .count();
            ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                ui.label(
                    eg::RichText::new(format!(
                        "{watched_here} de {} assistidos ({} no total)",
                        self.rows.len(),
                        self.watched.checked_count()
                    ))
                    .weak(),
                );
            });
        });
    }
}
