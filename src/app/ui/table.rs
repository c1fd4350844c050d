// src/app/ui/table.rs
use eframe::egui as eg;
use egui_extras::{Column, TableBuilder};

use crate::app::types::{PosterState, RowAction};
use crate::app::utils::format_release_short;

const HEADER_H: f32 = 24.0;

impl crate::app::CineApp {
    pub(crate) fn ui_render_table(&mut self, ui: &mut eg::Ui, ctx: &eg::Context, visible: &[usize]) {
        let poster_w = self.poster_width_ui;
        let row_h = poster_w * 1.5 + 8.0;
        let mut uploads_left = super::super::MAX_UPLOADS_PER_FRAME;
        let mut actions: Vec<RowAction> = Vec::new();

        // Split borrows: rows get textures uploaded, watched state is read-only here.
        let rows = &mut self.rows;
        let watched = &self.watched;

        TableBuilder::new(ui)
            .striped(true)
            .resizable(false)
            .cell_layout(eg::Layout::left_to_right(eg::Align::Center))
            .column(Column::exact(56.0))
            .column(Column::remainder().at_least(220.0).clip(true))
            .column(Column::initial(240.0).at_least(120.0).clip(true))
            .column(Column::exact(130.0))
            .column(Column::exact(80.0))
            .column(Column::exact(90.0))
            .header(HEADER_H, |mut header| {
                for title in [
                    "Status",
                    "Título",
                    "Categorias",
                    "Data de Lançamento",
                    "Dublado",
                    "Ver detalhes",
                ] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(row_h, visible.len(), |mut table_row| {
                    let Some(&idx) = visible.get(table_row.index()) else {
                        return;
                    };

                    if uploads_left > 0
                        && crate::app::CineApp::try_lazy_upload_row(rows, ctx, idx)
                    {
                        uploads_left -= 1;
                    }
                    let Some(row) = rows.get(idx) else {
                        return;
                    };
                    let id = row.movie.id;
                    let is_checked = watched.is_checked(id);

                    table_row.col(|ui| {
                        let mut checked = is_checked;
                        if ui.checkbox(&mut checked, "").changed() {
                            actions.push(RowAction::Check {
                                row_idx: idx,
                                checked,
                            });
                        }
                    });

                    table_row.col(|ui| {
                        let size = eg::vec2(poster_w, poster_w * 1.5);
                        match (&row.tex, row.state) {
                            (Some(tex), _) => {
                                ui.image((tex.id(), size));
                            }
                            (None, state) => {
                                let (rect, _) = ui.allocate_exact_size(size, eg::Sense::hover());
                                ui.painter().rect_filled(rect, 4.0, eg::Color32::from_gray(40));
                                if state == PosterState::Pending {
                                    ui.painter().text(
                                        rect.center(),
                                        eg::Align2::CENTER_CENTER,
                                        "…",
                                        eg::FontId::proportional(14.0),
                                        eg::Color32::GRAY,
                                    );
                                }
                            }
                        }
                        ui.add_space(8.0);
                        ui.add(
                            eg::Label::new(eg::RichText::new(&row.movie.title).strong())
                                .truncate(),
                        );
                    });

                    table_row.col(|ui| {
                        ui.horizontal_wrapped(|ui| {
                            ui.spacing_mut().item_spacing = eg::vec2(4.0, 4.0);
                            for genre in &row.genres {
                                super::genre_badge(ui, genre, true);
                            }
                        });
                    });

                    table_row.col(|ui| {
                        ui.label(format_release_short(&row.movie.release_date));
                    });

                    table_row.col(|ui| {
                        let mut dubbed = watched.is_dubbed(id);
                        let resp = ui.add_enabled(is_checked, eg::Checkbox::without_text(&mut dubbed));
                        if resp.changed() {
                            actions.push(RowAction::Dub {
                                row_idx: idx,
                                dubbed,
                            });
                        }
                    });

                    table_row.col(|ui| {
                        if ui
                            .button("ℹ")
                            .on_hover_text("Ver detalhes")
                            .clicked()
                        {
                            actions.push(RowAction::OpenDetail { row_idx: idx });
                        }
                    });
                });
            });

        for action in actions {
            self.apply_row_action(action);
        }
    }
}
