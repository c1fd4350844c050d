// src/app/ui/mod.rs
pub mod table;
pub mod topbar;

use eframe::egui as eg;

/// Small rounded label used for genres in the table and the dialog.
pub(crate) fn genre_badge(ui: &mut eg::Ui, text: &str, compact: bool) {
    let visuals = ui.visuals();
    let (bg, fg) = if compact {
        (visuals.faint_bg_color, visuals.text_color())
    } else {
        (visuals.extreme_bg_color, visuals.strong_text_color())
    };
    let rich = eg::RichText::new(format!(" {text} "))
        .size(if compact { 11.0 } else { 12.0 })
        .color(fg)
        .background_color(bg);
    ui.add(eg::Label::new(rich).selectable(false));
}

impl crate::app::CineApp {
    pub(crate) fn ui_render_empty(&self, ui: &mut eg::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Digite para buscar");
            if let Some(msg) = &self.status {
                ui.add_space(8.0);
                ui.label(eg::RichText::new(msg).weak());
            }
        });
    }
}
