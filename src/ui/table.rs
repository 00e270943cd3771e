use eframe::egui::{self, Align, Layout, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::CellValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Product table (central panel)
// ---------------------------------------------------------------------------

/// Search box plus the current view table.
pub fn product_table(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("🔍");
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.search_query)
                .hint_text("Search by REF, name, description or tags")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            state.recompute();
        }
    });
    ui.separator();

    if state.loaded.dataset.is_empty() {
        ui.label("The catalog is empty.");
    }

    let view = &state.view;
    if view.columns.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The catalog has no displayable columns");
        });
        return;
    }
    if view.is_empty() {
        ui.label("No products match the current filters.");
    }

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), view.columns.len())
            .header(22.0, |mut header| {
                for name in &view.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, view.rows.len(), |mut row| {
                    let cells = &view.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(display_cell(cell));
                        });
                    }
                });
            });
    });
}

/// Prices get two decimals on screen; exports keep full precision.
fn display_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Float(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}
