use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::view::PresentationMode;
use crate::export::ExportFormat;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – region, presentation, columns and category filters
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            region_selector(ui, state);
            ui.separator();
            presentation_selector(ui, state);
            ui.separator();
            column_chooser(ui, state);
            ui.separator();
            category_filter(ui, state);
        });
}

fn region_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Region");

    let regions: Vec<String> = state.loaded.regions.regions().map(str::to_string).collect();
    if regions.is_empty() {
        ui.label("No price columns found.");
        return;
    }

    let current = state.selected_region.clone().unwrap_or_default();
    let mut picked = None;
    egui::ComboBox::from_id_salt("region")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for region in &regions {
                if ui.selectable_label(current == *region, region).clicked() {
                    picked = Some(region.clone());
                }
            }
        });
    if let Some(region) = picked {
        state.set_region(region);
    }

    if let Some(region) = &state.selected_region {
        let labels = state.loaded.regions.labels(region).join(", ");
        ui.label(RichText::new(format!("Tiers: {labels}")).weak());
    }
}

fn presentation_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Price headers");
    let mut mode = state.presentation;
    ui.radio_value(&mut mode, PresentationMode::Label, "Tier only (50)");
    ui.radio_value(&mut mode, PresentationMode::LabelWithRegion, "Tier and region (50 (EU))");
    if mode != state.presentation {
        state.set_presentation(mode);
    }
}

fn column_chooser(ui: &mut Ui, state: &mut AppState) {
    let choices = state.column_choices.clone();
    if choices.is_empty() {
        return;
    }

    let header_text = format!(
        "Columns  ({}/{})",
        state.visible_columns.len(),
        choices.len()
    );

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("columns")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Defaults").clicked() {
                state.show_default_columns();
            }
            for column in &choices {
                let mut checked = state.visible_columns.contains(column);
                if ui.checkbox(&mut checked, column.as_str()).changed() {
                    state.toggle_column(column);
                }
            }
        });
}

fn category_filter(ui: &mut Ui, state: &mut AppState) {
    let categories: Vec<String> = state.all_categories.iter().cloned().collect();
    if categories.is_empty() {
        ui.label(format!(
            "No '{}' column, category filter disabled.",
            state.config.columns.roles.category
        ));
        return;
    }

    let header_text = format!(
        "Categories  ({}/{})",
        state.selected_categories.len(),
        categories.len()
    );

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("categories")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_categories();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_categories();
                }
            });

            for category in &categories {
                let mut checked = state.selected_categories.contains(category);
                let label = if category.is_empty() { "(blank)" } else { category.as_str() };
                if ui.checkbox(&mut checked, label).changed() {
                    state.toggle_category(category);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
                if ui.button(format!("Export {}…", format.label())).clicked() {
                    export_dialog(state, format);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        ui.label(format!(
            "{}: {} products, {} shown",
            state.source_description(),
            state.loaded.dataset.len(),
            state.view.row_count()
        ));

        for warning in &state.warnings {
            ui.separator();
            ui.label(RichText::new(warning).color(Color32::from_rgb(230, 160, 40)));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open product catalog")
        .add_filter("Supported files", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open_file(path);
    }
}

pub fn export_dialog(state: &mut AppState, format: ExportFormat) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Export {}", format.label()))
        .set_file_name(format.default_file_name())
        .add_filter(format.label(), &[format.extension()])
        .save_file();

    if let Some(path) = file {
        state.export(format, &path);
    }
}
