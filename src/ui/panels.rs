use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::{
    KNOWN_INTERIOR_TYPES, MAX_DAYS_ONLINE_CEILING, MAX_PRICE_CEILING, MAX_SURFACE_CEILING,
    POSSIBLE_CITIES, title_case,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter and custom-marker forms
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            about_section(ui, &state.office.name);
            ui.add_space(4.0);

            ui.label(
                RichText::new(
                    "⚠ Applying filters or changing the custom marker will reset the map, \
                     including visited and favorited apartments.",
                )
                .color(Color32::from_rgb(0xC0, 0x8A, 0x00)),
            );
            ui.add_space(4.0);

            filter_form(ui, state);
            ui.separator();
            custom_marker_form(ui, state);
        });
}

fn about_section(ui: &mut Ui, office_name: &str) {
    egui::CollapsingHeader::new("ℹ About")
        .id_salt("about")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(about_text(office_name));
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Listings scraped from");
                ui.hyperlink_to("Pararius", "https://www.pararius.com/");
            });
        });
}

fn about_text(office_name: &str) -> String {
    format!(
        "This map shows apartments for rent in some cities in The Netherlands, with the \
         travel time to their city center and to {office_name}.\n\n\
         Apartments can be marked as favorite (purple) or visited (red) to keep track of them.\n\n\
         Use the filters on the left to narrow down the map or to add a custom marker.\n\n\
         Happy apartment hunting! 🏠"
    )
}

fn filter_form(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Add filters")
        .on_hover_text("Filter the apartments on the map.");

    let draft = &mut state.draft;

    egui::CollapsingHeader::new(RichText::new(format!(
        "City  ({}/{})",
        draft.cities.len(),
        POSSIBLE_CITIES.len()
    ))
    .strong())
    .id_salt("city_filter")
    .default_open(true)
    .show(ui, |ui: &mut Ui| {
        let options = POSSIBLE_CITIES.iter().map(|c| c.to_string());
        multiselect(ui, options, &mut draft.cities);
    });

    ui.add(
        egui::Slider::new(&mut draft.max_price, 0..=MAX_PRICE_CEILING)
            .step_by(50.0)
            .text("Max price"),
    );
    ui.add(
        egui::Slider::new(&mut draft.min_surface, 0..=MAX_SURFACE_CEILING)
            .step_by(5.0)
            .text("Min surface"),
    );

    egui::CollapsingHeader::new(RichText::new(format!(
        "Interior type  ({}/{})",
        draft.interior_types.len(),
        KNOWN_INTERIOR_TYPES.len()
    ))
    .strong())
    .id_salt("interior_filter")
    .default_open(true)
    .show(ui, |ui: &mut Ui| {
        let options = KNOWN_INTERIOR_TYPES.iter().map(|t| title_case(t));
        multiselect(ui, options, &mut draft.interior_types);
    });

    ui.add(
        egui::Slider::new(&mut draft.max_days_online, 0..=MAX_DAYS_ONLINE_CEILING)
            .text("Max days online"),
    );

    ui.add_space(4.0);
    if ui.button("Apply filters").clicked() {
        let criteria = state.draft.clone();
        state.apply_filters(criteria);
    }
}

/// One checkbox per option plus All / None shortcuts.
fn multiselect(ui: &mut Ui, options: impl Iterator<Item = String>, selected: &mut BTreeSet<String>) {
    let options: Vec<String> = options.collect();
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            selected.extend(options.iter().cloned());
        }
        if ui.small_button("None").clicked() {
            selected.clear();
        }
    });
    for option in options {
        let mut checked = selected.contains(&option);
        if ui.checkbox(&mut checked, option.as_str()).changed() {
            if checked {
                selected.insert(option);
            } else {
                selected.remove(&option);
            }
        }
    }
}

fn custom_marker_form(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Add a custom marker")
        .on_hover_text("Add the coordinates of a place to add a custom marker on the map.");

    egui::Grid::new("custom_marker_grid")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut state.marker_form.name);
            ui.end_row();
            ui.label("Latitude");
            ui.add(egui::TextEdit::singleline(&mut state.marker_form.lat).hint_text("52.3676"));
            ui.end_row();
            ui.label("Longitude");
            ui.add(egui::TextEdit::singleline(&mut state.marker_form.lng).hint_text("4.9041"));
            ui.end_row();
        });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add custom marker").clicked() {
            state.submit_custom_marker();
        }
        if state.custom_marker().is_some() && ui.button("Remove").clicked() {
            state.clear_custom_marker();
        }
    });

    if let Some(notice) = &state.marker_notice {
        ui.colored_label(Color32::RED, format!("🙈 {notice}"));
    }
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
            if ui.button("Reload dataset").clicked() {
                state.reload_dataset();
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .button("🔗 Copy share link")
            .on_hover_text("Copy a link with the applied filters")
            .clicked()
        {
            let link = state.share_link();
            log::info!("Share link: {link}");
            ui.ctx().copy_text(link);
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} apartments loaded from {}, {} shown",
                ds.len(),
                state.dataset_label(),
                state.view.summary.shown
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open apartments dataset")
        .add_filter("Supported files", &["parquet", "pq", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_file(&path);
    }
}
