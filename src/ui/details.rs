use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::map::markers::{ListingDetails, MarkerDetails};
use crate::state::{Annotation, AppState};

// ---------------------------------------------------------------------------
// Right side panel – selected marker
// ---------------------------------------------------------------------------

/// Render details and annotation buttons for the selected marker.
pub fn details_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(marker) = state.selected_marker().cloned() else {
        ui.label("Click a marker to see its details.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match &marker.details {
            MarkerDetails::Listing { index, details } => {
                listing(ui, details, &state.office.name);
                ui.separator();
                annotation_buttons(ui, state, *index);
            }
            MarkerDetails::Office { address } => {
                ui.strong(&marker.caption);
                ui.label(address);
            }
            MarkerDetails::Custom => {
                ui.strong(&marker.caption);
                ui.small("Custom marker");
            }
        });

    ui.separator();
    if ui.button("Close").clicked() {
        state.select(None);
    }
}

fn listing(ui: &mut Ui, d: &ListingDetails, office_name: &str) {
    if !d.thumbnail.is_empty() {
        ui.add(
            egui::Image::new(d.thumbnail.clone())
                .max_width(ui.available_width())
                .max_height(160.0)
                .rounding(4.0),
        );
    }
    ui.hyperlink_to(RichText::new(&d.title).strong(), &d.url);
    ui.small(&d.address);
    ui.add_space(6.0);

    ui.label(RichText::new(format!("💸 Price: {}", d.price_label())).strong());
    ui.label(format!("🧱 Surface: {}", d.surface_label()));
    ui.label(format!("🛋 {}", d.interior_type));
    if let Some(rooms) = d.rooms {
        ui.label(format!("{rooms} Rooms"));
    }
    ui.add_space(6.0);

    ui.label(format!("🚂 {} from {office_name}*", d.time_to_office));
    ui.label(format!("🚂 {} from city center*", d.time_to_center));
    for link in &d.directions {
        ui.hyperlink_to(&link.label, &link.url);
    }
    ui.add_space(6.0);

    ui.small("* est. time by public transport");
    ui.small(format!("First seen at: {}", d.first_seen));
    ui.small(format!("Last seen at: {}", d.last_seen));
    ui.small(format!("Days online: {}", d.days_online));
}

fn annotation_buttons(ui: &mut Ui, state: &mut AppState, index: usize) {
    let current = state.annotation(index);
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .selectable_label(current == Some(Annotation::Visited), "Mark visited")
            .clicked()
        {
            state.annotate(index, Some(Annotation::Visited));
        }
        if ui
            .selectable_label(current == Some(Annotation::Favorite), "Mark favorite")
            .clicked()
        {
            state.annotate(index, Some(Annotation::Favorite));
        }
        if ui.button("Reset").clicked() {
            state.annotate(index, None);
        }
    });
}
