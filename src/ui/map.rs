use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoint, PlotPoints, Points};

use crate::color::{legend_entries, marker_color};
use crate::data::filter::MAX_PRICE_CEILING;
use crate::map::markers::{MarkerDescriptor, MarkerKind};
use crate::state::AppState;

/// Half-extent of the initial view around the center, in degrees.
const VIEW_HALF_LAT: f64 = 0.08;
const VIEW_HALF_LNG: f64 = 0.14;

/// Click radius as a fraction of the visible plot extent.
const PICK_RADIUS: f64 = 0.015;

// ---------------------------------------------------------------------------
// Map (central panel)
// ---------------------------------------------------------------------------

/// Render the status line and the map in the central panel.
pub fn apartments_map(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No dataset loaded  (File → Open… or File → Reload dataset)");
        });
        return;
    }

    status_line(ui, state);
    legend(ui, &state.office.name);

    let center = state.view.center;
    let recenter = std::mem::take(&mut state.recenter);
    // degrees of longitude shrink with latitude
    let aspect = (1.0 / center.lat.to_radians().cos()) as f32;

    let response = Plot::new("apartments_map")
        .data_aspect(aspect)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show_grid(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(|name, value| {
            if name.is_empty() {
                String::new()
            } else {
                format!("{name}\n{:.5}, {:.5}", value.y, value.x)
            }
        })
        .show(ui, |plot_ui| {
            if recenter {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [center.lng - VIEW_HALF_LNG, center.lat - VIEW_HALF_LAT],
                    [center.lng + VIEW_HALF_LNG, center.lat + VIEW_HALF_LAT],
                ));
            }

            for (pos, marker) in state.view.markers.iter().enumerate() {
                let annotation = marker.listing_index().and_then(|i| state.annotation(i));
                let color = marker_color(marker, annotation, f64::from(MAX_PRICE_CEILING));
                let selected = state.selected == Some(pos);
                plot_ui.points(marker_points(marker, color, selected));
            }

            (plot_ui.pointer_coordinate(), plot_ui.plot_bounds())
        });

    let (pointer, bounds) = response.inner;
    if response.response.clicked() {
        let hit = pointer.and_then(|p| nearest_marker(&state.view.markers, p, &bounds));
        state.select(hit);
    }
}

fn marker_points(marker: &MarkerDescriptor, color: Color32, selected: bool) -> Points<'_> {
    let (shape, radius) = match marker.kind {
        MarkerKind::Listing => (MarkerShape::Circle, 5.0),
        MarkerKind::Office => (MarkerShape::Square, 8.0),
        MarkerKind::Custom => (MarkerShape::Diamond, 8.0),
    };
    let points: PlotPoints = vec![[marker.position.lng, marker.position.lat]].into();
    Points::new(points)
        .name(&marker.caption)
        .shape(shape)
        .radius(if selected { radius + 3.0 } else { radius })
        .filled(true)
        .color(color)
}

/// Index of the marker closest to `pointer`, if within the pick radius.
fn nearest_marker(
    markers: &[MarkerDescriptor],
    pointer: PlotPoint,
    bounds: &PlotBounds,
) -> Option<usize> {
    let (w, h) = (bounds.width().max(f64::EPSILON), bounds.height().max(f64::EPSILON));
    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let dx = (m.position.lng - pointer.x) / w;
            let dy = (m.position.lat - pointer.y) / h;
            (i, (dx * dx + dy * dy).sqrt())
        })
        .filter(|(_, d)| *d <= PICK_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn status_line(ui: &mut Ui, state: &AppState) {
    let summary = &state.view.summary;
    ui.horizontal(|ui: &mut Ui| {
        if summary.is_empty() {
            ui.label(RichText::new(summary.status_text()).color(Color32::RED));
        } else {
            ui.label(summary.status_text());
        }
        if let Some(warning) = summary.limit_warning() {
            ui.label(RichText::new(warning).color(Color32::RED));
        }
    });
}

fn legend(ui: &mut Ui, office_name: &str) {
    ui.horizontal(|ui: &mut Ui| {
        for (label, color) in legend_entries(office_name) {
            ui.label(RichText::new("●").color(color));
            ui.label(label);
            ui.add_space(6.0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Coordinates;
    use crate::map::markers::MarkerDetails;

    fn custom(lat: f64, lng: f64) -> MarkerDescriptor {
        MarkerDescriptor {
            kind: MarkerKind::Custom,
            position: Coordinates::new(lat, lng),
            caption: "x".into(),
            details: MarkerDetails::Custom,
        }
    }

    #[test]
    fn picks_closest_marker_within_radius() {
        let markers = [custom(52.0, 4.0), custom(52.01, 4.01), custom(53.0, 5.0)];
        let bounds = PlotBounds::from_min_max([3.5, 51.5], [4.5, 52.5]);

        let hit = nearest_marker(&markers, PlotPoint::new(4.009, 52.009), &bounds);
        assert_eq!(hit, Some(1));

        let miss = nearest_marker(&markers, PlotPoint::new(3.6, 51.6), &bounds);
        assert_eq!(miss, None);
    }
}
