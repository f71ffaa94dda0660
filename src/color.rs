use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::map::markers::{MarkerDescriptor, MarkerDetails, MarkerKind};
use crate::state::Annotation;

// ---------------------------------------------------------------------------
// Marker colours
// ---------------------------------------------------------------------------

pub const OFFICE_COLOR: Color32 = Color32::from_rgb(0xF6, 0x97, 0x30);
pub const CUSTOM_COLOR: Color32 = Color32::from_rgb(0x43, 0x6F, 0x8A);
pub const VISITED_COLOR: Color32 = Color32::from_rgb(0xD6, 0x3E, 0x2A);
pub const FAVORITE_COLOR: Color32 = Color32::from_rgb(0x9B, 0x59, 0xB6);

/// Convert an HSL triple to an egui colour.
fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let hsl = Hsl::new(hue, saturation, lightness);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Listing colour on a green → red scale by price relative to `max_price`.
pub fn price_color(price: f64, max_price: f64) -> Color32 {
    let ratio = if max_price > 0.0 {
        (price / max_price).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    hsl_to_color32(120.0 * (1.0 - ratio), 0.75, 0.45)
}

/// Fill colour for a marker, honouring any visited/favorite annotation.
pub fn marker_color(
    marker: &MarkerDescriptor,
    annotation: Option<Annotation>,
    max_price: f64,
) -> Color32 {
    match (&marker.kind, annotation) {
        (MarkerKind::Office, _) => OFFICE_COLOR,
        (MarkerKind::Custom, _) => CUSTOM_COLOR,
        (MarkerKind::Listing, Some(Annotation::Visited)) => VISITED_COLOR,
        (MarkerKind::Listing, Some(Annotation::Favorite)) => FAVORITE_COLOR,
        (MarkerKind::Listing, None) => match &marker.details {
            MarkerDetails::Listing { details, .. } => price_color(details.price, max_price),
            _ => Color32::GRAY,
        },
    }
}

/// Legend entries (label → colour) for the map panel.
pub fn legend_entries(office_name: &str) -> Vec<(String, Color32)> {
    vec![
        ("Cheap".to_string(), price_color(0.0, 1.0)),
        ("Expensive".to_string(), price_color(1.0, 1.0)),
        ("Visited".to_string(), VISITED_COLOR),
        ("Favorite".to_string(), FAVORITE_COLOR),
        (office_name.to_string(), OFFICE_COLOR),
        ("Custom marker".to_string(), CUSTOM_COLOR),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Coordinates;

    fn office_marker() -> MarkerDescriptor {
        MarkerDescriptor {
            kind: MarkerKind::Office,
            position: Coordinates::new(52.0, 4.0),
            caption: "HQ".into(),
            details: MarkerDetails::Office {
                address: String::new(),
            },
        }
    }

    #[test]
    fn price_scale_runs_green_to_red() {
        let cheap = price_color(0.0, 3500.0);
        let pricey = price_color(3500.0, 3500.0);
        assert!(cheap.g() > cheap.r());
        assert!(pricey.r() > pricey.g());
        assert_eq!(price_color(9000.0, 3500.0), pricey);
        assert_eq!(price_color(100.0, 0.0), cheap);
    }

    #[test]
    fn annotations_do_not_recolor_fixed_markers() {
        let m = office_marker();
        assert_eq!(marker_color(&m, Some(Annotation::Visited), 3500.0), OFFICE_COLOR);
    }
}
