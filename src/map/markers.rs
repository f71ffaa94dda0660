use chrono::NaiveDate;

use super::geo::directions_url;
use crate::data::model::{Apartment, Coordinates};

// ---------------------------------------------------------------------------
// Fixed points
// ---------------------------------------------------------------------------

pub const OFFICE_COORDS: Coordinates = Coordinates {
    lat: 52.3152336,
    lng: 4.9498692,
};
pub const OFFICE_ADDRESS: &str = "Bijlmerdreef 106, 1102 CT Amsterdam, Netherlands";

/// The workplace all travel times are measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficeLocation {
    pub name: String,
    pub address: String,
    pub position: Coordinates,
}

impl OfficeLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: OFFICE_ADDRESS.to_string(),
            position: OFFICE_COORDS,
        }
    }
}

// ---------------------------------------------------------------------------
// Custom marker
// ---------------------------------------------------------------------------

/// A user-added point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomMarker {
    pub name: String,
    pub position: Coordinates,
}

/// Raw custom-marker fields, any of which may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomMarkerInput {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl CustomMarkerInput {
    /// True when no field was filled in at all.
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.lat.is_none()
            && self.lng.is_none()
    }

    /// A marker only when all three fields are present; otherwise nothing.
    pub fn to_marker(&self) -> Option<CustomMarker> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let lat = self.lat.filter(|v| v.is_finite())?;
        let lng = self.lng.filter(|v| v.is_finite())?;
        Some(CustomMarker {
            name: name.to_string(),
            position: Coordinates::new(lat, lng),
        })
    }
}

// ---------------------------------------------------------------------------
// Marker descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Listing,
    Office,
    Custom,
}

/// A labelled external link shown in a listing's details.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsLink {
    pub label: String,
    pub url: String,
}

/// Everything the details panel shows for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetails {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub address: String,
    pub price: f64,
    pub price_period: String,
    pub surface_amount: f64,
    pub surface_unit: String,
    pub interior_type: String,
    pub rooms: Option<u32>,
    pub time_to_office: String,
    pub time_to_center: String,
    /// Office first, then city center (when known), then one per custom marker.
    pub directions: Vec<DirectionsLink>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub days_online: i64,
}

impl ListingDetails {
    pub fn price_label(&self) -> String {
        format!("{}€ per {}", self.price, self.price_period)
    }

    pub fn surface_label(&self) -> String {
        format!("{} {}", self.surface_amount, self.surface_unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerDetails {
    /// `index` is the listing's position in the filtered sequence.
    Listing { index: usize, details: Box<ListingDetails> },
    Office { address: String },
    Custom,
}

/// One point on the map, ready for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDescriptor {
    pub kind: MarkerKind,
    pub position: Coordinates,
    /// Hover caption.
    pub caption: String,
    pub details: MarkerDetails,
}

impl MarkerDescriptor {
    pub fn listing_index(&self) -> Option<usize> {
        match &self.details {
            MarkerDetails::Listing { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn listing(&self) -> Option<&ListingDetails> {
        match &self.details {
            MarkerDetails::Listing { details, .. } => Some(&**details),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the marker list for a filtered sequence of listings.
///
/// Order: listings (with coordinates) in filtered order, then the office,
/// then the custom marker if any.
pub fn build_markers(
    apartments: &[&Apartment],
    office: &OfficeLocation,
    custom: Option<&CustomMarker>,
) -> Vec<MarkerDescriptor> {
    let mut markers = Vec::with_capacity(apartments.len() + 2);

    for (idx, apt) in apartments.iter().enumerate() {
        let Some(position) = apt.coordinates else {
            log::warn!(
                "Apartment '{}' in idx {idx} has no coordinates, skipping...",
                apt.title
            );
            continue;
        };
        markers.push(MarkerDescriptor {
            kind: MarkerKind::Listing,
            position,
            caption: apt.title.clone(),
            details: MarkerDetails::Listing {
                index: idx,
                details: Box::new(listing_details(apt, position, office, custom)),
            },
        });
    }

    markers.push(MarkerDescriptor {
        kind: MarkerKind::Office,
        position: office.position,
        caption: office.name.clone(),
        details: MarkerDetails::Office {
            address: office.address.clone(),
        },
    });

    if let Some(cm) = custom {
        markers.push(MarkerDescriptor {
            kind: MarkerKind::Custom,
            position: cm.position,
            caption: cm.name.clone(),
            details: MarkerDetails::Custom,
        });
    }

    log::debug!("Built {} markers for {} listings", markers.len(), apartments.len());
    markers
}

fn listing_details(
    apt: &Apartment,
    position: Coordinates,
    office: &OfficeLocation,
    custom: Option<&CustomMarker>,
) -> ListingDetails {
    let mut directions = vec![DirectionsLink {
        label: "Directions to office".to_string(),
        url: apt
            .office_directions_url
            .clone()
            .unwrap_or_else(|| directions_url(position, office.position)),
    }];
    if let Some(url) = &apt.center_directions_url {
        directions.push(DirectionsLink {
            label: "Directions to city center".to_string(),
            url: url.clone(),
        });
    }
    directions.extend(custom.map(|cm| DirectionsLink {
        label: format!("Directions to '{}'", cm.name),
        url: directions_url(position, cm.position),
    }));

    ListingDetails {
        title: apt.title.clone(),
        url: apt.url.clone(),
        thumbnail: apt.thumbnail.clone(),
        address: apt.address.clone(),
        price: apt.price,
        price_period: apt.price_period.clone(),
        surface_amount: apt.surface_area_amount,
        surface_unit: apt.surface_area_unit.clone(),
        interior_type: apt.interior_type.clone(),
        rooms: apt.rooms(),
        time_to_office: apt.time_to_office.clone(),
        time_to_center: apt.time_to_center.clone(),
        directions,
        first_seen: apt.first_seen_date(),
        last_seen: apt.last_seen_date(),
        days_online: apt.days_online(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::apartment;

    fn office() -> OfficeLocation {
        OfficeLocation::new("HQ")
    }

    fn park() -> CustomMarker {
        CustomMarker {
            name: "Park".into(),
            position: Coordinates::new(52.3, 4.8),
        }
    }

    #[test]
    fn custom_marker_requires_all_fields() {
        let full = CustomMarkerInput {
            name: Some("Park".into()),
            lat: Some(52.3),
            lng: Some(4.8),
        };
        assert_eq!(full.to_marker(), Some(park()));

        let no_lat = CustomMarkerInput {
            lat: None,
            ..full.clone()
        };
        assert_eq!(no_lat.to_marker(), None);

        let blank_name = CustomMarkerInput {
            name: Some("  ".into()),
            ..full.clone()
        };
        assert_eq!(blank_name.to_marker(), None);
        assert!(!blank_name.is_empty());
        assert!(CustomMarkerInput::default().is_empty());
    }

    #[test]
    fn custom_marker_descriptor_only_when_valid() {
        let apts = [apartment("a")];
        let refs: Vec<&Apartment> = apts.iter().collect();

        let valid = CustomMarkerInput {
            name: Some("Park".into()),
            lat: Some(52.3),
            lng: Some(4.8),
        }
        .to_marker();
        let markers = build_markers(&refs, &office(), valid.as_ref());
        assert_eq!(markers.iter().filter(|m| m.kind == MarkerKind::Custom).count(), 1);

        let invalid = CustomMarkerInput {
            name: Some("Park".into()),
            lat: None,
            lng: Some(4.8),
        }
        .to_marker();
        let markers = build_markers(&refs, &office(), invalid.as_ref());
        assert_eq!(markers.iter().filter(|m| m.kind == MarkerKind::Custom).count(), 0);
    }

    #[test]
    fn skips_listings_without_coordinates_but_keeps_indices() {
        let mut no_geo = apartment("b");
        no_geo.coordinates = None;
        let apts = [apartment("a"), no_geo, apartment("c")];
        let refs: Vec<&Apartment> = apts.iter().collect();

        let markers = build_markers(&refs, &office(), None);
        let indices: Vec<usize> = markers.iter().filter_map(|m| m.listing_index()).collect();
        assert_eq!(indices, [0, 2]);
        assert_eq!(markers.len(), 3);
    }

    #[test]
    fn office_marker_is_always_present() {
        let markers = build_markers(&[], &office(), None);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Office);
        assert_eq!(markers[0].caption, "HQ");
        assert_eq!(markers[0].position, OFFICE_COORDS);
    }

    #[test]
    fn listing_details_carry_fields_and_links() {
        let mut apt = apartment("a");
        apt.center_directions_url = Some("https://center".into());
        let refs = [&apt];
        let cm = park();

        let markers = build_markers(&refs, &office(), Some(&cm));
        let details = markers[0].listing().unwrap();
        assert_eq!(details.title, "a");
        assert_eq!(details.rooms, Some(3));
        assert_eq!(details.price_label(), "1500€ per month");
        assert_eq!(details.surface_label(), "60 m²");
        assert_eq!(details.first_seen.to_string(), "2024-01-01");
        assert_eq!(details.last_seen.to_string(), "2024-01-11");

        let labels: Vec<&str> = details.directions.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Directions to office", "Directions to city center", "Directions to 'Park'"]
        );
        assert_eq!(
            details.directions[0].url,
            directions_url(Coordinates::new(52.37, 4.89), OFFICE_COORDS)
        );
        assert_eq!(
            details.directions[2].url,
            directions_url(Coordinates::new(52.37, 4.89), cm.position)
        );
    }

    #[test]
    fn precomputed_office_link_wins() {
        let mut apt = apartment("a");
        apt.office_directions_url = Some("https://precomputed".into());
        let markers = build_markers(&[&apt], &office(), None);
        assert_eq!(markers[0].listing().unwrap().directions[0].url, "https://precomputed");
    }
}
