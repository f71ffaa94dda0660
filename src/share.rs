use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;
use url::form_urlencoded;

use crate::data::filter::FilterCriteria;
use crate::map::markers::CustomMarkerInput;

// ---------------------------------------------------------------------------
// Shareable filter links
// ---------------------------------------------------------------------------

const KEY_CITY: &str = "city";
const KEY_INTERIOR_TYPE: &str = "interior_type";
const KEY_MAX_PRICE: &str = "max_price";
const KEY_MIN_SURFACE: &str = "min_surface";
const KEY_MAX_DAYS_ONLINE: &str = "max_days_online";
const KEY_MARKER_NAME: &str = "custom_marker_name";
const KEY_MARKER_LAT: &str = "custom_marker_lat";
const KEY_MARKER_LNG: &str = "custom_marker_lng";

#[derive(Debug, Error, PartialEq)]
pub enum ShareError {
    #[error("query parameter '{key}' should be a number, but is '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// Filter state recovered from a shared link.  Absent keys stay `None` so the
/// caller's defaults apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedView {
    pub cities: Option<BTreeSet<String>>,
    pub max_price: Option<u32>,
    pub min_surface: Option<u32>,
    pub interior_types: Option<BTreeSet<String>>,
    pub max_days_online: Option<u32>,
    pub custom_marker: CustomMarkerInput,
}

impl SharedView {
    /// Overlay the shared values on `base`.
    pub fn apply_to(&self, mut base: FilterCriteria) -> FilterCriteria {
        if let Some(cities) = &self.cities {
            base.cities = cities.clone();
        }
        if let Some(types) = &self.interior_types {
            base.interior_types = types.clone();
        }
        base.max_price = self.max_price.unwrap_or(base.max_price);
        base.min_surface = self.min_surface.unwrap_or(base.min_surface);
        base.max_days_online = self.max_days_online.unwrap_or(base.max_days_online);
        base
    }
}

/// Encode criteria and custom-marker fields as query pairs.
/// Multi-valued filters repeat their key; empty marker fields are left out.
pub fn query_pairs(criteria: &FilterCriteria, marker: &CustomMarkerInput) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    pairs.extend(criteria.cities.iter().map(|c| (KEY_CITY.to_string(), c.clone())));
    pairs.push((KEY_MAX_PRICE.to_string(), criteria.max_price.to_string()));
    pairs.push((KEY_MIN_SURFACE.to_string(), criteria.min_surface.to_string()));
    pairs.extend(
        criteria
            .interior_types
            .iter()
            .map(|t| (KEY_INTERIOR_TYPE.to_string(), t.clone())),
    );
    pairs.push((KEY_MAX_DAYS_ONLINE.to_string(), criteria.max_days_online.to_string()));

    if let Some(name) = marker.name.as_deref().filter(|n| !n.is_empty()) {
        pairs.push((KEY_MARKER_NAME.to_string(), name.to_string()));
    }
    if let Some(lat) = marker.lat {
        pairs.push((KEY_MARKER_LAT.to_string(), lat.to_string()));
    }
    if let Some(lng) = marker.lng {
        pairs.push((KEY_MARKER_LNG.to_string(), lng.to_string()));
    }
    pairs
}

/// Full link to the dashboard with the given filters applied.
pub fn share_url(hostname: &str, criteria: &FilterCriteria, marker: &CustomMarkerInput) -> String {
    let host = if hostname.starts_with("http") {
        hostname.to_string()
    } else {
        format!("http://{hostname}")
    };
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query_pairs(criteria, marker))
        .finish();
    format!("{host}?{query}")
}

/// Parse a query string (or a full link) produced by [`share_url`].
pub fn parse_query(input: &str) -> Result<SharedView, ShareError> {
    let query = input.split_once('?').map_or(input, |(_, q)| q);
    let mut view = SharedView::default();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            KEY_CITY => {
                view.cities
                    .get_or_insert_with(BTreeSet::new)
                    .insert(value.into_owned());
            }
            KEY_INTERIOR_TYPE => {
                view.interior_types
                    .get_or_insert_with(BTreeSet::new)
                    .insert(value.into_owned());
            }
            KEY_MAX_PRICE => view.max_price = Some(number(&key, &value)?),
            KEY_MIN_SURFACE => view.min_surface = Some(number(&key, &value)?),
            KEY_MAX_DAYS_ONLINE => view.max_days_online = Some(number(&key, &value)?),
            KEY_MARKER_NAME => view.custom_marker.name = Some(value.into_owned()),
            KEY_MARKER_LAT => view.custom_marker.lat = Some(number(&key, &value)?),
            KEY_MARKER_LNG => view.custom_marker.lng = Some(number(&key, &value)?),
            other => log::debug!("Ignoring unknown query parameter '{other}'"),
        }
    }
    Ok(view)
}

fn number<T: FromStr>(key: &str, value: &str) -> Result<T, ShareError> {
    value.parse().map_err(|_| ShareError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}
