use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::data::cache::DatasetCache;
use crate::data::filter::{FilterCriteria, filter_apartments};
use crate::data::loader::{load_dataset, load_file};
use crate::data::model::{ApartmentTable, Coordinates};
use crate::map::geo::average_coordinates;
use crate::map::markers::{
    CustomMarker, CustomMarkerInput, MarkerDescriptor, OfficeLocation, build_markers,
};
use crate::share::{SharedView, share_url};

pub const MISSING_MARKER_FIELDS: &str = "Ups! You forgot to fill one of the fields.";

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// Visited / favorite state of one listing marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Visited,
    Favorite,
}

/// Shown vs. available counts for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultSummary {
    pub shown: usize,
    pub total: usize,
    pub limit: usize,
}

impl ResultSummary {
    pub fn is_empty(&self) -> bool {
        self.shown == 0
    }

    pub fn limit_reached(&self) -> bool {
        self.shown > 0 && self.shown == self.limit
    }

    pub fn status_text(&self) -> String {
        if self.is_empty() {
            "No apartments found".to_string()
        } else {
            format!("Showing {} apartments (max {}).", self.shown, self.limit)
        }
    }

    pub fn limit_warning(&self) -> Option<String> {
        self.limit_reached().then(|| {
            format!(
                "Showing the maximum number of apartments ({}). Try to apply some filters \
                 to see more relevant apartments for you.",
                self.limit
            )
        })
    }
}

/// Output of one filter run: what the map draws.
#[derive(Debug, Clone)]
pub struct MapView {
    pub center: Coordinates,
    pub markers: Vec<MarkerDescriptor>,
    pub summary: ResultSummary,
}

/// Text buffers behind the custom-marker form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerForm {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

impl MarkerForm {
    fn from_input(input: &CustomMarkerInput) -> Self {
        Self {
            name: input.name.clone().unwrap_or_default(),
            lat: input.lat.map(|v| v.to_string()).unwrap_or_default(),
            lng: input.lng.map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    /// Blank or unparsable fields count as missing.
    pub fn to_input(&self) -> CustomMarkerInput {
        let number = |s: &str| s.trim().parse::<f64>().ok();
        CustomMarkerInput {
            name: Some(self.name.trim().to_string()).filter(|n| !n.is_empty()),
            lat: number(&self.lat),
            lng: number(&self.lng),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DataOrigin {
    Configured,
    File(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.  Every user action is
/// one method call; the map view is recomputed from scratch each time.
pub struct AppState {
    pub settings: Settings,
    pub office: OfficeLocation,
    cache: DatasetCache,
    origin: DataOrigin,

    /// Loaded dataset (None until the first successful load).
    pub dataset: Option<Arc<ApartmentTable>>,

    /// Filters currently applied to the map.
    pub criteria: FilterCriteria,
    /// Filter widgets' state, applied on "Apply filters".
    pub draft: FilterCriteria,

    pub marker_form: MarkerForm,
    applied_marker: CustomMarkerInput,
    custom_marker: Option<CustomMarker>,
    /// Inline validation notice under the custom-marker form.
    pub marker_notice: Option<String>,

    pub view: MapView,
    /// Annotations keyed by listing index; reset whenever the view is rebuilt.
    pub annotations: BTreeMap<usize, Annotation>,
    /// Position in `view.markers` of the marker whose details are shown.
    pub selected: Option<usize>,
    /// Set when the view changed and the map should re-center on it.
    pub recenter: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings, shared: SharedView) -> Self {
        let office = OfficeLocation::new(settings.office_name.clone());
        let criteria = shared.apply_to(FilterCriteria::show_all(settings.max_entries));
        let applied_marker = shared.custom_marker.clone();
        let custom_marker = applied_marker.to_marker();
        let view = MapView {
            center: office.position,
            markers: Vec::new(),
            summary: ResultSummary {
                limit: settings.max_entries,
                ..ResultSummary::default()
            },
        };

        Self {
            cache: DatasetCache::new(settings.cache_ttl),
            origin: DataOrigin::Configured,
            dataset: None,
            draft: criteria.clone(),
            criteria,
            marker_form: MarkerForm::from_input(&applied_marker),
            applied_marker,
            custom_marker,
            marker_notice: None,
            view,
            annotations: BTreeMap::new(),
            selected: None,
            recenter: true,
            status_message: None,
            office,
            settings,
        }
    }

    // -- dataset --

    /// Load (or reuse from cache) the configured dataset and refresh the view.
    pub fn load_configured_dataset(&mut self) {
        let source = self.settings.dataset.clone();
        match self.cache.get_or_load(&source, load_dataset) {
            Ok(table) => {
                let changed = self
                    .dataset
                    .as_ref()
                    .map_or(true, |current| !Arc::ptr_eq(current, &table));
                self.origin = DataOrigin::Configured;
                if changed {
                    self.set_dataset(table);
                }
            }
            Err(e) => {
                log::error!("Failed to load dataset: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Drop the cached table and fetch it again.
    pub fn reload_dataset(&mut self) {
        self.cache.invalidate();
        self.load_configured_dataset();
    }

    /// Replace the configured dataset with a local file picked by the user.
    pub fn open_file(&mut self, path: &Path) {
        match load_file(path) {
            Ok(table) => {
                log::info!("Loaded {} apartments from {}", table.len(), path.display());
                self.origin = DataOrigin::File(path.display().to_string());
                self.set_dataset(Arc::new(table));
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn set_dataset(&mut self, table: Arc<ApartmentTable>) {
        if table.is_empty() {
            log::warn!("Dataset {} has no usable apartments", self.dataset_label());
        }
        self.dataset = Some(table);
        self.status_message = None;
        self.rebuild_view();
    }

    /// Where the current table came from, for the top bar.
    pub fn dataset_label(&self) -> &str {
        match &self.origin {
            DataOrigin::Configured => &self.settings.dataset.uri,
            DataOrigin::File(path) => path,
        }
    }

    // -- event handlers --

    /// Apply a new filter selection.
    pub fn apply_filters(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        if self.origin == DataOrigin::Configured && self.dataset.is_some() {
            // picks up a TTL expiry; a cache hit keeps the same table
            self.load_configured_dataset();
        }
        self.rebuild_view();
    }

    /// Handle the "Add custom marker" button.
    pub fn submit_custom_marker(&mut self) {
        let input = self.marker_form.to_input();
        self.custom_marker = input.to_marker();
        self.marker_notice = self
            .custom_marker
            .is_none()
            .then(|| MISSING_MARKER_FIELDS.to_string());
        self.applied_marker = input;
        self.rebuild_view();
    }

    /// Remove the custom marker and clear its form.
    pub fn clear_custom_marker(&mut self) {
        self.marker_form = MarkerForm::default();
        self.applied_marker = CustomMarkerInput::default();
        self.custom_marker = None;
        self.marker_notice = None;
        self.rebuild_view();
    }

    pub fn custom_marker(&self) -> Option<&CustomMarker> {
        self.custom_marker.as_ref()
    }

    /// Set or clear (`None`) the annotation of a listing marker.
    pub fn annotate(&mut self, listing_index: usize, annotation: Option<Annotation>) {
        match annotation {
            Some(a) => {
                self.annotations.insert(listing_index, a);
            }
            None => {
                self.annotations.remove(&listing_index);
            }
        }
    }

    pub fn annotation(&self, listing_index: usize) -> Option<Annotation> {
        self.annotations.get(&listing_index).copied()
    }

    /// Select the marker at `marker_pos` in `view.markers` (or clear selection).
    pub fn select(&mut self, marker_pos: Option<usize>) {
        self.selected = marker_pos.filter(|&pos| pos < self.view.markers.len());
    }

    pub fn selected_marker(&self) -> Option<&MarkerDescriptor> {
        self.selected.and_then(|pos| self.view.markers.get(pos))
    }

    /// Link reproducing the currently applied filters and custom marker.
    pub fn share_link(&self) -> String {
        share_url(&self.settings.web_hostname, &self.criteria, &self.applied_marker)
    }

    // -- derived view --

    fn rebuild_view(&mut self) {
        self.annotations.clear();
        self.selected = None;

        let Some(table) = self.dataset.clone() else {
            return;
        };

        let filtered = filter_apartments(&table, &self.criteria);
        let center = average_coordinates(filtered.iter().copied()).unwrap_or_else(|err| {
            log::info!("{err}; centering the map on {}", self.office.name);
            self.office.position
        });
        let markers = build_markers(&filtered, &self.office, self.custom_marker.as_ref());
        let summary = ResultSummary {
            shown: filtered.len(),
            total: table.len(),
            limit: self.criteria.result_limit,
        };
        log::info!(
            "Showing {} of {} apartments ({} markers)",
            summary.shown,
            summary.total,
            markers.len()
        );

        self.view = MapView {
            center,
            markers,
            summary,
        };
        self.recenter = true;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use super::*;
    use crate::data::loader::{DatasetFormat, DatasetSource};
    use crate::map::markers::MarkerKind;
    use crate::share::parse_query;

    const HEADER: &str = "title,url,coordinates,city,price,surface_area_amount,interior_type,first_seen_at,last_seen_at\n";

    fn csv_row(title: &str, coords: &str, city: &str, price: u32) -> String {
        format!(
            "{title},https://{title},\"{coords}\",{city},{price},50,Furnished,2024-01-01 00:00:00.0,2024-01-03 00:00:00.0\n"
        )
    }

    fn dataset_file(rows: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        for row in rows {
            file.write_all(row.as_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn settings(uri: &str, max_entries: usize) -> Settings {
        Settings {
            dataset: DatasetSource {
                uri: uri.to_string(),
                format: DatasetFormat::Csv,
            },
            max_entries,
            web_hostname: "localhost:8501".into(),
            office_name: "HQ".into(),
            cache_ttl: None,
        }
    }

    fn sample_rows() -> Vec<String> {
        vec![
            csv_row("a", r#"{""lat"": 52.0, ""lng"": 4.9}"#, "amsterdam", 1000),
            csv_row("b", r#"{""lat"": 52.2, ""lng"": 5.1}"#, "den-haag", 2000),
            csv_row("c", "", "utrecht", 3000),
        ]
    }

    fn loaded_state(max_entries: usize) -> (AppState, tempfile::NamedTempFile) {
        let file = dataset_file(&sample_rows());
        let mut state = AppState::new(
            settings(&file.path().to_string_lossy(), max_entries),
            SharedView::default(),
        );
        state.load_configured_dataset();
        (state, file)
    }

    fn listing_count(state: &AppState) -> usize {
        state
            .view
            .markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Listing)
            .count()
    }

    #[test]
    fn loads_and_builds_initial_view() {
        let (state, _file) = loaded_state(500);
        assert!(state.status_message.is_none());
        assert_eq!(state.view.summary.shown, 3);
        assert_eq!(state.view.summary.total, 3);
        // "c" has no coordinates
        assert_eq!(listing_count(&state), 2);
        assert!((state.view.center.lat - 52.1).abs() < 1e-9);
        assert!((state.view.center.lng - 5.0).abs() < 1e-9);
        assert_eq!(state.view.summary.status_text(), "Showing 3 apartments (max 500).");
        assert_eq!(state.view.summary.limit_warning(), None);
    }

    #[test]
    fn empty_result_centers_on_office() {
        let (mut state, _file) = loaded_state(500);
        let mut criteria = state.criteria.clone();
        criteria.max_price = 500;
        state.apply_filters(criteria);

        assert!(state.view.summary.is_empty());
        assert_eq!(state.view.summary.status_text(), "No apartments found");
        assert_eq!(state.view.center, state.office.position);
        assert_eq!(state.view.markers.len(), 1);
        assert_eq!(state.view.markers[0].kind, MarkerKind::Office);
    }

    #[test]
    fn limit_warning_when_cap_is_hit() {
        let (state, _file) = loaded_state(2);
        assert_eq!(state.view.summary.shown, 2);
        assert!(state.view.summary.limit_reached());
        assert!(state.view.summary.limit_warning().unwrap().contains("(2)"));
    }

    #[test]
    fn load_failure_is_reported_not_fatal() {
        let mut state = AppState::new(settings("/nope/apartments.csv", 500), SharedView::default());
        state.load_configured_dataset();
        assert!(state.dataset.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }

    #[test]
    fn incomplete_custom_marker_shows_notice() {
        let (mut state, _file) = loaded_state(500);
        state.marker_form = MarkerForm {
            name: "Park".into(),
            lat: String::new(),
            lng: "4.8".into(),
        };
        state.submit_custom_marker();
        assert_eq!(state.marker_notice.as_deref(), Some(MISSING_MARKER_FIELDS));
        assert!(state.custom_marker().is_none());
        assert!(!state.view.markers.iter().any(|m| m.kind == MarkerKind::Custom));

        state.marker_form.lat = "52.3".into();
        state.submit_custom_marker();
        assert_eq!(state.marker_notice, None);
        assert_eq!(
            state.view.markers.iter().filter(|m| m.kind == MarkerKind::Custom).count(),
            1
        );

        state.clear_custom_marker();
        assert!(state.custom_marker().is_none());
        assert_eq!(state.marker_form, MarkerForm::default());
    }

    #[test]
    fn rebuilding_the_view_resets_annotations() {
        let (mut state, _file) = loaded_state(500);
        state.annotate(0, Some(Annotation::Visited));
        state.annotate(1, Some(Annotation::Favorite));
        state.annotate(1, None);
        assert_eq!(state.annotation(0), Some(Annotation::Visited));
        assert_eq!(state.annotation(1), None);

        state.select(Some(0));
        assert_eq!(state.selected_marker().unwrap().listing_index(), Some(0));

        let criteria = state.criteria.clone();
        state.apply_filters(criteria);
        assert!(state.annotations.is_empty());
        assert_eq!(state.selected, None);
    }

    #[test]
    fn shared_link_seeds_the_initial_state() {
        let file = dataset_file(&sample_rows());
        let shared = parse_query(
            "city=Den+Haag&max_price=2500&custom_marker_name=Park&custom_marker_lat=52.3&custom_marker_lng=4.8",
        )
        .unwrap();
        let mut state = AppState::new(settings(&file.path().to_string_lossy(), 500), shared);
        state.load_configured_dataset();

        assert_eq!(state.criteria.cities, BTreeSet::from(["Den Haag".to_string()]));
        assert_eq!(state.view.summary.shown, 1);
        assert_eq!(state.marker_form.name, "Park");
        assert!(state.custom_marker().is_some());

        let link = state.share_link();
        assert!(link.starts_with("http://localhost:8501?city=Den+Haag&max_price=2500"));
        assert!(link.contains("custom_marker_name=Park"));
    }

    #[test]
    fn reload_picks_up_new_rows() {
        let (mut state, file) = loaded_state(500);
        let mut f = std::fs::OpenOptions::new().append(true).open(file.path()).unwrap();
        f.write_all(csv_row("d", "", "leiden", 900).as_bytes()).unwrap();

        state.apply_filters(state.criteria.clone());
        assert_eq!(state.view.summary.total, 3, "cached table is reused");

        state.reload_dataset();
        assert_eq!(state.view.summary.total, 4);
    }

    #[test]
    fn open_file_replaces_dataset() {
        let (mut state, _file) = loaded_state(500);
        let other = dataset_file(&[csv_row("z", "", "haarlem", 800)]);
        state.open_file(other.path());
        assert_eq!(state.view.summary.total, 1);
        assert_eq!(state.dataset_label(), other.path().display().to_string());
    }
}
