use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from Parquet or CSV, before it is mapped
/// onto an [`Apartment`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Coordinates(Coordinates),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Timestamp(t) => write!(f, "{t}"),
            CellValue::Coordinates(c) => write!(f, "{c}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number. Text is parsed, blanks are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Interpret the cell as text. Numbers are rendered, `Null` is `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One row of the source table: column_name → cell.
pub type Row = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Apartment – one listing
// ---------------------------------------------------------------------------

/// Stand-in for a null `interior_type`.
pub const UNKNOWN_INTERIOR: &str = "?";

/// Timestamp layouts accepted for `first_seen_at` / `last_seen_at` text.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single rental listing (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Apartment {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    /// `None` when the scraper could not geocode the listing.
    pub coordinates: Option<Coordinates>,
    pub address: String,
    pub city: String,
    pub price: f64,
    pub price_period: String,
    pub surface_area_amount: f64,
    pub surface_area_unit: String,
    /// Never null: a missing value is stored as [`UNKNOWN_INTERIOR`].
    pub interior_type: String,
    pub n_rooms: Option<String>,
    pub time_to_office: String,
    pub time_to_center: String,
    pub office_directions_url: Option<String>,
    pub center_directions_url: Option<String>,
    pub first_seen_at: NaiveDateTime,
    pub last_seen_at: NaiveDateTime,
}

impl Apartment {
    /// Whole days between first and last sighting, truncated toward zero.
    pub fn days_online(&self) -> i64 {
        (self.last_seen_at - self.first_seen_at).num_days()
    }

    /// Room count parsed from the free-form `n_rooms` text (`"3.0"` → 3).
    pub fn rooms(&self) -> Option<u32> {
        let raw = self.n_rooms.as_deref()?.trim();
        let value = raw.parse::<f64>().ok()?;
        (value.is_finite() && value >= 0.0).then(|| value.trunc() as u32)
    }

    pub fn first_seen_date(&self) -> NaiveDate {
        self.first_seen_at.date()
    }

    pub fn last_seen_date(&self) -> NaiveDate {
        self.last_seen_at.date()
    }

    /// Map a loosely-typed table row onto an apartment.
    ///
    /// The [`REQUIRED_COLUMNS`] must hold a value; other text columns default
    /// to empty.
    pub fn from_row(row: &Row) -> Result<Self> {
        let interior_type = optional_text(row, "interior_type")
            .unwrap_or_else(|| UNKNOWN_INTERIOR.to_string());

        Ok(Apartment {
            title: required_text(row, "title")?,
            url: required_text(row, "url")?,
            thumbnail: optional_text(row, "thumbnail").unwrap_or_default(),
            coordinates: coordinates(row),
            address: optional_text(row, "address").unwrap_or_default(),
            city: required_text(row, "city")?,
            price: required_f64(row, "price")?,
            price_period: optional_text(row, "price_period").unwrap_or_default(),
            surface_area_amount: required_f64(row, "surface_area_amount")?,
            surface_area_unit: optional_text(row, "surface_area_unit").unwrap_or_default(),
            interior_type,
            n_rooms: optional_text(row, "n_rooms").filter(|s| !s.trim().is_empty()),
            time_to_office: optional_text(row, "time_to_office").unwrap_or_default(),
            time_to_center: optional_text(row, "time_to_center").unwrap_or_default(),
            office_directions_url: optional_text(row, "office_directions_url")
                .filter(|s| !s.is_empty()),
            center_directions_url: optional_text(row, "center_directions_url")
                .filter(|s| !s.is_empty()),
            first_seen_at: required_timestamp(row, "first_seen_at")?,
            last_seen_at: required_timestamp(row, "last_seen_at")?,
        })
    }
}

/// Columns every dataset must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "title",
    "url",
    "city",
    "price",
    "surface_area_amount",
    "first_seen_at",
    "last_seen_at",
];

// -- Row accessors --

fn optional_text(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(CellValue::as_text)
}

fn required_text(row: &Row, col: &str) -> Result<String> {
    optional_text(row, col)
        .filter(|s| !s.trim().is_empty())
        .with_context(|| format!("missing value for '{col}'"))
}

fn required_f64(row: &Row, col: &str) -> Result<f64> {
    let cell = row
        .get(col)
        .with_context(|| format!("missing column '{col}'"))?;
    cell.as_f64()
        .with_context(|| format!("'{col}' is not a number: {cell}"))
}

fn required_timestamp(row: &Row, col: &str) -> Result<NaiveDateTime> {
    match row.get(col) {
        Some(CellValue::Timestamp(t)) => Ok(*t),
        Some(CellValue::String(s)) => parse_timestamp(s)
            .with_context(|| format!("'{col}' is not a timestamp: '{s}'")),
        Some(other) => bail!("'{col}' is not a timestamp: {other}"),
        None => bail!("missing column '{col}'"),
    }
}

/// Parse the scraper's timestamp text; a bare date means midnight.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("unrecognised timestamp '{s}'"))
}

/// Coordinates come either as one `coordinates` cell (struct or JSON text)
/// or as separate `lat` / `lng` columns.
fn coordinates(row: &Row) -> Option<Coordinates> {
    match row.get("coordinates") {
        Some(CellValue::Coordinates(c)) => return valid(*c),
        Some(CellValue::String(s)) if !s.trim().is_empty() => {
            return serde_json::from_str::<Coordinates>(s).ok().and_then(valid);
        }
        _ => {}
    }
    let lat = row.get("lat").filter(|c| !c.is_blank())?.as_f64()?;
    let lng = row.get("lng").filter(|c| !c.is_blank())?.as_f64()?;
    valid(Coordinates::new(lat, lng))
}

fn valid(c: Coordinates) -> Option<Coordinates> {
    (c.lat.is_finite() && c.lng.is_finite()).then_some(c)
}

// ---------------------------------------------------------------------------
// ApartmentTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct ApartmentTable {
    /// All listings, in file order.
    pub apartments: Vec<Apartment>,
    /// Column names seen in the source file.
    pub column_names: Vec<String>,
}

impl ApartmentTable {
    pub fn new(apartments: Vec<Apartment>, column_names: Vec<String>) -> Self {
        ApartmentTable {
            apartments,
            column_names,
        }
    }

    /// Build a table from raw rows.  A required column absent from the
    /// header is an error; rows with a blank or malformed required value are
    /// skipped with a warning.
    pub fn from_rows(rows: Vec<Row>, column_names: Vec<String>) -> Result<Self> {
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|col| !column_names.iter().any(|c| c == *col))
        {
            bail!("dataset has no '{missing}' column");
        }

        let apartments: Vec<Apartment> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| match Apartment::from_row(row) {
                Ok(apt) => Some(apt),
                Err(e) => {
                    log::warn!("row {i}: {e:#}, skipping");
                    None
                }
            })
            .collect();
        if apartments.len() < rows.len() {
            log::warn!(
                "Skipped {} of {} rows with incomplete data",
                rows.len() - apartments.len(),
                rows.len()
            );
        }
        Ok(Self::new(apartments, column_names))
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.apartments.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.apartments.is_empty()
    }
}
