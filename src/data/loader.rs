use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{ApartmentTable, CellValue, Coordinates, Row};

// ---------------------------------------------------------------------------
// Dataset source description
// ---------------------------------------------------------------------------

/// On-disk encoding of the apartments dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFormat {
    Parquet,
    Csv,
}

impl DatasetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Csv => "csv",
        }
    }
}

/// Where the dataset lives, as configured. Doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetSource {
    pub uri: String,
    pub format: DatasetFormat,
}

/// A parsed dataset URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    Local(PathBuf),
    /// `s3://bucket/key`, fetched anonymously over HTTPS.
    ObjectStore { bucket: String, key: String },
    Http(String),
}

impl DatasetLocation {
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            let Some((bucket, key)) = rest.split_once('/') else {
                bail!("object store URI '{uri}' has no key, expected s3://bucket/key");
            };
            if bucket.is_empty() || key.is_empty() {
                bail!("object store URI '{uri}' is incomplete, expected s3://bucket/key");
            }
            return Ok(DatasetLocation::ObjectStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(DatasetLocation::Http(uri.to_string()));
        }
        Ok(DatasetLocation::Local(PathBuf::from(uri)))
    }

    /// Public HTTPS endpoint for an object-store location.
    fn download_url(&self) -> Option<String> {
        match self {
            DatasetLocation::ObjectStore { bucket, key } => {
                Some(format!("https://{bucket}.s3.amazonaws.com/{key}"))
            }
            DatasetLocation::Http(url) => Some(url.clone()),
            DatasetLocation::Local(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Fetch and parse the configured dataset.
pub fn load_dataset(source: &DatasetSource) -> Result<ApartmentTable> {
    let location = DatasetLocation::parse(&source.uri)?;
    let file = open_location(&location)
        .with_context(|| format!("retrieving dataset from '{}'", source.uri))?;
    let table = parse(file, source.format)
        .with_context(|| format!("parsing {} dataset '{}'", source.format.as_str(), source.uri))?;
    log::info!(
        "Loaded {} apartments from {} ({})",
        table.len(),
        source.uri,
        source.format.as_str()
    );
    Ok(table)
}

/// Load a local file picked by the user.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – Parquet (recommended)
/// * `.csv`             – CSV with a header row
pub fn load_file(path: &Path) -> Result<ApartmentTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let format = match ext.as_str() {
        "parquet" | "pq" => DatasetFormat::Parquet,
        "csv" => DatasetFormat::Csv,
        other => bail!("Unsupported file extension: .{other}"),
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse(file, format)
}

fn parse(file: File, format: DatasetFormat) -> Result<ApartmentTable> {
    match format {
        DatasetFormat::Parquet => load_parquet(file),
        DatasetFormat::Csv => load_csv(file),
    }
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Open the dataset as a readable file.  Remote objects are spooled into an
/// anonymous temp file that is removed when the handle drops.
fn open_location(location: &DatasetLocation) -> Result<File> {
    match location {
        DatasetLocation::Local(path) => {
            File::open(path).with_context(|| format!("opening {}", path.display()))
        }
        remote => {
            let url = remote
                .download_url()
                .context("remote location without download URL")?;
            download(&url)
        }
    }
}

fn download(url: &str) -> Result<File> {
    log::debug!("Downloading dataset from {url}");
    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("downloading {url}"))?;

    let mut spool = tempfile::tempfile().context("creating temp file")?;
    let n_bytes = response
        .copy_to(&mut spool)
        .context("writing download to temp file")?;
    spool.rewind().context("rewinding temp file")?;
    log::debug!("Downloaded {n_bytes} bytes");
    Ok(spool)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one listing per line.
/// Every cell is kept as text and typed later; empty cells are null.
fn load_csv<R: Read>(input: R) -> Result<ApartmentTable> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| {
                let cell = if value.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::String(value.to_string())
                };
                (col.clone(), cell)
            })
            .collect();
        rows.push(row);
    }

    ApartmentTable::from_rows(rows, headers)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of apartments.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); `coordinates` may be a struct column
/// with `lat` / `lng` children.
fn load_parquet(file: File) -> Result<ApartmentTable> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let cells: Row = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name().clone(), extract_cell(batch.column(i), row)))
                .collect();
            rows.push(cells);
        }
    }

    ApartmentTable::from_rows(rows, column_names)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => CellValue::String(col.as_string_view().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => CellValue::Integer(col.as_primitive::<UInt64Type>().value(row) as i64),
        DataType::Float32 | DataType::Float64 => {
            float_at(col, row).map_or(CellValue::Null, CellValue::Float)
        }
        DataType::Timestamp(unit, _) => {
            let ts = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => {
                    col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
                }
            };
            ts.map_or(CellValue::Null, CellValue::Timestamp)
        }
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_datetime(row)
            .map_or(CellValue::Null, CellValue::Timestamp),
        DataType::Date64 => col
            .as_primitive::<Date64Type>()
            .value_as_datetime(row)
            .map_or(CellValue::Null, CellValue::Timestamp),
        DataType::Struct(_) => {
            let s = col.as_struct();
            let lat = s.column_by_name("lat").and_then(|c| float_at(c, row));
            let lng = s.column_by_name("lng").and_then(|c| float_at(c, row));
            match (lat, lng) {
                (Some(lat), Some(lng)) => CellValue::Coordinates(Coordinates::new(lat, lng)),
                _ => CellValue::Null,
            }
        }
        other => {
            log::debug!("Ignoring cell of unsupported type {other:?}");
            CellValue::Null
        }
    }
}

/// Numeric value of a float or integer column at `row`.
fn float_at(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => Some(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Some(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Int64 => Some(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Int32 => Some(col.as_primitive::<Int32Type>().value(row) as f64),
        _ => None,
    }
}
