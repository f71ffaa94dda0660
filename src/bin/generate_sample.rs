use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, StructArray};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const N_APARTMENTS: usize = 400;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// (display name, dataset name, center lat, center lng)
const CITIES: &[(&str, &str, f64, f64)] = &[
    ("Amsterdam", "amsterdam", 52.3676, 4.9041),
    ("Den Haag", "den-haag", 52.0705, 4.3007),
    ("Haarlem", "haarlem", 52.3874, 4.6462),
    ("Leiden", "leiden", 52.1601, 4.4970),
    ("Rotterdam", "rotterdam", 51.9244, 4.4777),
    ("Utrecht", "utrecht", 52.0907, 5.1214),
];

const INTERIORS: &[Option<&str>] = &[
    Some("Furnished"),
    Some("Unfurnished"),
    Some("Part-furnished"),
    Some("Shell"),
    Some("Upholstered"),
    None,
];

const STREETS: &[&str] = &[
    "Kerkstraat",
    "Laan van Meerdervoort",
    "Oudegracht",
    "Breestraat",
    "Coolsingel",
    "Grote Markt",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct SampleApartment {
    title: String,
    url: String,
    thumbnail: String,
    coordinates: Option<(f64, f64)>,
    address: String,
    city: String,
    price: i64,
    surface: f64,
    interior: Option<String>,
    n_rooms: Option<String>,
    time_to_office: String,
    time_to_center: String,
    first_seen_at: String,
    last_seen_at: String,
}

fn generate(rng: &mut SimpleRng) -> Vec<SampleApartment> {
    let epoch = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(6, 0, 0))
        .unwrap_or_default();

    (0..N_APARTMENTS)
        .map(|i| {
            let &(display, city, lat, lng) = rng.pick(CITIES);
            let street = rng.pick(STREETS);
            let number = 1 + rng.next_u64() % 250;
            let surface = rng.range(18.0, 160.0).round();
            let price = (400.0 + surface * rng.range(12.0, 28.0)).round() as i64;
            // every 25th listing is not geocoded
            let coordinates = (i % 25 != 7)
                .then(|| (lat + rng.range(-0.04, 0.04), lng + rng.range(-0.06, 0.06)));
            let first = epoch + Duration::minutes((rng.range(0.0, 60.0 * 24.0 * 45.0)) as i64);
            let last = first + Duration::minutes((rng.range(0.0, 60.0 * 24.0 * 70.0)) as i64);
            let rooms = (surface / 25.0).ceil().max(1.0);

            SampleApartment {
                title: format!("Apartment {street} {number}"),
                url: format!("https://www.pararius.com/apartment-for-rent/{city}/{i:05}"),
                thumbnail: format!("https://picsum.photos/seed/{i}/300/200"),
                coordinates,
                address: format!("{street} {number}, {display}"),
                city: city.to_string(),
                price,
                surface,
                interior: rng.pick(INTERIORS).map(str::to_string),
                n_rooms: (i % 9 != 0).then(|| format!("{rooms:.1}")),
                time_to_office: format!("{} min", 10 + rng.next_u64() % 80),
                time_to_center: format!("{} min", 3 + rng.next_u64() % 30),
                first_seen_at: first.format(TIMESTAMP_FORMAT).to_string(),
                last_seen_at: last.format(TIMESTAMP_FORMAT).to_string(),
            }
        })
        .collect()
}

fn write_parquet(path: &str, rows: &[SampleApartment]) -> Result<()> {
    let strings = |f: fn(&SampleApartment) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let lat: ArrayRef = Arc::new(Float64Array::from(
        rows.iter().map(|r| r.coordinates.map(|c| c.0)).collect::<Vec<_>>(),
    ));
    let lng: ArrayRef = Arc::new(Float64Array::from(
        rows.iter().map(|r| r.coordinates.map(|c| c.1)).collect::<Vec<_>>(),
    ));
    let coordinates: ArrayRef = Arc::new(StructArray::from(vec![
        (Arc::new(Field::new("lat", DataType::Float64, true)), lat),
        (Arc::new(Field::new("lng", DataType::Float64, true)), lng),
    ]));

    let batch = RecordBatch::try_from_iter(vec![
        ("title", strings(|r| Some(r.title.as_str()))),
        ("url", strings(|r| Some(r.url.as_str()))),
        ("thumbnail", strings(|r| Some(r.thumbnail.as_str()))),
        ("coordinates", coordinates),
        ("address", strings(|r| Some(r.address.as_str()))),
        ("city", strings(|r| Some(r.city.as_str()))),
        (
            "price",
            Arc::new(Int64Array::from(rows.iter().map(|r| r.price).collect::<Vec<_>>())) as ArrayRef,
        ),
        ("price_period", strings(|_| Some("month"))),
        (
            "surface_area_amount",
            Arc::new(Float64Array::from(rows.iter().map(|r| r.surface).collect::<Vec<_>>()))
                as ArrayRef,
        ),
        ("surface_area_unit", strings(|_| Some("m²"))),
        ("interior_type", strings(|r| r.interior.as_deref())),
        ("n_rooms", strings(|r| r.n_rooms.as_deref())),
        ("time_to_office", strings(|r| Some(r.time_to_office.as_str()))),
        ("time_to_center", strings(|r| Some(r.time_to_center.as_str()))),
        ("first_seen_at", strings(|r| Some(r.first_seen_at.as_str()))),
        ("last_seen_at", strings(|r| Some(r.last_seen_at.as_str()))),
    ])
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(path: &str, rows: &[SampleApartment]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "title",
        "url",
        "thumbnail",
        "coordinates",
        "address",
        "city",
        "price",
        "price_period",
        "surface_area_amount",
        "surface_area_unit",
        "interior_type",
        "n_rooms",
        "time_to_office",
        "time_to_center",
        "first_seen_at",
        "last_seen_at",
    ])?;
    for r in rows {
        let coordinates = r
            .coordinates
            .map(|(lat, lng)| serde_json::json!({ "lat": lat, "lng": lng }).to_string())
            .unwrap_or_default();
        let price = r.price.to_string();
        let surface = r.surface.to_string();
        writer.write_record([
            r.title.as_str(),
            r.url.as_str(),
            r.thumbnail.as_str(),
            coordinates.as_str(),
            r.address.as_str(),
            r.city.as_str(),
            price.as_str(),
            "month",
            surface.as_str(),
            "m²",
            r.interior.as_deref().unwrap_or(""),
            r.n_rooms.as_deref().unwrap_or(""),
            r.time_to_office.as_str(),
            r.time_to_center.as_str(),
            r.first_seen_at.as_str(),
            r.last_seen_at.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_parquet("sample_apartments.parquet", &rows)?;
    write_csv("sample_apartments.csv", &rows)?;

    println!(
        "Wrote {} apartments to sample_apartments.parquet and sample_apartments.csv",
        rows.len()
    );
    Ok(())
}
