/// Data layer: core types, loading, caching, and filtering.
///
/// Architecture:
/// ```text
///  local path / s3:// / http(s)://   (.parquet / .csv)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse → ApartmentTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  load once per source, TTL / manual refresh
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterCriteria → filtered listings (capped)
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
