use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::loader::DatasetSource;
use super::model::ApartmentTable;

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

struct CacheEntry {
    source: DatasetSource,
    loaded_at: Instant,
    table: Arc<ApartmentTable>,
}

/// Holds the most recently loaded table for one [`DatasetSource`].
///
/// An entry is reused until its source changes, its TTL elapses, or
/// [`DatasetCache::invalidate`] is called.  `ttl = None` keeps it for the
/// lifetime of the process.
pub struct DatasetCache {
    ttl: Option<Duration>,
    entry: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { ttl, entry: None }
    }

    /// Return the cached table for `source`, calling `load` on a miss.
    ///
    /// A failed load leaves any previous entry untouched.
    pub fn get_or_load<F>(&mut self, source: &DatasetSource, load: F) -> Result<Arc<ApartmentTable>>
    where
        F: FnOnce(&DatasetSource) -> Result<ApartmentTable>,
    {
        self.get_or_load_at(source, Instant::now(), load)
    }

    fn get_or_load_at<F>(
        &mut self,
        source: &DatasetSource,
        now: Instant,
        load: F,
    ) -> Result<Arc<ApartmentTable>>
    where
        F: FnOnce(&DatasetSource) -> Result<ApartmentTable>,
    {
        if let Some(entry) = &self.entry {
            if entry.source == *source && !self.is_expired(entry, now) {
                log::debug!("Dataset cache hit for {}", source.uri);
                return Ok(Arc::clone(&entry.table));
            }
        }

        log::debug!("Dataset cache miss for {}", source.uri);
        let table = Arc::new(load(source)?);
        self.entry = Some(CacheEntry {
            source: source.clone(),
            loaded_at: now,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Drop the cached table so the next access reloads it.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::info!("Dataset cache invalidated");
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.loaded_at) >= ttl)
    }
}
