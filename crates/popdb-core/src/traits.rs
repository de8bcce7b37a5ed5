// crates/popdb-core/src/traits.rs
use crate::bbox::BoundingBox;
use crate::common::CatalogStats;
use crate::error::Result;
use crate::model::{Coordinates, PlaceRecord};
use serde::{Deserialize, Serialize};

/// Storage capability behind the loader and the radius engine.
///
/// The catalog is passed around explicitly (usually as `&dyn Catalog` or an
/// `Arc`) instead of living in a global, so tests can swap in
/// [`MemoryCatalog`](crate::store::MemoryCatalog) and several independent
/// catalogs can coexist in one process.
///
/// Implementors must be safe to share between threads: queries run
/// concurrently and are read-only with respect to each other.
pub trait Catalog: Send + Sync {
    /// Creates the places table and its `(latitude, longitude)` index.
    ///
    /// Fails with [`PopDbError::Schema`](crate::PopDbError::Schema) when
    /// either already exists; callers decide whether that is fatal.
    fn create_schema(&self) -> Result<()>;

    /// Drops the table and index if present, so the catalog can be rebuilt.
    fn drop_schema(&self) -> Result<()>;

    /// Inserts a single record outside of any bulk load.
    ///
    /// A duplicate name fails with
    /// [`PopDbError::Constraint`](crate::PopDbError::Constraint).
    fn insert(&self, record: &PlaceRecord) -> Result<()>;

    /// Writes every record from `records` inside one transaction.
    ///
    /// Per-record insert failures (duplicate names included) are counted and
    /// skipped. An `Err` item coming out of `records` aborts the load and
    /// rolls back; nothing is visible to readers until the final commit.
    fn bulk_load(&self, records: &mut dyn Iterator<Item = Result<PlaceRecord>>)
        -> Result<LoadOutcome>;

    /// Coordinates of the place called exactly `name`.
    fn lookup_by_name(&self, name: &str) -> Result<Coordinates>;

    /// Feeds the population of every place inside the closed box to `visit`,
    /// one row at a time, as the store reads it.
    ///
    /// Boxes crossing the antimeridian are handled by the implementation.
    /// Calling it again re-runs the scan from the start.
    fn scan_range(&self, bbox: &BoundingBox, visit: &mut dyn FnMut(u64)) -> Result<()>;

    /// Aggregate of [`scan_range`](Catalog::scan_range) over the box.
    ///
    /// Folds as rows arrive, so memory use does not grow with the number of
    /// matches.
    fn range_query(&self, bbox: &BoundingBox) -> Result<PopulationScan> {
        let mut scan = PopulationScan::default();
        self.scan_range(bbox, &mut |population| scan.push(population))?;
        Ok(scan)
    }

    fn stats(&self) -> Result<CatalogStats>;
}

/// What a bulk load did with the records it was handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub loaded: u64,
    /// Rejected because a place with the same name was already stored.
    pub duplicates: u64,
    /// Rejected by the storage engine for any other reason.
    pub failed: u64,
}

/// Running aggregate of a range scan: how many places matched and their
/// summed population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationScan {
    matched: usize,
    total: u64,
}

impl PopulationScan {
    pub fn push(&mut self, population: u64) {
        self.matched += 1;
        self.total = self.total.saturating_add(population);
    }

    /// Number of matching places.
    pub fn len(&self) -> usize {
        self.matched
    }

    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }

    /// Sum of all populations; 0 for an empty scan.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl FromIterator<u64> for PopulationScan {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        let mut scan = Self::default();
        scan.extend(iter);
        scan
    }
}

impl Extend<u64> for PopulationScan {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        for population in iter {
            self.push(population);
        }
    }
}
