// crates/popdb-core/src/store/sqlite.rs
use crate::bbox::BoundingBox;
use crate::common::CatalogStats;
use crate::error::{PopDbError, Result};
use crate::model::{Coordinates, PlaceRecord};
use crate::traits::{Catalog, LoadOutcome};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Statement, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

// -----------------------------------------------------------------------------
// SQL
// -----------------------------------------------------------------------------

const CREATE_TABLE_SQL: &str = "CREATE TABLE places (
    name TEXT NOT NULL PRIMARY KEY,
    population INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
)";

// Speeds up the bounding-box scan.
const CREATE_INDEX_SQL: &str = "CREATE INDEX places_lat_lon_idx ON places (latitude, longitude)";

const DROP_SQL: &str = "DROP INDEX IF EXISTS places_lat_lon_idx; DROP TABLE IF EXISTS places;";

const INSERT_SQL: &str =
    "INSERT INTO places (name, population, latitude, longitude) VALUES (?1, ?2, ?3, ?4)";

const LOOKUP_SQL: &str = "SELECT latitude, longitude FROM places WHERE name = ?1";

const RANGE_SQL: &str = "SELECT population FROM places
    WHERE latitude BETWEEN ?1 AND ?2
    AND longitude BETWEEN ?3 AND ?4";

const STATS_SQL: &str = "SELECT COUNT(*), COALESCE(SUM(population), 0) FROM places";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// -----------------------------------------------------------------------------
// CATALOG
// -----------------------------------------------------------------------------

/// SQLite-backed catalog.
///
/// One connection behind a mutex: readers and the loader take turns. File
/// databases run in WAL mode so an external reader never blocks the loader.
#[derive(Debug)]
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Opens (or creates) a catalog file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            PopDbError::Storage(format!("cannot open catalog {}: {e}", path.display()))
        })?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(storage)?;
        Self::from_connection(conn)
    }

    /// A private, throwaway catalog. Handy for tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// How long to wait for another connection's lock before giving up.
    /// Defaults to five seconds.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn()?.busy_timeout(timeout).map_err(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PopDbError::Storage("catalog connection mutex poisoned".into()))
    }
}

impl Catalog for SqliteCatalog {
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        for sql in [CREATE_TABLE_SQL, CREATE_INDEX_SQL] {
            conn.execute(sql, [])
                .map_err(|e| PopDbError::Schema(format!("{e}: {sql}")))?;
        }
        Ok(())
    }

    fn drop_schema(&self) -> Result<()> {
        self.conn()?
            .execute_batch(DROP_SQL)
            .map_err(|e| PopDbError::Schema(e.to_string()))
    }

    fn insert(&self, record: &PlaceRecord) -> Result<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(INSERT_SQL).map_err(storage)?;
        insert_with(&mut stmt, record)
    }

    fn bulk_load(
        &self,
        records: &mut dyn Iterator<Item = Result<PlaceRecord>>,
    ) -> Result<LoadOutcome> {
        let mut conn = self.conn()?;
        // Take the write lock up front so a concurrent writer fails the load
        // here instead of failing every insert.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| PopDbError::Transaction(format!("cannot begin load: {e}")))?;

        let mut outcome = LoadOutcome::default();
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL).map_err(storage)?;
            for record in records {
                // A source failure drops `tx`, which rolls everything back.
                let record = record?;
                match insert_with(&mut stmt, &record) {
                    Ok(()) => outcome.loaded += 1,
                    Err(PopDbError::Constraint(name)) => {
                        debug!(place = %name, "duplicate place name, keeping the first one");
                        outcome.duplicates += 1;
                    }
                    Err(e) => {
                        warn!(place = %record.name, error = %e, "cannot insert place");
                        outcome.failed += 1;
                    }
                }
            }
        }

        tx.commit()
            .map_err(|e| PopDbError::Transaction(format!("cannot commit load: {e}")))?;
        Ok(outcome)
    }

    fn lookup_by_name(&self, name: &str) -> Result<Coordinates> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(LOOKUP_SQL).map_err(storage)?;
        stmt.query_row([name], |row| {
            Ok(Coordinates::new(row.get(0)?, row.get(1)?))
        })
        .optional()
        .map_err(storage)?
        .ok_or_else(|| PopDbError::NotFound(name.to_owned()))
    }

    fn scan_range(&self, bbox: &BoundingBox, visit: &mut dyn FnMut(u64)) -> Result<()> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(RANGE_SQL)
            .map_err(|e| PopDbError::Storage(format!("cannot prepare query: {e}")))?;

        for seg in bbox.segments() {
            let mut rows = stmt
                .query(params![seg.lat_min, seg.lat_max, seg.lon_min, seg.lon_max])
                .map_err(storage)?;
            while let Some(row) = rows.next().map_err(storage)? {
                visit(to_population(row.get(0).map_err(storage)?)?);
            }
        }
        Ok(())
    }

    fn stats(&self) -> Result<CatalogStats> {
        let conn = self.conn()?;
        let (places, total) = conn
            .query_row(STATS_SQL, [], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(storage)?;
        Ok(CatalogStats {
            places: to_population(places)?,
            total_population: to_population(total)?,
        })
    }
}

// -----------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------

fn insert_with(stmt: &mut Statement<'_>, record: &PlaceRecord) -> Result<()> {
    let population = i64::try_from(record.population).map_err(|_| {
        PopDbError::Storage(format!(
            "population {} of {:?} does not fit the catalog",
            record.population, record.name
        ))
    })?;
    stmt.execute(params![
        record.name,
        population,
        record.latitude,
        record.longitude
    ])
    .map(|_| ())
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            PopDbError::Constraint(record.name.clone())
        }
        other => PopDbError::Storage(other.to_string()),
    })
}

fn to_population(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| PopDbError::Storage(format!("negative value in catalog: {value}")))
}

fn storage(e: rusqlite::Error) -> PopDbError {
    PopDbError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SqliteCatalog {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.create_schema().unwrap();
        catalog
    }

    #[test]
    fn create_schema_twice_is_a_schema_error() {
        let catalog = catalog();
        assert!(matches!(catalog.create_schema(), Err(PopDbError::Schema(_))));
    }

    #[test]
    fn drop_schema_allows_rebuild() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 1, 0.0, 0.0)).unwrap();
        catalog.drop_schema().unwrap();
        catalog.create_schema().unwrap();
        assert_eq!(catalog.stats().unwrap(), CatalogStats::default());
    }

    #[test]
    fn insert_then_lookup() {
        let catalog = catalog();
        catalog
            .insert(&PlaceRecord::new("Zürich", 341_730, 47.36667, 8.55))
            .unwrap();
        assert_eq!(
            catalog.lookup_by_name("Zürich").unwrap(),
            Coordinates::new(47.36667, 8.55)
        );
    }

    #[test]
    fn duplicate_insert_is_a_constraint_error() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 1, 0.0, 0.0)).unwrap();
        let err = catalog.insert(&PlaceRecord::new("A", 2, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, PopDbError::Constraint(name) if name == "A"));
    }

    #[test]
    fn unknown_place_is_not_found() {
        let catalog = catalog();
        assert!(matches!(
            catalog.lookup_by_name("Atlantis"),
            Err(PopDbError::NotFound(name)) if name == "Atlantis"
        ));
    }

    #[test]
    fn missing_table_is_a_storage_error() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        assert!(matches!(
            catalog.range_query(&BoundingBox::new(0.0, 1.0, 0.0, 1.0)),
            Err(PopDbError::Storage(_))
        ));
    }

    #[test]
    fn bulk_load_keeps_first_duplicate() {
        let catalog = catalog();
        let mut records = vec![
            Ok(PlaceRecord::new("A", 100, 0.0, 0.0)),
            Ok(PlaceRecord::new("A", 999, 5.0, 5.0)),
            Ok(PlaceRecord::new("B", 50, 0.01, 0.0)),
        ]
        .into_iter();
        let outcome = catalog.bulk_load(&mut records).unwrap();
        assert_eq!(
            outcome,
            LoadOutcome {
                loaded: 2,
                duplicates: 1,
                failed: 0
            }
        );
        assert_eq!(
            catalog.lookup_by_name("A").unwrap(),
            Coordinates::new(0.0, 0.0)
        );
    }

    #[test]
    fn bulk_load_rolls_back_on_source_failure() {
        let catalog = catalog();
        let mut records = vec![
            Ok(PlaceRecord::new("A", 100, 0.0, 0.0)),
            Err(PopDbError::SourceUnavailable("truncated".into())),
            Ok(PlaceRecord::new("B", 50, 0.01, 0.0)),
        ]
        .into_iter();
        assert!(matches!(
            catalog.bulk_load(&mut records),
            Err(PopDbError::SourceUnavailable(_))
        ));
        assert_eq!(catalog.stats().unwrap().places, 0);
    }

    #[test]
    fn range_query_is_closed_and_repeatable() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 100, 0.0, 0.0)).unwrap();
        catalog.insert(&PlaceRecord::new("B", 50, 1.0, 1.0)).unwrap();
        catalog.insert(&PlaceRecord::new("C", 7, 2.0, 2.0)).unwrap();

        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let first = catalog.range_query(&bbox).unwrap();
        let second = catalog.range_query(&bbox).unwrap();
        assert_eq!(first.total(), 150);
        assert_eq!(first.total(), second.total());
    }

    #[test]
    fn range_query_spans_the_antimeridian() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("East", 10, 0.0, 179.5)).unwrap();
        catalog.insert(&PlaceRecord::new("West", 20, 0.0, -179.5)).unwrap();
        catalog.insert(&PlaceRecord::new("Null Island", 1, 0.0, 0.0)).unwrap();

        let scan = catalog
            .range_query(&BoundingBox::new(-1.0, 1.0, 179.0, -179.0))
            .unwrap();
        assert_eq!(scan.len(), 2);
        assert_eq!(scan.total(), 30);
    }

    #[test]
    fn empty_box_totals_zero() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 100, 0.0, 0.0)).unwrap();
        let scan = catalog
            .range_query(&BoundingBox::new(10.0, 11.0, 10.0, 11.0))
            .unwrap();
        assert!(scan.is_empty());
        assert_eq!(scan.total(), 0);
    }

    #[test]
    fn stats_counts_places_and_population() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 100, 0.0, 0.0)).unwrap();
        catalog.insert(&PlaceRecord::new("B", 50, 0.01, 0.0)).unwrap();
        assert_eq!(
            catalog.stats().unwrap(),
            CatalogStats {
                places: 2,
                total_population: 150
            }
        );
    }

    #[test]
    fn scan_range_streams_each_match_once() {
        let catalog = catalog();
        catalog.insert(&PlaceRecord::new("A", 100, 0.0, 0.0)).unwrap();
        catalog.insert(&PlaceRecord::new("B", 50, 1.0, 1.0)).unwrap();
        catalog.insert(&PlaceRecord::new("C", 7, 2.0, 2.0)).unwrap();

        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        for _ in 0..2 {
            let mut seen = Vec::new();
            catalog.scan_range(&bbox, &mut |p| seen.push(p)).unwrap();
            seen.sort_unstable();
            assert_eq!(seen, vec![50, 100]);
        }
    }

    #[test]
    fn wide_scan_aggregates_every_row() {
        let catalog = catalog();
        let mut records = (0..5_000u64)
            .map(|i| {
                let lat = (i / 100) as f64 * 0.01;
                let lon = (i % 100) as f64 * 0.01;
                Ok(PlaceRecord::new(format!("p{i}"), i, lat, lon))
            })
            .collect::<Vec<_>>()
            .into_iter();
        catalog.bulk_load(&mut records).unwrap();

        let scan = catalog
            .range_query(&BoundingBox::new(-90.0, 90.0, -180.0, 180.0))
            .unwrap();
        assert_eq!(scan.len(), 5_000);
        assert_eq!(scan.total(), (0..5_000u64).sum::<u64>());
    }

    #[test]
    fn locked_catalog_fails_the_load_as_a_transaction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        let catalog = SqliteCatalog::open(&path).unwrap();
        catalog.create_schema().unwrap();
        catalog.set_busy_timeout(Duration::from_millis(50)).unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let mut records = vec![Ok(PlaceRecord::new("A", 1, 0.0, 0.0))].into_iter();
        assert!(matches!(
            catalog.bulk_load(&mut records),
            Err(PopDbError::Transaction(msg)) if msg.starts_with("cannot begin load")
        ));

        other.execute_batch("ROLLBACK").unwrap();
        assert_eq!(catalog.stats().unwrap().places, 0);
    }
}
