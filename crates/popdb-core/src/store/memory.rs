// crates/popdb-core/src/store/memory.rs
use crate::bbox::BoundingBox;
use crate::common::CatalogStats;
use crate::error::{PopDbError, Result};
use crate::model::{Coordinates, PlaceRecord};
use crate::traits::{Catalog, LoadOutcome};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Table = BTreeMap<String, PlaceRecord>;

/// In-process catalog with the same contract as the SQLite one.
///
/// Range scans are linear, so this is meant for tests and small embedded
/// datasets. Bulk loads stage into a copy and swap it in on commit.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    // `None` until `create_schema` runs.
    table: RwLock<Option<Table>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with its schema created and `records` inserted.
    pub fn with_records(records: impl IntoIterator<Item = PlaceRecord>) -> Result<Self> {
        let catalog = Self::new();
        catalog.create_schema()?;
        for record in records {
            catalog.insert(&record)?;
        }
        Ok(catalog)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<Table>>> {
        self.table
            .read()
            .map_err(|_| PopDbError::Storage("memory catalog lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<Table>>> {
        self.table
            .write()
            .map_err(|_| PopDbError::Storage("memory catalog lock poisoned".into()))
    }
}

fn no_table() -> PopDbError {
    PopDbError::Storage("no such table: places".into())
}

fn insert_into(table: &mut Table, record: &PlaceRecord) -> Result<()> {
    if table.contains_key(&record.name) {
        return Err(PopDbError::Constraint(record.name.clone()));
    }
    table.insert(record.name.clone(), record.clone());
    Ok(())
}

impl Catalog for MemoryCatalog {
    fn create_schema(&self) -> Result<()> {
        let mut guard = self.write()?;
        if guard.is_some() {
            return Err(PopDbError::Schema("table places already exists".into()));
        }
        *guard = Some(Table::new());
        Ok(())
    }

    fn drop_schema(&self) -> Result<()> {
        *self.write()? = None;
        Ok(())
    }

    fn insert(&self, record: &PlaceRecord) -> Result<()> {
        let mut guard = self.write()?;
        let table = guard.as_mut().ok_or_else(no_table)?;
        insert_into(table, record)
    }

    fn bulk_load(
        &self,
        records: &mut dyn Iterator<Item = Result<PlaceRecord>>,
    ) -> Result<LoadOutcome> {
        let mut guard = self
            .table
            .write()
            .map_err(|_| PopDbError::Transaction("memory catalog lock poisoned".into()))?;
        let mut staged = guard.as_ref().ok_or_else(no_table)?.clone();

        let mut outcome = LoadOutcome::default();
        for record in records {
            match insert_into(&mut staged, &record?) {
                Ok(()) => outcome.loaded += 1,
                Err(PopDbError::Constraint(name)) => {
                    debug!(place = %name, "duplicate place name, keeping the first one");
                    outcome.duplicates += 1;
                }
                Err(e) => return Err(e),
            }
        }

        *guard = Some(staged);
        Ok(outcome)
    }

    fn lookup_by_name(&self, name: &str) -> Result<Coordinates> {
        let guard = self.read()?;
        guard
            .as_ref()
            .ok_or_else(no_table)?
            .get(name)
            .map(PlaceRecord::coordinates)
            .ok_or_else(|| PopDbError::NotFound(name.to_owned()))
    }

    fn scan_range(&self, bbox: &BoundingBox, visit: &mut dyn FnMut(u64)) -> Result<()> {
        let guard = self.read()?;
        guard
            .as_ref()
            .ok_or_else(no_table)?
            .values()
            .filter(|r| bbox.contains(r.coordinates()))
            .for_each(|r| visit(r.population));
        Ok(())
    }

    fn stats(&self) -> Result<CatalogStats> {
        let guard = self.read()?;
        let table = guard.as_ref().ok_or_else(no_table)?;
        Ok(CatalogStats {
            places: table.len() as u64,
            total_population: table
                .values()
                .fold(0u64, |acc, r| acc.saturating_add(r.population)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaves_like_the_sqlite_catalog() {
        let catalog = MemoryCatalog::new();
        assert!(matches!(
            catalog.lookup_by_name("A"),
            Err(PopDbError::Storage(_))
        ));

        catalog.create_schema().unwrap();
        assert!(matches!(catalog.create_schema(), Err(PopDbError::Schema(_))));

        catalog.insert(&PlaceRecord::new("A", 100, 0.0, 0.0)).unwrap();
        assert!(matches!(
            catalog.insert(&PlaceRecord::new("A", 1, 0.0, 0.0)),
            Err(PopDbError::Constraint(_))
        ));
        assert!(matches!(
            catalog.lookup_by_name("B"),
            Err(PopDbError::NotFound(_))
        ));
    }

    #[test]
    fn failed_bulk_load_leaves_catalog_untouched() {
        let catalog = MemoryCatalog::with_records([PlaceRecord::new("A", 100, 0.0, 0.0)]).unwrap();
        let mut records = vec![
            Ok(PlaceRecord::new("B", 50, 0.01, 0.0)),
            Err(PopDbError::SourceUnavailable("gone".into())),
        ]
        .into_iter();
        assert!(catalog.bulk_load(&mut records).is_err());
        assert_eq!(catalog.stats().unwrap().places, 1);
    }

    #[test]
    fn range_query_matches_closed_box() {
        let catalog = MemoryCatalog::with_records([
            PlaceRecord::new("A", 100, 0.0, 0.0),
            PlaceRecord::new("B", 50, 1.0, 1.0),
            PlaceRecord::new("C", 7, 1.5, 0.0),
        ])
        .unwrap();
        let scan = catalog
            .range_query(&BoundingBox::new(0.0, 1.0, 0.0, 1.0))
            .unwrap();
        assert_eq!(scan.total(), 150);
        assert_eq!(scan.len(), 2);

        let mut visited = 0;
        catalog
            .scan_range(&BoundingBox::new(0.0, 1.0, 0.0, 1.0), &mut |_| visited += 1)
            .unwrap();
        assert_eq!(visited, 2);
    }
}
