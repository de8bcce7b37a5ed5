//! Convenience re-exports for the common workflow: open a catalog, load a
//! dump, ask for a radius estimate.
pub use crate::bbox::BoundingBox;
pub use crate::common::CatalogStats;
pub use crate::error::{PopDbError, Result};
pub use crate::loader::{ingest_path, ingest_reader, IngestReport};
pub use crate::model::{Coordinates, PlaceRecord};
pub use crate::search::{Estimate, PopulationSearch, RadiusQuery};
pub use crate::store::{MemoryCatalog, SqliteCatalog};
pub use crate::traits::Catalog;
