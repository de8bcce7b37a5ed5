// crates/popdb-core/src/lib.rs
//! popdb-core
//! ==========
//!
//! Loads a GeoNames-style gazetteer dump into an indexed place catalog and
//! estimates the population living within a radius of a named place.
//!
//! ```
//! use popdb_core::prelude::*;
//!
//! let catalog = MemoryCatalog::with_records([
//!     PlaceRecord::new("A", 100, 0.0, 0.0),
//!     PlaceRecord::new("B", 50, 0.01, 0.0),
//! ])?;
//!
//! assert_eq!(catalog.population_within("A", 2.0)?, 150);
//! assert_eq!(catalog.population_within("A", 0.5)?, 100);
//! # Ok::<(), PopDbError>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bbox;
pub mod common;
pub mod error;
pub mod loader;
pub mod model;
pub mod prelude;
pub mod search;
pub mod store;
pub mod traits;
// Dump row layout (column contract)
#[doc(hidden)]
pub mod raw;

// Re-exports
pub use crate::common::CatalogStats;
pub use crate::error::{PopDbError, Result, RowError, RowErrorKind};
pub use crate::model::{Coordinates, PlaceRecord};
pub use crate::search::{Estimate, PopulationSearch, RadiusQuery};
pub use crate::store::{MemoryCatalog, SqliteCatalog};
pub use crate::traits::{Catalog, LoadOutcome, PopulationScan};
