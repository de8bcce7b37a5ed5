// crates/popdb-core/src/store/mod.rs

//! # Catalog Stores
//!
//! Concrete [`Catalog`](crate::traits::Catalog) implementations: the durable
//! SQLite catalog used in production and an in-memory one with the same
//! contract.

mod memory;
mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;
