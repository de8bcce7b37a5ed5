//! popdb-rs
//!
//! Workspace umbrella crate: re-exports [`popdb_core`] so the demos can use a
//! single import path.
pub use popdb_core::*;
