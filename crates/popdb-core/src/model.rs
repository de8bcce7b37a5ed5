// crates/popdb-core/src/model.rs
use serde::{Deserialize, Serialize};

/// A populated place as stored in the catalog.
///
/// `name` is the catalog's primary key. Records are only ever created by the
/// loader and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceRecord {
    pub fn new(name: impl Into<String>, population: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            population,
            latitude,
            longitude,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A point in decimal degrees (WGS84).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
