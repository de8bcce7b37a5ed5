// crates/popdb-core/src/search.rs
//! The radius query engine.
//!
//! A query goes `parse → resolve center → bounding box → range scan →
//! aggregate` and stops at the first error. It only ever reads the catalog.

use crate::bbox::BoundingBox;
use crate::error::{PopDbError, Result};
use crate::model::Coordinates;
use crate::traits::Catalog;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A validated "population within `radius_km` of `place`" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    pub place: String,
    pub radius_km: f64,
}

impl RadiusQuery {
    /// Builds a query from already-typed values.
    pub fn new(place: impl Into<String>, radius_km: f64) -> Result<Self> {
        let place = place.into();
        if place.is_empty() {
            return Err(PopDbError::MissingParameter);
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(PopDbError::InvalidRadius(radius_km.to_string()));
        }
        Ok(Self { place, radius_km })
    }

    /// Builds a query from raw request parameters.
    ///
    /// Absent and empty parameters are both "missing"; the radius must parse
    /// as a finite, non-negative float.
    pub fn parse(place: Option<&str>, radius: Option<&str>) -> Result<Self> {
        let (place, radius) = match (place, radius) {
            (Some(p), Some(r)) if !p.is_empty() && !r.is_empty() => (p, r),
            _ => return Err(PopDbError::MissingParameter),
        };
        let radius_km = radius
            .parse::<f64>()
            .map_err(|_| PopDbError::InvalidRadius(radius.to_owned()))?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(PopDbError::InvalidRadius(radius.to_owned()));
        }
        Ok(Self {
            place: place.to_owned(),
            radius_km,
        })
    }
}

/// Answer to a [`RadiusQuery`], with the intermediate values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub place: String,
    pub radius_km: f64,
    pub center: Coordinates,
    pub bbox: BoundingBox,
    /// Sum of the populations inside `bbox`.
    pub population: u64,
    /// Number of places inside `bbox`.
    pub matched: usize,
}

/// Radius estimation on top of any [`Catalog`].
pub trait PopulationSearch {
    /// Runs a validated query.
    fn estimate(&self, query: &RadiusQuery) -> Result<Estimate>;

    /// Shorthand: total population within `radius_km` of `place`.
    fn population_within(&self, place: &str, radius_km: f64) -> Result<u64> {
        self.estimate(&RadiusQuery::new(place, radius_km)?)
            .map(|e| e.population)
    }
}

impl<C: Catalog + ?Sized> PopulationSearch for C {
    fn estimate(&self, query: &RadiusQuery) -> Result<Estimate> {
        let center = self.lookup_by_name(&query.place)?;
        let bbox = BoundingBox::around(center, query.radius_km);
        let scan = self.range_query(&bbox)?;
        let population = scan.total();

        info!(
            place = %query.place,
            radius_km = query.radius_km,
            matched = scan.len(),
            population,
            "population estimate"
        );

        Ok(Estimate {
            place: query.place.clone(),
            radius_km: query.radius_km,
            center,
            bbox,
            population,
            matched: scan.len(),
        })
    }
}
