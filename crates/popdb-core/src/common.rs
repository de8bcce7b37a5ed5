use serde::{Deserialize, Serialize};

/// Simple aggregate statistics for the catalog.
///
/// Returned by [`Catalog::stats`](crate::traits::Catalog::stats); the counts
/// reflect whatever the last committed load left in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub places: u64,
    pub total_population: u64,
}

/// Mean degrees-to-kilometers factor used by the planar approximation.
///
/// One degree of latitude is roughly 111.1 km everywhere; one degree of
/// longitude is `111.1 * cos(latitude)` km.
pub const KM_PER_DEGREE: f64 = 111.1;
