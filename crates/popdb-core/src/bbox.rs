// crates/popdb-core/src/bbox.rs
//! Radius → bounding box conversion.
//!
//! This is the planar small-angle approximation: a degree of latitude is
//! [`KM_PER_DEGREE`] km, a degree of longitude is `KM_PER_DEGREE * cos(lat)`
//! km, with `lat` converted to radians before taking the cosine. It is only
//! accurate near the center latitude and is not a great-circle distance.

use crate::common::KM_PER_DEGREE;
use crate::model::Coordinates;
use serde::{Deserialize, Serialize};

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Below this `|cos(lat)|` the center is treated as a pole and the box spans
/// every longitude.
const POLE_COS_EPSILON: f64 = 1e-12;

/// A closed latitude/longitude rectangle in decimal degrees.
///
/// Latitudes always satisfy `lat_min <= lat_max`. When `lon_min > lon_max`
/// the box crosses the antimeridian (same convention as GeoJSON `bbox`), and
/// [`BoundingBox::segments`] splits it into two plain boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// The box enclosing every point within `radius_km` of `center`.
    ///
    /// Latitudes are clamped to `[-90, 90]`. When the box reaches a pole, or
    /// the longitude delta would be half the globe or more, it spans all
    /// longitudes instead of diverging.
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let lat_delta = latitude_delta(radius_km);
        let lat_min = center.latitude - lat_delta;
        let lat_max = center.latitude + lat_delta;
        let reaches_pole = lat_min <= -MAX_LATITUDE || lat_max >= MAX_LATITUDE;

        let lon_delta = longitude_delta(center.latitude, radius_km);
        let (lon_min, lon_max) = if reaches_pole || lon_delta >= MAX_LONGITUDE {
            (-MAX_LONGITUDE, MAX_LONGITUDE)
        } else {
            (
                wrap_longitude(center.longitude - lon_delta),
                wrap_longitude(center.longitude + lon_delta),
            )
        };

        Self {
            lat_min: lat_min.max(-MAX_LATITUDE),
            lat_max: lat_max.min(MAX_LATITUDE),
            lon_min,
            lon_max,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    /// One or two non-wrapping boxes covering exactly this box.
    pub fn segments(&self) -> impl Iterator<Item = BoundingBox> {
        let (first, second) = if self.crosses_antimeridian() {
            (
                BoundingBox::new(self.lat_min, self.lat_max, self.lon_min, MAX_LONGITUDE),
                Some(BoundingBox::new(
                    self.lat_min,
                    self.lat_max,
                    -MAX_LONGITUDE,
                    self.lon_max,
                )),
            )
        } else {
            (*self, None)
        };
        std::iter::once(first).chain(second)
    }

    /// Closed containment test, antimeridian-aware.
    pub fn contains(&self, point: Coordinates) -> bool {
        self.segments().any(|seg| {
            (seg.lat_min..=seg.lat_max).contains(&point.latitude)
                && (seg.lon_min..=seg.lon_max).contains(&point.longitude)
        })
    }
}

/// Degrees of latitude covered by `radius_km`.
pub fn latitude_delta(radius_km: f64) -> f64 {
    radius_km / KM_PER_DEGREE
}

/// Degrees of longitude covered by `radius_km` at `latitude` (degrees).
///
/// Capped at 180; a zero radius is always a zero delta, even at a pole.
pub fn longitude_delta(latitude: f64, radius_km: f64) -> f64 {
    if radius_km == 0.0 {
        return 0.0;
    }
    let cos = latitude.to_radians().cos().abs();
    if cos < POLE_COS_EPSILON {
        return MAX_LONGITUDE;
    }
    let delta = radius_km / (KM_PER_DEGREE * cos);
    if delta.is_finite() {
        delta.min(MAX_LONGITUDE)
    } else {
        MAX_LONGITUDE
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon < -MAX_LONGITUDE {
        lon + 360.0
    } else if lon > MAX_LONGITUDE {
        lon - 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn equator_box_is_square_in_degrees() {
        let bbox = BoundingBox::around(Coordinates::new(0.0, 0.0), 111.1);
        assert_close(bbox.lat_min, -1.0);
        assert_close(bbox.lat_max, 1.0);
        assert_close(bbox.lon_min, -1.0);
        assert_close(bbox.lon_max, 1.0);
    }

    #[test]
    fn cosine_uses_radians() {
        // At 60°N a degree of longitude is half as long as at the equator.
        let delta = longitude_delta(60.0, 111.1);
        assert_close(delta, 2.0);
    }

    #[test]
    fn zero_radius_collapses_to_the_center() {
        let center = Coordinates::new(48.85341, 2.3488);
        let bbox = BoundingBox::around(center, 0.0);
        assert_eq!(bbox, BoundingBox::new(48.85341, 48.85341, 2.3488, 2.3488));
        assert!(bbox.contains(center));
    }

    #[test]
    fn pole_does_not_blow_up() {
        for lat in [90.0, -90.0, 89.999_999_999] {
            let bbox = BoundingBox::around(Coordinates::new(lat, 10.0), 5.0);
            for v in [bbox.lat_min, bbox.lat_max, bbox.lon_min, bbox.lon_max] {
                assert!(v.is_finite(), "non-finite bound at lat {lat}: {bbox:?}");
            }
            assert_eq!((bbox.lon_min, bbox.lon_max), (-180.0, 180.0));
            assert!(bbox.lat_min >= -90.0 && bbox.lat_max <= 90.0);
        }
    }

    #[test]
    fn longitude_delta_is_capped() {
        assert_eq!(longitude_delta(90.0, 1.0), 180.0);
        assert_eq!(longitude_delta(0.0, 1e9), 180.0);
        assert_eq!(longitude_delta(90.0, 0.0), 0.0);
    }

    #[test]
    fn box_across_antimeridian_splits_in_two() {
        let bbox = BoundingBox::around(Coordinates::new(0.0, 179.9), 111.1);
        assert!(bbox.crosses_antimeridian());
        let segments: Vec<_> = bbox.segments().collect();
        assert_eq!(segments.len(), 2);
        assert_close(segments[0].lon_min, 178.9);
        assert_eq!(segments[0].lon_max, 180.0);
        assert_eq!(segments[1].lon_min, -180.0);
        assert_close(segments[1].lon_max, -179.1);

        assert!(bbox.contains(Coordinates::new(0.0, -179.5)));
        assert!(bbox.contains(Coordinates::new(0.0, 179.5)));
        assert!(!bbox.contains(Coordinates::new(0.0, 0.0)));
    }

    #[test]
    fn plain_box_has_one_segment() {
        let bbox = BoundingBox::new(-1.0, 1.0, -1.0, 1.0);
        assert_eq!(bbox.segments().collect::<Vec<_>>(), vec![bbox]);
    }
}
