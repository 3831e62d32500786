//! Planar helpers for the simulated coordinate space.
//!
//! The simulation works on raw decimal degrees over a small area, so
//! straight-line degree distance is enough; no great-circle math here.

use crate::models::GeoPoint;
use rand::Rng;

/// Straight-line distance between two points, in degrees.
pub fn planar_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat1 - lat2;
    let dlon = lon1 - lon2;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// A point offset from `base` by up to `spread_deg` per axis.
pub fn random_point_near(base: GeoPoint, spread_deg: f64) -> GeoPoint {
    let mut rng = rand::rng();
    GeoPoint {
        lat: base.lat + rng.random_range(-spread_deg..=spread_deg),
        lon: base.lon + rng.random_range(-spread_deg..=spread_deg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_is_euclidean_in_degrees() {
        let dist = planar_distance(55.0, 82.0, 55.0, 82.002);
        assert!((dist - 0.002).abs() < 1e-12);

        let diagonal = planar_distance(0.0, 0.0, 3.0, 4.0);
        assert!((diagonal - 5.0).abs() < 1e-12);
    }

    #[test]
    fn random_point_near_stays_within_spread() {
        let base = GeoPoint::new(55.03, 82.92);
        for _ in 0..100 {
            let p = random_point_near(base, 0.025);
            assert!((p.lat - base.lat).abs() <= 0.025);
            assert!((p.lon - base.lon).abs() <= 0.025);
        }
    }
}
