//! Haversine great-circle distance between WGS84 coordinates.
//!
//! The haversine formulation is numerically stable for the short distances
//! this service cares about (a pray radius of tens to hundreds of meters)
//! and avoids the antipodal instability of the spherical law of cosines.
//! No geodesic (ellipsoidal) correction is applied.

use sanpai_types::Position;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two positions.
///
/// Inputs are degrees; the result is meters on a sphere of
/// [`EARTH_RADIUS_METERS`].
pub fn haversine_meters(a: Position, b: Position) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();

    let h = half_lat * half_lat + lat_a.cos() * lat_b.cos() * half_lng * half_lng;
    // h is in [0, 1] by construction; clamp guards rounding at antipodes.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Whether a coordinate pair lies inside the WGS84 domain.
pub fn is_valid_position(pos: Position) -> bool {
    pos.lat.is_finite()
        && pos.lng.is_finite()
        && (-90.0..=90.0).contains(&pos.lat)
        && (-180.0..=180.0).contains(&pos.lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree of latitude on the sphere used here:
    /// pi * R / 180 = 111_194.926...
    const METERS_PER_DEG_LAT: f64 = core::f64::consts::PI * EARTH_RADIUS_METERS / 180.0;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Position::new(35.6586, 139.7454);
        let d = haversine_meters(p, p);
        assert!(d.abs() < 1e-9, "expected 0, got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Position::new(35.0, 139.0);
        let b = Position::new(36.0, 139.0);
        let d = haversine_meters(a, b);
        // Pure meridian arc: exactly pi*R/180 on a sphere.
        assert!(
            (d - METERS_PER_DEG_LAT).abs() < 0.01,
            "expected {METERS_PER_DEG_LAT}, got {d}"
        );
    }

    #[test]
    fn tokyo_tower_to_skytree() {
        // Tokyo Tower (35.6586, 139.7454) to Tokyo Skytree (35.7101, 139.8107):
        // roughly 8.2 km.
        let tower = Position::new(35.6586, 139.7454);
        let skytree = Position::new(35.7101, 139.8107);
        let d = haversine_meters(tower, skytree);
        assert!((8_000.0..8_500.0).contains(&d), "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = Position::new(34.9671, 135.7727); // Fushimi Inari
        let b = Position::new(34.9949, 135.7850); // Yasaka
        let ab = haversine_meters(a, b);
        let ba = haversine_meters(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn valid_position_domain() {
        assert!(is_valid_position(Position::new(90.0, 180.0)));
        assert!(is_valid_position(Position::new(-90.0, -180.0)));
        assert!(!is_valid_position(Position::new(90.1, 0.0)));
        assert!(!is_valid_position(Position::new(0.0, 180.5)));
        assert!(!is_valid_position(Position::new(f64::NAN, 0.0)));
        assert!(!is_valid_position(Position::new(0.0, f64::INFINITY)));
    }
}
