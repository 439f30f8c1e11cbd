//! Geofence validation for physical prayers.
//!
//! A physical prayer is legitimate when the caller's claimed position lies
//! within the user's allowed pray radius of the shrine. The check is pure:
//! it neither reads nor writes any state, and the caller decides what to do
//! with a failed check.
//!
//! The caller must actually hold a position. An absent position is a
//! distinct input error surfaced upstream; it is never treated as in-range.

use sanpai_types::Position;

use crate::distance::{haversine_meters, is_valid_position};
use crate::error::GeoError;

/// Outcome of a geofence check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    /// Whether the claimed position is within the allowed radius.
    pub ok: bool,
    /// Computed great-circle distance in meters.
    pub distance_meters: f64,
}

/// Validate a claimed position against a shrine position and radius.
///
/// `ok` is `distance <= allowed_radius_meters`; the boundary itself is
/// in range.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] if either position is outside
/// the WGS84 domain or non-finite, and [`GeoError::InvalidRadius`] for a
/// negative or non-finite radius.
pub fn validate(
    user_pos: Position,
    shrine_pos: Position,
    allowed_radius_meters: f64,
) -> Result<GeofenceCheck, GeoError> {
    for pos in [user_pos, shrine_pos] {
        if !is_valid_position(pos) {
            return Err(GeoError::InvalidCoordinate {
                lat: pos.lat,
                lng: pos.lng,
            });
        }
    }
    if !allowed_radius_meters.is_finite() || allowed_radius_meters < 0.0 {
        return Err(GeoError::InvalidRadius {
            radius_meters: allowed_radius_meters,
        });
    }

    let distance_meters = haversine_meters(user_pos, shrine_pos);
    Ok(GeofenceCheck {
        ok: distance_meters <= allowed_radius_meters,
        distance_meters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::EARTH_RADIUS_METERS;

    /// Build a point `meters` due north of `base` (meridian arc).
    fn north_of(base: Position, meters: f64) -> Position {
        let deg = meters * 180.0 / (core::f64::consts::PI * EARTH_RADIUS_METERS);
        Position::new(base.lat + deg, base.lng)
    }

    const SHRINE: Position = Position::new(35.0262, 135.7983); // Heian Jingu

    #[test]
    fn just_inside_radius_passes() {
        let user = north_of(SHRINE, 99.0);
        let check = validate(user, SHRINE, 100.0).unwrap_or(GeofenceCheck {
            ok: false,
            distance_meters: f64::MAX,
        });
        assert!(check.ok, "distance {} should pass", check.distance_meters);
        assert!((check.distance_meters - 99.0).abs() < 0.1);
    }

    #[test]
    fn exactly_at_radius_passes() {
        // d == r: compute the distance first, then use it as the radius so
        // the comparison sees the identical float.
        let user = north_of(SHRINE, 100.0);
        let d = haversine_meters(user, SHRINE);
        let check = validate(user, SHRINE, d).unwrap_or(GeofenceCheck {
            ok: false,
            distance_meters: f64::MAX,
        });
        assert!(check.ok, "boundary must be in range");
    }

    #[test]
    fn just_outside_radius_fails() {
        let user = north_of(SHRINE, 101.0);
        let check = validate(user, SHRINE, 100.0).unwrap_or(GeofenceCheck {
            ok: true,
            distance_meters: 0.0,
        });
        assert!(!check.ok, "distance {} should fail", check.distance_meters);
        assert!(check.distance_meters > 100.0);
    }

    #[test]
    fn zero_radius_same_point_passes() {
        let check = validate(SHRINE, SHRINE, 0.0).unwrap_or(GeofenceCheck {
            ok: false,
            distance_meters: f64::MAX,
        });
        assert!(check.ok);
    }

    #[test]
    fn invalid_latitude_rejected() {
        let bad = Position::new(123.0, 135.0);
        assert!(matches!(
            validate(bad, SHRINE, 100.0),
            Err(GeoError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn negative_radius_rejected() {
        assert!(matches!(
            validate(SHRINE, SHRINE, -1.0),
            Err(GeoError::InvalidRadius { .. })
        ));
    }
}
