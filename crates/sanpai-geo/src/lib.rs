//! Great-circle distance and geofence validation for shrine prayers.
//!
//! This crate is pure math over [`Position`](sanpai_types::Position): no
//! I/O, no clocks, no store access. The prayer flow asks one question of
//! it -- "is this claimed position within the allowed radius of this
//! shrine?" -- and everything else (what the radius is, what to do on a
//! miss) belongs to the caller.
//!
//! # Modules
//!
//! - [`distance`] -- Haversine distance on a spherical Earth
//! - [`geofence`] -- Radius validation returning distance + verdict
//! - [`error`] -- Error types for invalid coordinates and radii

pub mod distance;
pub mod error;
pub mod geofence;

// Re-export primary items at crate root.
pub use distance::{EARTH_RADIUS_METERS, haversine_meters, is_valid_position};
pub use error::GeoError;
pub use geofence::{GeofenceCheck, validate};
