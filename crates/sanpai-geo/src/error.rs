//! Error types for the `sanpai-geo` crate.

/// Errors that can occur during geographic validation.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// A coordinate was not a finite number inside the WGS84 domain.
    #[error("invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate {
        /// The offending latitude.
        lat: f64,
        /// The offending longitude.
        lng: f64,
    },

    /// The allowed radius was negative or not finite.
    #[error("invalid radius: {radius_meters}")]
    InvalidRadius {
        /// The offending radius in meters.
        radius_meters: f64,
    },
}
