//! Error types for the API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! Status mapping: missing entities are 404; every expected rejection
//! (bad input, failed geofence, exhausted quota, refused purchase) is
//! 400 with a descriptive JSON body; configuration and storage failures
//! are 500 and logged as operational errors without leaking detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sanpai_core::CoreError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A failure surfaced by the orchestration layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The `x-user-id` header is absent or not a UUID.
    #[error("missing or invalid x-user-id header")]
    MissingUserHeader,

    /// A path parameter could not be parsed as a UUID.
    #[error("invalid id: {0}")]
    InvalidUuid(String),

    /// The request body failed validation.
    #[error("invalid request body: {0}")]
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Core(core) => core_response(core),
            Self::MissingUserHeader | Self::InvalidUuid(_) | Self::Validation(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": self.to_string(),
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to a status code and JSON body.
fn core_response(err: &CoreError) -> (StatusCode, serde_json::Value) {
    match err {
        CoreError::UserNotFound(_)
        | CoreError::ShrineNotFound(_)
        | CoreError::AbilityNotFound(_) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({
                "error": err.to_string(),
                "status": StatusCode::NOT_FOUND.as_u16(),
            }),
        ),

        // The failed geofence carries its measurements so clients can
        // show how far off the caller was.
        CoreError::OutOfRange {
            distance_meters,
            allowed_radius_meters,
        } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": err.to_string(),
                "dist": distance_meters,
                "radius": allowed_radius_meters,
                "status": StatusCode::BAD_REQUEST.as_u16(),
            }),
        ),

        CoreError::MissingPosition
        | CoreError::InvalidInput(_)
        | CoreError::RateLimitExceeded { .. }
        | CoreError::PurchaseDenied(_)
        | CoreError::SubscriptionRequired => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": err.to_string(),
                "status": StatusCode::BAD_REQUEST.as_u16(),
            }),
        ),

        // Operational problems: log the detail, return a generic body.
        CoreError::Configuration(msg) => {
            tracing::error!(error = %msg, "configuration error while serving request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "internal error",
                    "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                }),
            )
        }
        CoreError::Storage(db) => {
            tracing::error!(error = %db, "storage error while serving request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "internal error",
                    "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanpai_core::PurchaseDenied;
    use sanpai_types::UserId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::Core(CoreError::UserNotFound(UserId::new()));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn expected_rejections_map_to_400() {
        for core in [
            CoreError::MissingPosition,
            CoreError::RateLimitExceeded { quota: 1 },
            CoreError::PurchaseDenied(PurchaseDenied::AlreadyOwned),
            CoreError::SubscriptionRequired,
            CoreError::OutOfRange {
                distance_meters: 250.0,
                allowed_radius_meters: 100,
            },
        ] {
            assert_eq!(status_of(ApiError::Core(core)), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn configuration_maps_to_500() {
        let err = ApiError::Core(CoreError::Configuration(String::from(
            "level tier missing for level 3",
        )));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn header_errors_map_to_400() {
        assert_eq!(status_of(ApiError::MissingUserHeader), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ApiError::InvalidUuid(String::from("nope"))),
            StatusCode::BAD_REQUEST
        );
    }
}
