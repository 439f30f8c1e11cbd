//! REST API endpoint handlers.
//!
//! The collaborating router supplies authentication upstream; by the time
//! a request reaches these handlers the authenticated user arrives as an
//! `x-user-id` header. Handlers build the per-request services over the
//! shared pool and translate outcomes into the wire shapes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/shrines/{id}/pray` | Geofence-validated physical prayer |
//! | `POST` | `/shrines/{id}/remote-pray` | Quota-limited remote prayer |
//! | `POST` | `/abilities/{id}/purchase` | Purchase an ability (alias: `/acquire`) |
//! | `POST` | `/user/reset-abilities` | Reset the ability tree for a refund |
//! | `GET` | `/users/{id}/level-info` | Level, exp progress, ability points |
//! | `GET` | `/users/{id}/pray-distance` | Resolved pray radius |
//! | `GET` | `/users/{id}/worship-limit` | Daily quota, used count, remainder |
//! | `GET` | `/users/{id}/abilities` | Owned abilities with timestamps |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use sanpai_core::{AbilityService, EffectResolver, PrayerService, QuotaTracker};
use sanpai_types::{AbilityId, Position, ShrineId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /shrines/{id}/pray`.
///
/// Both coordinates are required for the prayer to proceed; they are
/// optional here only so their absence surfaces as the distinct
/// missing-position rejection rather than a generic deserialization
/// failure.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PrayRequest {
    /// Claimed latitude in degrees.
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    /// Claimed longitude in degrees.
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

impl PrayRequest {
    /// The claimed position, when both coordinates are present.
    const fn position(self) -> Option<Position> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Position::new(lat, lng)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /shrines/{id}/pray
// ---------------------------------------------------------------------------

/// Perform a geofence-validated physical prayer at a shrine.
pub async fn pray(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    headers: HeaderMap,
    body: Option<Json<PrayRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_from_headers(&headers)?;
    let shrine_id = ShrineId::from(parse_uuid(&id_str)?);

    let position = match body {
        Some(Json(request)) => {
            request
                .validate()
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            request.position()
        }
        None => None,
    };

    let outcome = PrayerService::new(state.pool.pool(), state.gameplay.clone())
        .pray(user_id, shrine_id, position)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": outcome.count,
        "level_up": outcome.leveled_up,
        "new_level": outcome.new_level,
        "ability_points_gained": outcome.ability_points_gained,
        "dist": outcome.distance_meters,
        "radius": outcome.allowed_radius_meters,
    })))
}

// ---------------------------------------------------------------------------
// POST /shrines/{id}/remote-pray
// ---------------------------------------------------------------------------

/// Perform a remote prayer under the daily worship quota.
pub async fn remote_pray(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_from_headers(&headers)?;
    let shrine_id = ShrineId::from(parse_uuid(&id_str)?);

    let outcome = PrayerService::new(state.pool.pool(), state.gameplay.clone())
        .remote_pray(user_id, shrine_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": outcome.count,
        "level_up": outcome.leveled_up,
        "new_level": outcome.new_level,
        "ability_points_gained": outcome.ability_points_gained,
    })))
}

// ---------------------------------------------------------------------------
// POST /abilities/{id}/purchase (alias /acquire)
// ---------------------------------------------------------------------------

/// Purchase an ability with ability points.
pub async fn purchase_ability(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_from_headers(&headers)?;
    let ability_id = parse_ability_id(&id_str)?;

    let receipt = AbilityService::new(state.pool.pool())
        .purchase(user_id, ability_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "cost": receipt.cost,
        "ability_points": receipt.remaining_points,
    })))
}

// ---------------------------------------------------------------------------
// POST /user/reset-abilities
// ---------------------------------------------------------------------------

/// Reset the caller's ability tree, refunding every owned ability's cost.
pub async fn reset_abilities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_from_headers(&headers)?;

    let receipt = AbilityService::new(state.pool.pool()).reset(user_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "refunded_points": receipt.refunded_points,
    })))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/level-info
// ---------------------------------------------------------------------------

/// Return a user's level, experience progress, and ability points.
pub async fn level_info(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);

    let info = EffectResolver::new(state.pool.pool())
        .level_info(user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "level": info.level,
        "exp": info.exp,
        "exp_into_level": info.exp_into_level,
        "exp_to_next": info.exp_to_next,
        "ability_points": info.ability_points,
    })))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/pray-distance
// ---------------------------------------------------------------------------

/// Return a user's resolved physical pray radius.
pub async fn pray_distance(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);

    let effects = EffectResolver::new(state.pool.pool())
        .resolve(user_id, Utc::now())
        .await?;

    Ok(Json(serde_json::json!({
        "pray_distance": effects.pray_distance_meters,
    })))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/worship-limit
// ---------------------------------------------------------------------------

/// Return a user's daily worship quota, today's used count, and the
/// remainder.
pub async fn worship_limit(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);
    let pool = state.pool.pool();

    let effects = EffectResolver::new(pool).resolve(user_id, Utc::now()).await?;
    let used = QuotaTracker::new(pool).remote_worships_today(user_id).await?;
    let remaining = effects.daily_worship_quota.saturating_sub(used).max(0);

    Ok(Json(serde_json::json!({
        "limit": effects.daily_worship_quota,
        "used": used,
        "remaining": remaining,
    })))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/abilities
// ---------------------------------------------------------------------------

/// List the user's owned abilities with acquisition timestamps.
pub async fn owned_abilities(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);

    let owned = AbilityService::new(state.pool.pool()).owned(user_id).await?;

    let abilities: Vec<serde_json::Value> = owned
        .iter()
        .map(|o| {
            serde_json::json!({
                "id": o.definition.id,
                "name": o.definition.name,
                "cost": o.definition.cost,
                "effect_type": o.definition.effect_type,
                "effect_value": o.definition.effect_value,
                "acquired_at": o.acquired_at,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": abilities.len(),
        "abilities": abilities,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the authenticated user from the `x-user-id` header.
fn user_from_headers(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingUserHeader)?;
    let id = raw.parse::<Uuid>().ok().ok_or(ApiError::MissingUserHeader)?;
    Ok(UserId::from(id))
}

/// Parse a UUID from a path segment, returning an [`ApiError`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    s.parse::<Uuid>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}

/// Parse an ability id (small serial integer) from a path segment.
fn parse_ability_id(s: &str) -> Result<AbilityId, ApiError> {
    let id = s
        .parse::<i32>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))?;
    Ok(AbilityId(id))
}
