use axum::{http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    error::unprocessable,
    records::{UserRecord, VehicleRecord},
    state::AppState,
    verification::{
        actions::apply_action,
        dto::{ActionRequest, ActionResponse, UserBadge, VehicleBadge},
        services::{user_badge, vehicle_badge},
    },
};

pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/verification/users", post(classify_users))
        .route("/verification/users/action", post(preview_action))
        .route("/verification/vehicles", post(classify_vehicles))
}

#[instrument(skip_all)]
pub async fn classify_users(
    Json(payload): Json<Vec<UserRecord>>,
) -> Result<Json<Vec<UserBadge>>, (StatusCode, String)> {
    let badges = payload
        .iter()
        .map(user_badge)
        .collect::<Result<Vec<_>, _>>()
        .map_err(unprocessable)?;
    info!(count = badges.len(), "users classified");
    Ok(Json(badges))
}

#[instrument(skip_all)]
pub async fn classify_vehicles(
    Json(payload): Json<Vec<VehicleRecord>>,
) -> Result<Json<Vec<VehicleBadge>>, (StatusCode, String)> {
    let badges = payload
        .iter()
        .map(vehicle_badge)
        .collect::<Result<Vec<_>, _>>()
        .map_err(unprocessable)?;
    info!(count = badges.len(), "vehicles classified");
    Ok(Json(badges))
}

/// Shows what an approve/reject/revoke/resubmit would do to a user row.
#[instrument(skip_all)]
pub async fn preview_action(
    Json(payload): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    let (user, badge) = apply_action(&payload.user, &payload.action).map_err(unprocessable)?;
    info!(user_id = %badge.user_id, bucket = ?badge.bucket, "admin action previewed");
    Ok(Json(ActionResponse { user, badge }))
}
