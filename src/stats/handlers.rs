use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    error::unprocessable,
    state::AppState,
    stats::{
        dto::{AggregateSummary, StatsRequest},
        services::{aggregate, AggregateOptions},
    },
};

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", post(compute_stats))
}

#[instrument(skip_all)]
pub async fn compute_stats(
    State(state): State<AppState>,
    Json(payload): Json<StatsRequest>,
) -> Result<Json<AggregateSummary>, (StatusCode, String)> {
    let now = payload.now.unwrap_or_else(|| state.clock.now());
    let options = AggregateOptions::new(now).with_recent_window(state.config.recent_window());
    let summary = aggregate(&payload.snapshot, options).map_err(unprocessable)?;
    info!(users = summary.users.total, %now, "stats computed");
    Ok(Json(summary))
}
