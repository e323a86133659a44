pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::{AggregateSummary, Snapshot};
pub use services::{aggregate, AggregateOptions};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::stats_routes())
}
