pub mod actions;
pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::{Severity, VerificationBucket};
pub use services::{classify_user, classify_vehicle, user_badge, vehicle_badge};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::verification_routes())
}
