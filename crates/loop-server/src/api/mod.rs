//! API routes for the loop server.

mod routes;
pub mod waypoints;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

pub use routes::{FitResponse, GenerateRequest, PlanRequest};

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}
