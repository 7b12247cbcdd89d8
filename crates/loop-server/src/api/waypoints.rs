//! Waypoint editing endpoints.
//!
//! Each edit mutates the session under its lock, then re-fits the edited list
//! with the lock released.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::routes::{outcome_status, reject, FitResponse};
use crate::state::AppState;
use loop_core::{Coordinate, PendingFit};

#[derive(Debug, Deserialize)]
pub struct CoordinateBody {
    pub coordinate: Coordinate,
}

#[derive(Debug, Deserialize)]
pub struct GhostRequest {
    pub pointer: Coordinate,
}

#[derive(Debug, Serialize)]
pub struct GhostResponse {
    /// `None` until a route has been rendered.
    pub ghost: Option<Coordinate>,
}

async fn refit_response(
    state: &AppState,
    pending: PendingFit,
    inserted_index: Option<usize>,
) -> axum::response::Response {
    let seq = pending.ticket.seq;
    let (outcome, applied) = state.refit(pending).await;
    let mut response = FitResponse::from_outcome(&outcome, applied, seq);
    response.inserted_index = inserted_index;
    (outcome_status(&outcome), Json(response)).into_response()
}

pub async fn insert_waypoint(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CoordinateBody>,
) -> impl IntoResponse {
    match state.edit(|session| session.insert(body.coordinate)) {
        Ok((index, pending)) => {
            tracing::info!(index, seq = pending.ticket.seq, "Waypoint inserted");
            refit_response(&state, pending, Some(index)).await
        }
        Err(err) => reject(err).into_response(),
    }
}

pub async fn move_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(body): Json<CoordinateBody>,
) -> impl IntoResponse {
    match state.edit(|session| session.move_waypoint(index, body.coordinate)) {
        Ok(pending) => {
            tracing::info!(index, seq = pending.ticket.seq, "Waypoint moved");
            refit_response(&state, pending, None).await
        }
        Err(err) => reject(err).into_response(),
    }
}

pub async fn delete_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    match state.edit(|session| session.delete_waypoint(index)) {
        Ok(pending) => {
            tracing::info!(index, seq = pending.ticket.seq, "Waypoint deleted");
            refit_response(&state, pending, None).await
        }
        Err(err) => reject(err).into_response(),
    }
}

pub async fn ghost_waypoint(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GhostRequest>,
) -> impl IntoResponse {
    Json(GhostResponse {
        ghost: state.ghost(body.pointer),
    })
}
