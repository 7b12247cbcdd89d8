//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::waypoints;
use crate::state::AppState;
use loop_core::{
    plan_shape, random_bearing, Applied, Coordinate, FitOutcome, FittedRoute, RouteError,
    RouteStats, ShapeSuggestion, Sides,
};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let route_routes = Router::new()
        .route("/v1/routes/generate", post(generate_route))
        .route("/v1/routes/plan", post(plan_route))
        .route("/v1/routes/current", get(current_route));

    let waypoint_routes = Router::new()
        .route("/v1/waypoints", post(waypoints::insert_waypoint))
        .route("/v1/waypoints/ghost", post(waypoints::ghost_waypoint))
        .route("/v1/waypoints/:index", put(waypoints::move_waypoint))
        .route("/v1/waypoints/:index", delete(waypoints::delete_waypoint));

    Router::new().merge(route_routes).merge(waypoint_routes)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub origin: Coordinate,
    pub distance_km: f64,
    /// 3, 4 or 5; defaults to a square.
    pub sides: Option<u8>,
    /// Random when omitted.
    pub bearing_deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: Coordinate,
    /// Overrides any distance the planner suggests.
    pub distance_km: Option<f64>,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct FitResponse {
    pub ok: bool,
    /// False when a newer request superseded this one.
    pub applied: bool,
    pub seq: u64,
    pub route: Option<FittedRoute>,
    pub stats: Option<RouteStats>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<ShapeSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_index: Option<usize>,
}

impl FitResponse {
    pub fn from_outcome(outcome: &FitOutcome, applied: Applied, seq: u64) -> Self {
        let route = outcome.route().cloned();
        Self {
            ok: outcome.is_fitted(),
            applied: applied == Applied::Current,
            seq,
            stats: route.as_ref().map(|fitted| fitted.route.stats()),
            route,
            errors: outcome.error().map(|err| vec![err.to_string()]).unwrap_or_default(),
            suggestion: None,
            inserted_index: None,
        }
    }
}

/// Input problems are 400, an unreachable engine is 502. Routing that simply
/// did not converge is still a 200 carrying `ok: false` and the best effort.
pub(crate) fn outcome_status(outcome: &FitOutcome) -> StatusCode {
    match outcome.error() {
        None => StatusCode::OK,
        Some(RouteError::NetworkFailure(_)) => StatusCode::BAD_GATEWAY,
        Some(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::OK,
    }
}

pub(crate) fn reject(err: RouteError) -> (StatusCode, Json<serde_json::Value>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    (
        status,
        Json(json!({
            "ok": false,
            "errors": [err.to_string()],
        })),
    )
}

fn validate_target(origin: Coordinate, distance_km: f64) -> Result<(), RouteError> {
    if !origin.is_finite()
        || !(-90.0..=90.0).contains(&origin.lat)
        || !(-180.0..=180.0).contains(&origin.lon)
    {
        return Err(RouteError::InvalidShape(
            "origin must be a valid longitude/latitude".into(),
        ));
    }
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return Err(RouteError::InvalidShape(format!(
            "distance_km must be positive, got {distance_km}"
        )));
    }
    Ok(())
}

async fn run_generation(
    state: &AppState,
    origin: Coordinate,
    distance_km: f64,
    sides: Sides,
    bearing_deg: f64,
) -> (StatusCode, FitResponse) {
    let ticket = state.begin_generation();
    tracing::info!(
        seq = ticket.seq,
        distance_km,
        sides = sides.count(),
        bearing_deg,
        "Generating loop"
    );
    let outcome = state
        .fitter()
        .fit_shape(origin, distance_km, sides, bearing_deg)
        .await;
    let applied = state.complete(ticket, &outcome);
    (
        outcome_status(&outcome),
        FitResponse::from_outcome(&outcome, applied, ticket.seq),
    )
}

async fn generate_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> impl IntoResponse {
    let sides = match request.sides.map(Sides::try_from).transpose() {
        Ok(sides) => sides.unwrap_or_default(),
        Err(err) => return reject(err).into_response(),
    };
    if let Err(err) = validate_target(request.origin, request.distance_km) {
        return reject(err).into_response();
    }
    let bearing_deg = request
        .bearing_deg
        .unwrap_or_else(|| random_bearing(&mut rand::rng()));

    let (status, response) =
        run_generation(&state, request.origin, request.distance_km, sides, bearing_deg).await;
    (status, Json(response)).into_response()
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> impl IntoResponse {
    let fallback_bearing = random_bearing(&mut rand::rng());
    let suggestion = plan_shape(state.planner(), &request.prompt, fallback_bearing).await;

    let Some(distance_km) = request.distance_km.or(suggestion.distance_km) else {
        return reject(RouteError::InvalidShape(
            "distance_km is required when the planner does not suggest one".into(),
        ))
        .into_response();
    };
    if let Err(err) = validate_target(request.origin, distance_km) {
        return reject(err).into_response();
    }

    let (status, mut response) = run_generation(
        &state,
        request.origin,
        distance_km,
        suggestion.sides,
        suggestion.bearing_deg,
    )
    .await;
    response.suggestion = Some(suggestion);
    (status, Json(response)).into_response()
}

async fn current_route(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.view())
}
