//! Adaptive loop fitting against an external routing engine.
//!
//! A generated polygon is submitted to the engine and corrected until the snapped
//! route lands within tolerance of the requested distance:
//! - no route: rotate the start bearing and try again with the same size
//! - distance mismatch: rescale the size modifier by `actual / target` and keep the bearing
//!
//! Attempts run strictly one after another since each correction depends on the
//! previous measurement.

use crate::client::{RouteClient, RouteRequest};
use crate::error::RouteError;
use crate::geometry::normalize_bearing;
use crate::models::{
    Coordinate, FitOutcome, FittedRoute, RoutePreference, RouteResult, ShapeParams, Sides,
    TravelProfile,
};
use crate::polygon::build_for;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on a single rescale step keep the size modifier positive and finite.
const MIN_RESCALE: f64 = 0.25;
const MAX_RESCALE: f64 = 4.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitterConfig {
    /// Accepted relative distance error.
    pub tolerance: f64,
    pub max_no_route_attempts: u32,
    pub max_distance_attempts: u32,
    pub bearing_step_deg: f64,
    /// A request that outlives this is treated as "no route".
    pub request_timeout: Duration,
    pub profile: TravelProfile,
    pub preference: RoutePreference,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.15,
            max_no_route_attempts: 4,
            max_distance_attempts: 3,
            bearing_step_deg: 45.0,
            request_timeout: Duration::from_secs(20),
            profile: TravelProfile::default(),
            preference: RoutePreference::default(),
        }
    }
}

pub struct RouteFitter<C> {
    client: C,
    config: FitterConfig,
}

impl<C: RouteClient> RouteFitter<C> {
    pub fn new(client: C, config: FitterConfig) -> Self {
        Self { client, config }
    }

    /// Generate and fit a loop of `target_distance_km` around `origin`.
    pub async fn fit_shape(
        &self,
        origin: Coordinate,
        target_distance_km: f64,
        sides: Sides,
        start_bearing_deg: f64,
    ) -> FitOutcome {
        if !origin.is_finite() {
            return failed(RouteError::InvalidShape("origin must be finite".into()), None);
        }
        if !target_distance_km.is_finite() || target_distance_km <= 0.0 {
            return failed(
                RouteError::InvalidShape(format!(
                    "target distance must be positive, got {target_distance_km}"
                )),
                None,
            );
        }

        let mut params = ShapeParams::initial(sides, start_bearing_deg);
        let mut no_route_failures = 0u32;
        let mut distance_misses = 0u32;
        let mut best: Option<(f64, FittedRoute)> = None;

        loop {
            let waypoints = build_for(origin, target_distance_km, &params);

            let route = match self.request(waypoints.clone()).await {
                Ok(route) => route,
                Err(err) => {
                    tracing::warn!("Fit aborted on attempt {}: {}", params.attempt, err);
                    return failed(err, best.map(|(_, fitted)| fitted));
                }
            };

            match route {
                None => {
                    no_route_failures += 1;
                    tracing::info!(
                        attempt = params.attempt,
                        bearing_deg = params.start_bearing_deg,
                        "No route for polygon"
                    );
                    if no_route_failures >= self.config.max_no_route_attempts {
                        return failed(
                            RouteError::NoRouteFound {
                                attempts: params.attempt,
                            },
                            best.map(|(_, fitted)| fitted),
                        );
                    }
                    params.start_bearing_deg =
                        normalize_bearing(params.start_bearing_deg + self.config.bearing_step_deg);
                }
                Some(route) => {
                    let actual_km = route.distance_km();
                    let error = relative_error(actual_km, target_distance_km);
                    let fitted = FittedRoute {
                        route,
                        waypoints,
                        params: Some(params),
                    };

                    if error <= self.config.tolerance {
                        tracing::info!(
                            attempt = params.attempt,
                            actual_km,
                            target_km = target_distance_km,
                            "Route fitted"
                        );
                        return FitOutcome::Fitted(fitted);
                    }

                    distance_misses += 1;
                    tracing::info!(
                        attempt = params.attempt,
                        actual_km,
                        target_km = target_distance_km,
                        size_modifier = params.size_modifier,
                        "Route distance outside tolerance"
                    );

                    if best.as_ref().map_or(true, |(best_error, _)| error < *best_error) {
                        best = Some((error, fitted));
                    }

                    if distance_misses >= self.config.max_distance_attempts {
                        let closest_km = best
                            .as_ref()
                            .map(|(_, fitted)| fitted.route.distance_km())
                            .unwrap_or(actual_km);
                        return failed(
                            RouteError::DistanceOutOfTolerance {
                                attempts: params.attempt,
                                target_km: target_distance_km,
                                actual_km: closest_km,
                            },
                            best.map(|(_, fitted)| fitted),
                        );
                    }

                    params.size_modifier =
                        rescale_modifier(params.size_modifier, actual_km / target_distance_km);
                }
            }

            params.attempt += 1;
        }
    }

    /// Route a user-authored waypoint list as-is: one request, no regeneration.
    pub async fn fit_waypoints(&self, waypoints: Vec<Coordinate>) -> FitOutcome {
        match self.request(waypoints.clone()).await {
            Ok(Some(route)) => FitOutcome::Fitted(FittedRoute {
                route,
                waypoints,
                params: None,
            }),
            Ok(None) => failed(RouteError::NoRouteFound { attempts: 1 }, None),
            Err(err) => failed(err, None),
        }
    }

    async fn request(&self, waypoints: Vec<Coordinate>) -> Result<Option<RouteResult>, RouteError> {
        let request = RouteRequest::new(waypoints, self.config.profile, self.config.preference)?;
        tracing::debug!("Requesting route through {} waypoints", request.coordinates().len());

        match tokio::time::timeout(self.config.request_timeout, self.client.route(&request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Route request timed out after {:?}",
                    self.config.request_timeout
                );
                Ok(None)
            }
        }
    }
}

fn failed(error: RouteError, best_effort: Option<FittedRoute>) -> FitOutcome {
    FitOutcome::Failed { error, best_effort }
}

fn relative_error(actual_km: f64, target_km: f64) -> f64 {
    ((actual_km - target_km) / target_km).abs()
}

/// Too long a route grows the modifier (shorter sides next time), too short shrinks it.
fn rescale_modifier(current: f64, ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return current;
    }
    let next = current * ratio.clamp(MIN_RESCALE, MAX_RESCALE);
    if next.is_finite() && next > 0.0 {
        next
    } else {
        current
    }
}
