//! Plain-text rendering of fit results for the terminal.

use loop_core::{FitOutcome, FittedRoute};
use std::fmt::Write;

/// Summary line, the waypoint list, and any error.
pub fn render_outcome(outcome: &FitOutcome) -> String {
    let mut out = String::new();
    match outcome {
        FitOutcome::Fitted(fitted) => {
            let _ = writeln!(out, "Route fitted");
            render_route(&mut out, fitted);
        }
        FitOutcome::Failed { error, best_effort } => {
            let _ = writeln!(out, "Route not fitted: {error}");
            if let Some(fitted) = best_effort {
                let _ = writeln!(out, "Closest attempt:");
                render_route(&mut out, fitted);
            }
        }
    }
    out
}

fn render_route(out: &mut String, fitted: &FittedRoute) {
    let stats = fitted.route.stats();
    let _ = writeln!(
        out,
        "Distance: {:.2} km, about {} min",
        stats.distance_km, stats.duration_min
    );
    if let Some(params) = fitted.params {
        let _ = writeln!(
            out,
            "Shape: {} sides, bearing {:.0}°, size modifier {:.2}, attempt {}",
            params.sides.count(),
            params.start_bearing_deg,
            params.size_modifier,
            params.attempt
        );
    }
    let _ = writeln!(out, "Waypoints:");
    for (index, point) in fitted.waypoints.iter().enumerate() {
        let _ = writeln!(out, "  {index:>2}: {:.6}, {:.6}", point.lat, point.lon);
    }
    let _ = writeln!(out, "Path points: {}", fitted.route.path.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_core::{Coordinate, RouteError, RouteResult, ShapeParams, Sides};

    fn fitted() -> FittedRoute {
        let waypoints = vec![
            Coordinate::new(10.0, 54.0),
            Coordinate::new(10.01, 54.0),
            Coordinate::new(10.0, 54.0),
        ];
        FittedRoute {
            route: RouteResult {
                path: waypoints.clone(),
                distance_m: 5_004.0,
                duration_s: 3_600.0,
            },
            waypoints,
            params: Some(ShapeParams::initial(Sides::Triangle, 90.0)),
        }
    }

    #[test]
    fn fitted_route_lists_stats_and_waypoints() {
        let text = render_outcome(&FitOutcome::Fitted(fitted()));
        assert!(text.starts_with("Route fitted"));
        assert!(text.contains("Distance: 5.00 km, about 60 min"));
        assert!(text.contains("3 sides, bearing 90°"));
        assert!(text.contains("   1: 54.000000, 10.010000"));
    }

    #[test]
    fn failure_shows_error_and_best_effort() {
        let outcome = FitOutcome::Failed {
            error: RouteError::NoRouteFound { attempts: 4 },
            best_effort: None,
        };
        let text = render_outcome(&outcome);
        assert!(text.contains("no route found after 4 attempt(s)"));
        assert!(!text.contains("Waypoints"));

        let outcome = FitOutcome::Failed {
            error: RouteError::DistanceOutOfTolerance {
                attempts: 3,
                target_km: 4.0,
                actual_km: 5.0,
            },
            best_effort: Some(fitted()),
        };
        assert!(render_outcome(&outcome).contains("Closest attempt:"));
    }
}
