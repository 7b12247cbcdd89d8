//! Closed waypoint polygons sized from a target loop distance.

use crate::geometry::{destination_point, normalize_bearing};
use crate::models::{Coordinate, ShapeParams, Sides};

/// Build a closed loop of `sides + 1` waypoints starting and ending at `origin`.
///
/// Each side is `target_distance_km / size_modifier` long; the bearing turns by
/// `360 / sides` after every vertex.
pub fn build_polygon(
    origin: Coordinate,
    target_distance_km: f64,
    sides: Sides,
    start_bearing_deg: f64,
    size_modifier: f64,
) -> Vec<Coordinate> {
    let side_km = target_distance_km / size_modifier;
    let turn = sides.turn_angle_deg();

    let mut waypoints = Vec::with_capacity(sides.count() + 1);
    waypoints.push(origin);

    let mut current = origin;
    let mut bearing = start_bearing_deg;
    for _ in 0..sides.count() - 1 {
        current = destination_point(current, bearing, side_km);
        waypoints.push(current);
        bearing = normalize_bearing(bearing + turn);
    }

    waypoints.push(origin);
    waypoints
}

/// Polygon for one fitting attempt.
pub fn build_for(
    origin: Coordinate,
    target_distance_km: f64,
    params: &ShapeParams,
) -> Vec<Coordinate> {
    build_polygon(
        origin,
        target_distance_km,
        params.sides,
        params.start_bearing_deg,
        params.size_modifier,
    )
}
