//! Spherical geometry for polygon construction and waypoint editing.

use crate::models::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Point reached by travelling `distance_km` from `origin` along the initial
/// bearing `bearing_deg` (0 = north, 90 = east) on a spherical earth.
///
/// The bearing is expected to be normalized by the caller.
pub fn destination_point(origin: Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    if distance_km.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing_rad = bearing_deg.to_radians();
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    Coordinate::new(lon2.to_degrees(), lat2.to_degrees())
}

/// Initial great-circle bearing from `from` to `to`, in degrees (-180, 180].
pub fn initial_bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_lambda = (to.lon - from.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y).to_degrees()
}

/// Wrap a bearing into `[0, 360)`.
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let wrapped = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Great-circle distance in kilometres (Haversine formula).
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Length of a polyline in kilometres.
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

// Local equirectangular frame, good enough at the scale of a single segment.

fn km_per_deg_lat() -> f64 {
    EARTH_RADIUS_KM.to_radians()
}

fn km_per_deg_lon(ref_lat_deg: f64) -> f64 {
    (EARTH_RADIUS_KM.to_radians() * ref_lat_deg.to_radians().cos()).max(1e-9)
}

/// Closest point to `point` on the segment `start`..`end`.
pub fn closest_point_on_segment(
    point: Coordinate,
    start: Coordinate,
    end: Coordinate,
) -> Coordinate {
    let ref_lat = start.lat;
    let kx = km_per_deg_lon(ref_lat);
    let ky = km_per_deg_lat();

    let px = (point.lon - start.lon) * kx;
    let py = (point.lat - start.lat) * ky;
    let sx = (end.lon - start.lon) * kx;
    let sy = (end.lat - start.lat) * ky;

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 1e-12 {
        return start;
    }

    // t = ((P-A) · (B-A)) / |B-A|²
    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    Coordinate::new(
        start.lon + t * (end.lon - start.lon),
        start.lat + t * (end.lat - start.lat),
    )
}

/// Project `pointer` onto the nearest segment of `path`.
///
/// Returns the projected point and the index of the segment's first vertex.
/// A single-point path projects onto that point.
pub fn nearest_point_on_path(
    path: &[Coordinate],
    pointer: Coordinate,
) -> Option<(Coordinate, usize)> {
    match path {
        [] => None,
        [only] => Some((*only, 0)),
        _ => path
            .windows(2)
            .enumerate()
            .map(|(idx, pair)| {
                let candidate = closest_point_on_segment(pointer, pair[0], pair[1]);
                (candidate, idx, haversine_km(pointer, candidate))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(candidate, idx, _)| (candidate, idx)),
    }
}
