//! Core data models for the loop route planner.

use crate::error::RouteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// `[lon, lat]` as used by GeoJSON.
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Polygon side count accepted by the shape builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Sides {
    Triangle,
    #[default]
    Square,
    Pentagon,
}

impl Sides {
    pub fn count(self) -> usize {
        match self {
            Sides::Triangle => 3,
            Sides::Square => 4,
            Sides::Pentagon => 5,
        }
    }

    /// Exterior angle between consecutive sides, in degrees.
    pub fn turn_angle_deg(self) -> f64 {
        360.0 / self.count() as f64
    }

    /// Starting size modifier for this shape.
    ///
    /// Empirical ratio between the target walking distance and the length of one
    /// polygon side. Snapped routes wander more than straight sides do, so these
    /// are larger than the plain side count. The fitter rescales them per attempt.
    pub fn default_size_modifier(self) -> f64 {
        match self {
            Sides::Triangle => 3.5,
            Sides::Square => 4.8,
            Sides::Pentagon => 5.5,
        }
    }
}

impl TryFrom<u8> for Sides {
    type Error = RouteError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Sides::Triangle),
            4 => Ok(Sides::Square),
            5 => Ok(Sides::Pentagon),
            other => Err(RouteError::InvalidShape(format!(
                "sides must be 3, 4 or 5, got {other}"
            ))),
        }
    }
}

impl From<Sides> for u8 {
    fn from(value: Sides) -> Self {
        value.count() as u8
    }
}

/// Shape parameters for a single fitting attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeParams {
    pub sides: Sides,
    pub start_bearing_deg: f64,
    pub size_modifier: f64,
    pub attempt: u32,
}

impl ShapeParams {
    /// First attempt with the shape's default modifier.
    pub fn initial(sides: Sides, start_bearing_deg: f64) -> Self {
        Self {
            sides,
            start_bearing_deg: crate::geometry::normalize_bearing(start_bearing_deg),
            size_modifier: sides.default_size_modifier(),
            attempt: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelProfile {
    FootWalking,
    #[default]
    FootHiking,
}

impl TravelProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelProfile::FootWalking => "foot-walking",
            TravelProfile::FootHiking => "foot-hiking",
        }
    }
}

impl fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TravelProfile {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "foot-walking" => Ok(TravelProfile::FootWalking),
            "foot-hiking" => Ok(TravelProfile::FootHiking),
            other => Err(RouteError::InvalidShape(format!(
                "unknown travel profile '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    #[default]
    Shortest,
    Recommended,
    Fastest,
}

impl RoutePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutePreference::Shortest => "shortest",
            RoutePreference::Recommended => "recommended",
            RoutePreference::Fastest => "fastest",
        }
    }
}

impl std::str::FromStr for RoutePreference {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shortest" => Ok(RoutePreference::Shortest),
            "recommended" => Ok(RoutePreference::Recommended),
            "fastest" => Ok(RoutePreference::Fastest),
            other => Err(RouteError::InvalidShape(format!(
                "unknown route preference '{other}'"
            ))),
        }
    }
}

/// A snapped route returned by the routing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Walking pace used when the engine omits a duration (about 5 km/h).
pub const FALLBACK_PACE_M_PER_MIN: f64 = 83.0;

impl RouteResult {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Build a result from geometry alone, estimating the summary.
    pub fn from_path(path: Vec<Coordinate>) -> Self {
        let distance_m = crate::geometry::path_length_km(&path) * 1000.0;
        let duration_s = (distance_m / FALLBACK_PACE_M_PER_MIN) * 60.0;
        Self {
            path,
            distance_m,
            duration_s,
        }
    }

    pub fn stats(&self) -> RouteStats {
        RouteStats {
            distance_km: (self.distance_m / 10.0).round() / 100.0,
            duration_min: (self.duration_s / 60.0).round() as u32,
        }
    }
}

/// Display values for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub distance_km: f64,
    pub duration_min: u32,
}

/// A route together with the waypoints that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedRoute {
    pub route: RouteResult,
    pub waypoints: Vec<Coordinate>,
    /// Final shape parameters; absent for user-edited waypoint lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ShapeParams>,
}

/// Result of a fit request.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Fitted(FittedRoute),
    Failed {
        error: RouteError,
        best_effort: Option<FittedRoute>,
    },
}

impl FitOutcome {
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }

    /// The fitted route, or the best-effort one on failure.
    pub fn route(&self) -> Option<&FittedRoute> {
        match self {
            FitOutcome::Fitted(fitted) => Some(fitted),
            FitOutcome::Failed { best_effort, .. } => best_effort.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&RouteError> {
        match self {
            FitOutcome::Fitted(_) => None,
            FitOutcome::Failed { error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_reject_out_of_range() {
        assert_eq!(Sides::try_from(3).unwrap(), Sides::Triangle);
        assert_eq!(Sides::try_from(5).unwrap(), Sides::Pentagon);
        assert!(matches!(
            Sides::try_from(6),
            Err(RouteError::InvalidShape(_))
        ));
    }

    #[test]
    fn sides_deserialize_from_integer() {
        let sides: Sides = serde_json::from_str("3").unwrap();
        assert_eq!(sides, Sides::Triangle);
        assert!(serde_json::from_str::<Sides>("7").is_err());
        assert_eq!(serde_json::to_string(&Sides::Pentagon).unwrap(), "5");
    }

    #[test]
    fn stats_round_for_display() {
        let route = RouteResult {
            path: Vec::new(),
            distance_m: 5_236.0,
            duration_s: 3_770.0,
        };
        let stats = route.stats();
        assert!((stats.distance_km - 5.24).abs() < 1e-9);
        assert_eq!(stats.duration_min, 63);
    }

    #[test]
    fn from_path_estimates_duration_at_walking_pace() {
        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];
        let route = RouteResult::from_path(path);
        assert!((route.distance_m - 1_111.95).abs() < 1.0);
        let expected_s = route.distance_m / FALLBACK_PACE_M_PER_MIN * 60.0;
        assert!((route.duration_s - expected_s).abs() < 1e-6);
    }

    #[test]
    fn travel_profile_parses_wire_names() {
        assert_eq!(
            "foot-walking".parse::<TravelProfile>().unwrap(),
            TravelProfile::FootWalking
        );
        assert!("cycling-road".parse::<TravelProfile>().is_err());
        assert_eq!(
            serde_json::to_string(&TravelProfile::FootHiking).unwrap(),
            "\"foot-hiking\""
        );
    }
}
