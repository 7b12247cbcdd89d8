//! Loop Core - closed-loop route shaping, fitting and editing
//!
//! Pure logic plus the two external boundaries (`RouteClient`, `ShapePlanner`).
//! No HTTP lives here.

pub mod client;
pub mod editor;
pub mod error;
pub mod fitter;
pub mod geometry;
pub mod models;
pub mod planner;
pub mod polygon;
pub mod session;

pub use client::{RouteClient, RouteRequest};
pub use editor::{ghost_point, WaypointEditor};
pub use error::RouteError;
pub use fitter::{FitterConfig, RouteFitter};
pub use geometry::{
    destination_point, haversine_km, nearest_point_on_path, normalize_bearing, path_length_km,
};
pub use models::{
    Coordinate, FitOutcome, FittedRoute, RoutePreference, RouteResult, RouteStats, ShapeParams,
    Sides, TravelProfile,
};
pub use planner::{plan_shape, random_bearing, ShapePlanner, ShapeSuggestion};
pub use polygon::build_polygon;
pub use session::{
    Applied, FitKind, FitStatus, FitTicket, PendingFit, RouteSession, SessionSnapshot,
};
