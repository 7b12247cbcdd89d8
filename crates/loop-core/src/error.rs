//! Error taxonomy shared by the fitter, editor and service clients.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// The routing engine could not connect the waypoints.
    #[error("no route found after {attempts} attempt(s)")]
    NoRouteFound { attempts: u32 },

    #[error(
        "route distance {actual_km:.2} km is outside tolerance of target {target_km:.2} km after {attempts} attempt(s)"
    )]
    DistanceOutOfTolerance {
        attempts: u32,
        target_km: f64,
        actual_km: f64,
    },

    /// Transport-level failure talking to an external service. Never retried.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("invalid edit at index {index}: {reason}")]
    InvalidEdit { index: usize, reason: String },

    #[error("need at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("invalid shape: {0}")]
    InvalidShape(String),
}

impl RouteError {
    pub fn invalid_edit(index: usize, reason: impl Into<String>) -> Self {
        RouteError::InvalidEdit {
            index,
            reason: reason.into(),
        }
    }

    /// Errors caused by the caller's input rather than by routing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidEdit { .. }
                | RouteError::TooFewWaypoints(_)
                | RouteError::InvalidShape(_)
        )
    }
}
