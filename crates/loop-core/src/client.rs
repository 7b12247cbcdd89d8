//! Routing engine boundary.

use crate::error::RouteError;
use crate::models::{Coordinate, RoutePreference, RouteResult, TravelProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A validated request for the routing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    coordinates: Vec<Coordinate>,
    pub profile: TravelProfile,
    pub preference: RoutePreference,
}

impl RouteRequest {
    pub fn new(
        coordinates: Vec<Coordinate>,
        profile: TravelProfile,
        preference: RoutePreference,
    ) -> Result<Self, RouteError> {
        if coordinates.len() < 2 {
            return Err(RouteError::TooFewWaypoints(coordinates.len()));
        }
        Ok(Self {
            coordinates,
            profile,
            preference,
        })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }
}

/// Snaps a waypoint list onto walkable ways.
///
/// `Ok(None)` means the engine answered but could not connect the waypoints.
/// Transport problems are `Err(RouteError::NetworkFailure)`.
#[async_trait]
pub trait RouteClient: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<Option<RouteResult>, RouteError>;
}

#[async_trait]
impl<T: RouteClient + ?Sized> RouteClient for Arc<T> {
    async fn route(&self, request: &RouteRequest) -> Result<Option<RouteResult>, RouteError> {
        (**self).route(request).await
    }
}
